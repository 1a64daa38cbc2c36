use cinerama_shared::PaymentMethod;
use uuid::Uuid;

/// Checkout wizard position. Movement is strictly one step at a time in
/// either direction; `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    SeatPicking,
    Concessions,
    Details,
    Confirm,
    Done,
}

impl CheckoutStep {
    pub fn is_terminal(self) -> bool {
        self == CheckoutStep::Done
    }
}

/// Buyer-entered form state: payment choice, contact info, terms
#[derive(Debug, Clone, Default)]
pub struct CheckoutDetails {
    pub payment_method: Option<PaymentMethod>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub accepted_terms: bool,
}

impl CheckoutDetails {
    /// Form-level validation ahead of any network call
    pub fn validate(&self) -> Result<(), String> {
        if self.payment_method.is_none() {
            return Err("select a payment method".into());
        }
        if self.contact_name.trim().is_empty() {
            return Err("contact name is required".into());
        }
        if !self.contact_email.contains('@') {
            return Err("contact email looks invalid".into());
        }
        if self.contact_phone.trim().is_empty() {
            return Err("contact phone is required".into());
        }
        if !self.accepted_terms {
            return Err("terms must be accepted".into());
        }
        Ok(())
    }

    /// Post-expiry reset: the buyer must re-pick payment and re-accept the
    /// terms, but typed contact info is kept
    pub fn reset_payment(&mut self) {
        self.payment_method = None;
        self.accepted_terms = false;
    }

    pub fn prefill_if_empty(&mut self, name: &Option<String>, email: &Option<String>, phone: &Option<String>) {
        if self.contact_name.is_empty() {
            if let Some(name) = name {
                self.contact_name = name.clone();
            }
        }
        if self.contact_email.is_empty() {
            if let Some(email) = email {
                self.contact_email = email.clone();
            }
        }
        if self.contact_phone.is_empty() {
            if let Some(phone) = phone {
                self.contact_phone = phone.clone();
            }
        }
    }
}

/// Caller-supplied context carried into a checkout: who is buying and an
/// optional concession to seed the cart with
#[derive(Debug, Clone)]
pub struct CheckoutContext {
    pub client_id: Uuid,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub preselected_product: Option<Uuid>,
}

impl CheckoutContext {
    pub fn new(client_id: Uuid) -> Self {
        Self {
            client_id,
            contact_name: None,
            contact_email: None,
            contact_phone: None,
            preselected_product: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_details() -> CheckoutDetails {
        CheckoutDetails {
            payment_method: Some(PaymentMethod::Card),
            contact_name: "Ana Flores".into(),
            contact_email: "ana@example.com".into(),
            contact_phone: "555-0134".into(),
            accepted_terms: true,
        }
    }

    #[test]
    fn test_complete_details_validate() {
        assert!(complete_details().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut details = complete_details();
        details.payment_method = None;
        assert!(details.validate().is_err());

        let mut details = complete_details();
        details.contact_email = "no-at-sign".into();
        assert!(details.validate().is_err());

        let mut details = complete_details();
        details.accepted_terms = false;
        assert!(details.validate().is_err());
    }

    #[test]
    fn test_reset_payment_keeps_contact() {
        let mut details = complete_details();
        details.reset_payment();
        assert!(details.payment_method.is_none());
        assert!(!details.accepted_terms);
        assert_eq!(details.contact_name, "Ana Flores");
        assert_eq!(details.contact_phone, "555-0134");
    }

    #[test]
    fn test_prefill_never_overwrites() {
        let mut details = CheckoutDetails {
            contact_name: "Typed Name".into(),
            ..Default::default()
        };
        details.prefill_if_empty(
            &Some("Stored Name".into()),
            &Some("stored@example.com".into()),
            &None,
        );
        assert_eq!(details.contact_name, "Typed Name");
        assert_eq!(details.contact_email, "stored@example.com");
        assert_eq!(details.contact_phone, "");
    }
}
