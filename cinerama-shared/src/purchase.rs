use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Pay at the box office
    Cash,
    /// Credit/debit card
    Card,
    /// Bank transfer / mobile banking QR
    Transfer,
}

/// One concession entry on the wire. Quantity zero is equivalent to absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConcessionLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Request for the backend's display-only total computation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalRequest {
    pub showing_id: Uuid,
    pub seat_ids: Vec<Uuid>,
    pub concession_lines: Vec<ConcessionLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketLine {
    pub seat_id: Uuid,
    pub seat_label: String,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcessionDetail {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// Itemized totals. The server-computed value is authoritative; locally
/// computed breakdowns are for optimistic display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalBreakdown {
    pub ticket_subtotal_cents: i64,
    pub concession_subtotal_cents: i64,
    pub total_cents: i64,
    pub tickets: Vec<TicketLine>,
    pub concessions: Vec<ConcessionDetail>,
}

/// Body of the atomic purchase endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub client_id: Uuid,
    pub showing_id: Uuid,
    pub seat_ids: Vec<Uuid>,
    pub concession_lines: Vec<ConcessionLine>,
    pub payment_method: PaymentMethod,
}

/// Permanent purchase record returned by the backend on confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub confirmation_code: String,
    pub purchased_at: DateTime<Utc>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub tickets: Vec<TicketLine>,
    pub concessions: Vec<ConcessionDetail>,
}
