use serde::{Deserialize, Serialize};

/// The REST backend wraps every JSON response in this envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning an unsuccessful envelope into the
    /// server-provided message
    pub fn into_data(self) -> Result<T, String> {
        if !self.success {
            return Err(self
                .message
                .unwrap_or_else(|| "request rejected by server".to_string()));
        }
        self.data
            .ok_or_else(|| "successful response carried no data".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_unwraps_data() {
        let json = r#"{ "success": true, "data": 42 }"#;
        let envelope: ApiEnvelope<i32> = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(envelope.into_data(), Ok(42));
    }

    #[test]
    fn test_envelope_failure_carries_message() {
        let json = r#"{ "success": false, "message": "showing not found" }"#;
        let envelope: ApiEnvelope<i32> = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(envelope.into_data(), Err("showing not found".to_string()));
    }
}
