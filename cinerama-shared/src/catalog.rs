use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled screening of a movie in a specific room at a specific time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Showing {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub room_name: String,
    pub starts_at: DateTime<Utc>,
    /// Base price per ticket, in cents
    pub ticket_price_cents: i64,
}

/// Denormalized movie data, kept for display only
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub poster_url: Option<String>,
}

/// A purchasable concession item (snack/drink)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_active_defaults_true() {
        let json = r#"
            {
                "id": "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0",
                "name": "Popcorn (large)",
                "priceCents": 850
            }
        "#;
        let product: Product = serde_json::from_str(json).expect("Failed to deserialize");
        assert!(product.active);
        assert_eq!(product.image_url, None);
    }
}
