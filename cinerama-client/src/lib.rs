pub mod catalog;
pub mod config;
pub mod http;
pub mod purchase;
pub mod seats;
pub mod sse;

pub use catalog::CatalogClient;
pub use config::{ApiConfig, CheckoutRules, Config};
pub use http::HttpClient;
pub use purchase::PurchaseClient;
pub use seats::SeatInventoryClient;
pub use sse::SseSeatFeed;
