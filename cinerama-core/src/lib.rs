pub mod catalog;
pub mod error;
pub mod feed;
pub mod inventory;
pub mod purchase;

pub use catalog::{CatalogApi, InMemoryCatalog};
pub use error::{ApiError, ApiResult};
pub use feed::{FeedSubscription, NoopSeatFeed, SeatFeed};
pub use inventory::{InMemorySeatInventory, SeatInventoryApi};
pub use purchase::{InMemoryPurchase, PurchaseApi};
