use async_trait::async_trait;
use cinerama_core::{ApiResult, SeatInventoryApi};
use cinerama_shared::{Seat, SeatCounts};
use uuid::Uuid;

use crate::http::HttpClient;

/// REST binding of the seat inventory operations. Stateless: one HTTP
/// call per operation, no retries, no caching.
#[derive(Debug, Clone)]
pub struct SeatInventoryClient {
    http: HttpClient,
}

impl SeatInventoryClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SeatInventoryApi for SeatInventoryClient {
    async fn list_seats(&self, showing_id: Uuid) -> ApiResult<Vec<Seat>> {
        self.http.get(&format!("seats?showingId={showing_id}")).await
    }

    async fn hold(&self, seat_id: Uuid) -> ApiResult<Seat> {
        self.http.post_empty(&format!("seats/{seat_id}/hold")).await
    }

    async fn release(&self, seat_id: Uuid) -> ApiResult<Seat> {
        self.http
            .post_empty(&format!("seats/{seat_id}/release"))
            .await
    }

    async fn generate_seats(&self, showing_id: Uuid) -> ApiResult<Vec<Seat>> {
        self.http
            .post_empty(&format!("seats/generate?showingId={showing_id}"))
            .await
    }

    async fn seat_counts(&self, showing_id: Uuid) -> ApiResult<SeatCounts> {
        self.http
            .get(&format!("seats/counts?showingId={showing_id}"))
            .await
    }
}
