use async_trait::async_trait;
use cinerama_core::{ApiResult, PurchaseApi};
use cinerama_shared::{ConfirmRequest, Receipt, TotalBreakdown, TotalRequest};

use crate::http::HttpClient;

/// REST binding of the backend purchase orchestrator
#[derive(Debug, Clone)]
pub struct PurchaseClient {
    http: HttpClient,
}

impl PurchaseClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PurchaseApi for PurchaseClient {
    async fn calculate_total(&self, request: &TotalRequest) -> ApiResult<TotalBreakdown> {
        self.http.post("purchase/calculate-total", request).await
    }

    async fn confirm(&self, request: &ConfirmRequest) -> ApiResult<Receipt> {
        self.http.post("purchase/confirm", request).await
    }
}
