use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use cinerama_shared::{
    ConcessionDetail, ConfirmRequest, Receipt, SeatStatus, TicketLine, TotalBreakdown,
    TotalRequest,
};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::catalog::CatalogApi;
use crate::error::{ApiError, ApiResult};
use crate::inventory::{InMemorySeatInventory, SeatInventoryApi};

/// The backend's purchase orchestrator: display-only total computation and
/// the atomic confirm that converts held seats + concessions + payment
/// info into a permanent record.
#[async_trait]
pub trait PurchaseApi: Send + Sync {
    async fn calculate_total(&self, request: &TotalRequest) -> ApiResult<TotalBreakdown>;

    async fn confirm(&self, request: &ConfirmRequest) -> ApiResult<Receipt>;
}

/// Purchase stand-in wired to the in-memory inventory and catalog
pub struct InMemoryPurchase {
    inventory: Arc<InMemorySeatInventory>,
    catalog: Arc<dyn CatalogApi>,
}

impl InMemoryPurchase {
    pub fn new(inventory: Arc<InMemorySeatInventory>, catalog: Arc<dyn CatalogApi>) -> Self {
        Self { inventory, catalog }
    }

    async fn build_breakdown(&self, request: &TotalRequest) -> ApiResult<TotalBreakdown> {
        let showing = self.catalog.get_showing(request.showing_id).await?;
        let seats = self.inventory.list_seats(request.showing_id).await?;
        let products = self.catalog.list_products().await?;

        let mut tickets = Vec::new();
        for seat_id in &request.seat_ids {
            let seat = seats
                .iter()
                .find(|s| s.id == *seat_id)
                .ok_or_else(|| ApiError::NotFound(format!("seat {seat_id}")))?;
            tickets.push(TicketLine {
                seat_id: *seat_id,
                seat_label: seat.label(),
                price_cents: seat.price_cents.unwrap_or(showing.ticket_price_cents),
            });
        }

        let mut concessions = Vec::new();
        for line in &request.concession_lines {
            if line.quantity == 0 {
                continue;
            }
            let product = products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or_else(|| ApiError::NotFound(format!("product {}", line.product_id)))?;
            concessions.push(ConcessionDetail {
                product_id: product.id,
                name: product.name.clone(),
                quantity: line.quantity,
                unit_price_cents: product.price_cents,
                subtotal_cents: product.price_cents * i64::from(line.quantity),
            });
        }

        let ticket_subtotal_cents: i64 = tickets.iter().map(|t| t.price_cents).sum();
        let concession_subtotal_cents: i64 = concessions.iter().map(|c| c.subtotal_cents).sum();
        Ok(TotalBreakdown {
            ticket_subtotal_cents,
            concession_subtotal_cents,
            total_cents: ticket_subtotal_cents + concession_subtotal_cents,
            tickets,
            concessions,
        })
    }
}

fn confirmation_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect()
}

#[async_trait]
impl PurchaseApi for InMemoryPurchase {
    async fn calculate_total(&self, request: &TotalRequest) -> ApiResult<TotalBreakdown> {
        self.build_breakdown(request).await
    }

    async fn confirm(&self, request: &ConfirmRequest) -> ApiResult<Receipt> {
        if request.seat_ids.is_empty() {
            return Err(ApiError::Backend("purchase needs at least one seat".to_string()));
        }

        // Every seat must still be held; a lapsed hold fails the whole
        // purchase atomically.
        let seats = self.inventory.list_seats(request.showing_id).await?;
        for seat_id in &request.seat_ids {
            let seat = seats
                .iter()
                .find(|s| s.id == *seat_id)
                .ok_or_else(|| ApiError::NotFound(format!("seat {seat_id}")))?;
            if seat.status != SeatStatus::Held {
                return Err(ApiError::Conflict(format!(
                    "seat {} is no longer held",
                    seat.label()
                )));
            }
        }

        let breakdown = self
            .build_breakdown(&TotalRequest {
                showing_id: request.showing_id,
                seat_ids: request.seat_ids.clone(),
                concession_lines: request.concession_lines.clone(),
            })
            .await?;

        self.inventory.confirm_seats(&request.seat_ids)?;

        Ok(Receipt {
            confirmation_code: confirmation_code(),
            purchased_at: Utc::now(),
            total_cents: breakdown.total_cents,
            payment_method: request.payment_method,
            tickets: breakdown.tickets,
            concessions: breakdown.concessions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinerama_shared::{ConcessionLine, Movie, PaymentMethod, Product, Showing};
    use uuid::Uuid;

    use crate::catalog::InMemoryCatalog;

    async fn setup() -> (
        Uuid,
        Arc<InMemorySeatInventory>,
        Arc<InMemoryCatalog>,
        InMemoryPurchase,
    ) {
        let showing_id = Uuid::new_v4();
        let movie_id = Uuid::new_v4();
        let inventory = Arc::new(InMemorySeatInventory::with_layout(showing_id, &["A"], 3));
        inventory.generate_seats(showing_id).await.unwrap();

        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert_showing(Showing {
            id: showing_id,
            movie_id,
            room_name: "Room 1".to_string(),
            starts_at: Utc::now(),
            ticket_price_cents: 1200,
        });
        catalog.insert_movie(Movie {
            id: movie_id,
            title: "Night Train".to_string(),
            poster_url: None,
        });
        catalog.insert_product(Product {
            id: Uuid::new_v4(),
            name: "Soda".to_string(),
            price_cents: 400,
            image_url: None,
            active: true,
        });

        let purchase = InMemoryPurchase::new(Arc::clone(&inventory), catalog.clone());
        (showing_id, inventory, catalog, purchase)
    }

    #[tokio::test]
    async fn test_confirm_marks_seats_occupied() {
        let (showing_id, inventory, _catalog, purchase) = setup().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();
        inventory.hold(a1).await.unwrap();

        let receipt = purchase
            .confirm(&ConfirmRequest {
                client_id: Uuid::new_v4(),
                showing_id,
                seat_ids: vec![a1],
                concession_lines: vec![],
                payment_method: PaymentMethod::Cash,
            })
            .await
            .unwrap();

        assert_eq!(receipt.total_cents, 1200);
        assert_eq!(receipt.confirmation_code.len(), 9);
        let seats = inventory.list_seats(showing_id).await.unwrap();
        let sold = seats.iter().find(|s| s.id == a1).unwrap();
        assert_eq!(sold.status, SeatStatus::Occupied);
    }

    #[tokio::test]
    async fn test_confirm_rejects_unheld_seat() {
        let (showing_id, inventory, _catalog, purchase) = setup().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();

        let result = purchase
            .confirm(&ConfirmRequest {
                client_id: Uuid::new_v4(),
                showing_id,
                seat_ids: vec![a1],
                concession_lines: vec![],
                payment_method: PaymentMethod::Card,
            })
            .await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_total_skips_zero_quantity_lines() {
        let (showing_id, inventory, catalog, purchase) = setup().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();
        inventory.hold(a1).await.unwrap();
        let product_id = catalog.list_products().await.unwrap()[0].id;

        let breakdown = purchase
            .calculate_total(&TotalRequest {
                showing_id,
                seat_ids: vec![a1],
                concession_lines: vec![
                    ConcessionLine {
                        product_id,
                        quantity: 0,
                    },
                    ConcessionLine {
                        product_id,
                        quantity: 2,
                    },
                ],
            })
            .await
            .unwrap();

        assert_eq!(breakdown.concessions.len(), 1);
        assert_eq!(breakdown.concession_subtotal_cents, 800);
        assert_eq!(breakdown.total_cents, 2000);
    }
}
