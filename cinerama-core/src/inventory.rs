use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use cinerama_shared::{Seat, SeatAction, SeatChangeEvent, SeatCounts, SeatKind, SeatStatus};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::feed::{FeedSubscription, SeatFeed};

/// Seat read/hold/release operations against the backend. Every call is a
/// single request/response with no retries; transient failures surface as
/// [`ApiError::Network`] and the caller decides what to do.
#[async_trait]
pub trait SeatInventoryApi: Send + Sync {
    async fn list_seats(&self, showing_id: Uuid) -> ApiResult<Vec<Seat>>;

    /// Claim a seat. Fails with [`ApiError::Conflict`] when any session
    /// already holds or occupies it.
    async fn hold(&self, seat_id: Uuid) -> ApiResult<Seat>;

    async fn release(&self, seat_id: Uuid) -> ApiResult<Seat>;

    /// Idempotent bootstrap for a showing with no seats yet
    async fn generate_seats(&self, showing_id: Uuid) -> ApiResult<Vec<Seat>>;

    async fn seat_counts(&self, showing_id: Uuid) -> ApiResult<SeatCounts>;
}

/// Backend stand-in: arbitrates holds over an in-memory seat map and
/// broadcasts the resulting change events, so it doubles as a [`SeatFeed`].
/// Two sessions sharing one instance race exactly like two browsers
/// against the real backend.
pub struct InMemorySeatInventory {
    showing_id: Uuid,
    seats: Mutex<HashMap<Uuid, Seat>>,
    /// Seats forced to fail their next hold/release with a network error
    poisoned: Mutex<HashSet<Uuid>>,
    events: broadcast::Sender<SeatChangeEvent>,
    layout_rows: Vec<String>,
    seats_per_row: u32,
}

impl InMemorySeatInventory {
    pub fn new(showing_id: Uuid) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            showing_id,
            seats: Mutex::new(HashMap::new()),
            poisoned: Mutex::new(HashSet::new()),
            events,
            layout_rows: vec!["A".into(), "B".into(), "C".into()],
            seats_per_row: 4,
        }
    }

    pub fn with_layout(showing_id: Uuid, rows: &[&str], seats_per_row: u32) -> Self {
        let mut inventory = Self::new(showing_id);
        inventory.layout_rows = rows.iter().map(|r| (*r).to_string()).collect();
        inventory.seats_per_row = seats_per_row;
        inventory
    }

    fn lock_seats(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Seat>> {
        self.seats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next hold/release for this seat fail with a network error
    pub fn poison_seat(&self, seat_id: Uuid) {
        self.poisoned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(seat_id);
    }

    fn take_poison(&self, seat_id: Uuid) -> bool {
        self.poisoned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&seat_id)
    }

    /// Force a seat's authoritative status (test setup)
    pub fn set_status(&self, seat_id: Uuid, status: SeatStatus) {
        if let Some(seat) = self.lock_seats().get_mut(&seat_id) {
            seat.status = status;
        }
    }

    /// Seat id for a label like "A1"; panics are avoided, absent labels
    /// return `None`
    pub fn seat_id_by_label(&self, label: &str) -> Option<Uuid> {
        self.lock_seats()
            .values()
            .find(|s| s.label() == label)
            .map(|s| s.id)
    }

    /// Mark purchased seats occupied and fan the confirmations out.
    /// Seats must currently be held.
    pub fn confirm_seats(&self, seat_ids: &[Uuid]) -> ApiResult<()> {
        let mut seats = self.lock_seats();
        for seat_id in seat_ids {
            let seat = seats
                .get(seat_id)
                .ok_or_else(|| ApiError::NotFound(format!("seat {seat_id}")))?;
            if seat.status != SeatStatus::Held {
                return Err(ApiError::Conflict(format!(
                    "seat {} is not held",
                    seat.label()
                )));
            }
        }
        for seat_id in seat_ids {
            if let Some(seat) = seats.get_mut(seat_id) {
                seat.status = SeatStatus::Occupied;
                let _ = self.events.send(SeatChangeEvent {
                    seat_id: *seat_id,
                    showing_id: self.showing_id,
                    new_status: SeatStatus::Occupied,
                    action: SeatAction::Confirm,
                });
            }
        }
        Ok(())
    }

    fn sorted(seats: &HashMap<Uuid, Seat>) -> Vec<Seat> {
        let mut all: Vec<Seat> = seats.values().cloned().collect();
        all.sort_by(|a, b| a.row.cmp(&b.row).then(a.number.cmp(&b.number)));
        all
    }

    fn transition(
        &self,
        seat_id: Uuid,
        to: SeatStatus,
        action: SeatAction,
    ) -> ApiResult<Seat> {
        if self.take_poison(seat_id) {
            return Err(ApiError::Network("connection reset".to_string()));
        }

        let mut seats = self.lock_seats();
        let seat = seats
            .get_mut(&seat_id)
            .ok_or_else(|| ApiError::NotFound(format!("seat {seat_id}")))?;

        match (action, seat.status) {
            (SeatAction::Hold, SeatStatus::Available) => {}
            (SeatAction::Hold, _) => {
                return Err(ApiError::Conflict(format!(
                    "seat {} is not available",
                    seat.label()
                )));
            }
            (SeatAction::Release, SeatStatus::Occupied) => {
                return Err(ApiError::Conflict(format!(
                    "seat {} is already sold",
                    seat.label()
                )));
            }
            // Releasing an available seat is a no-op the backend tolerates
            (SeatAction::Release, _) => {}
            (SeatAction::Confirm, _) => {
                return Err(ApiError::Backend(
                    "confirm goes through the purchase endpoint".to_string(),
                ));
            }
        }

        seat.status = to;
        let snapshot = seat.clone();
        let _ = self.events.send(SeatChangeEvent {
            seat_id,
            showing_id: self.showing_id,
            new_status: to,
            action,
        });
        Ok(snapshot)
    }
}

#[async_trait]
impl SeatInventoryApi for InMemorySeatInventory {
    async fn list_seats(&self, showing_id: Uuid) -> ApiResult<Vec<Seat>> {
        if showing_id != self.showing_id {
            return Err(ApiError::NotFound(format!("showing {showing_id}")));
        }
        Ok(Self::sorted(&self.lock_seats()))
    }

    async fn hold(&self, seat_id: Uuid) -> ApiResult<Seat> {
        self.transition(seat_id, SeatStatus::Held, SeatAction::Hold)
    }

    async fn release(&self, seat_id: Uuid) -> ApiResult<Seat> {
        self.transition(seat_id, SeatStatus::Available, SeatAction::Release)
    }

    async fn generate_seats(&self, showing_id: Uuid) -> ApiResult<Vec<Seat>> {
        if showing_id != self.showing_id {
            return Err(ApiError::NotFound(format!("showing {showing_id}")));
        }
        let mut seats = self.lock_seats();
        if seats.is_empty() {
            for row in &self.layout_rows {
                for number in 1..=self.seats_per_row {
                    let seat = Seat {
                        id: Uuid::new_v4(),
                        showing_id,
                        row: row.clone(),
                        number,
                        kind: if row == "A" {
                            SeatKind::Premium
                        } else {
                            SeatKind::Standard
                        },
                        status: SeatStatus::Available,
                        price_cents: None,
                    };
                    seats.insert(seat.id, seat);
                }
            }
        }
        Ok(Self::sorted(&seats))
    }

    async fn seat_counts(&self, showing_id: Uuid) -> ApiResult<SeatCounts> {
        if showing_id != self.showing_id {
            return Err(ApiError::NotFound(format!("showing {showing_id}")));
        }
        let seats = self.lock_seats();
        let mut counts = SeatCounts {
            total: 0,
            available: 0,
            held: 0,
            occupied: 0,
        };
        for seat in seats.values() {
            counts.total += 1;
            match seat.status {
                SeatStatus::Available => counts.available += 1,
                SeatStatus::Held => counts.held += 1,
                SeatStatus::Occupied => counts.occupied += 1,
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl SeatFeed for InMemorySeatInventory {
    async fn subscribe(&self, showing_id: Uuid) -> ApiResult<FeedSubscription> {
        if showing_id != self.showing_id {
            return Err(ApiError::NotFound(format!("showing {showing_id}")));
        }
        let mut source = self.events.subscribe();
        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    // Lag is acceptable: events are latest-status, not deltas
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "seat feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(FeedSubscription::from_task(rx, task))
    }
}
