use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cinerama_core::{ApiError, SeatInventoryApi};
use cinerama_shared::{Seat, SeatChangeEvent, SeatCounts, SeatStatus};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
    Cleared,
}

/// What a toggle did once the backend answered
#[derive(Debug, Clone)]
pub enum ToggleOutcome {
    /// Hold succeeded, seat joined the selection
    Selected(Seat),
    /// Seat left the selection (release issued; local removal happens
    /// even when the release call fails)
    Released(Seat),
    /// Nothing to do: seat unknown, taken by someone else, or its
    /// previous call is still in flight
    Ignored,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("seat map is not loaded")]
    NotReady,

    /// Another session won the hold race; never retried automatically
    #[error("seat unavailable: {0}")]
    SeatUnavailable(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Holds the local user's tentative seat picks for one showing and keeps
/// the cached seat map consistent with the backend, which arbitrates
/// every hold. Invariant: every selection member got cached `Held` from
/// this session's own successful hold call, never from someone else's.
pub struct SeatSelectionSession {
    inventory: Arc<dyn SeatInventoryApi>,
    state: SessionState,
    showing_id: Option<Uuid>,
    seats: HashMap<Uuid, Seat>,
    row_order: Vec<String>,
    selected: HashSet<Uuid>,
    /// Seats with an outstanding hold/release; toggles on them are
    /// ignored until the call settles so a seat is never double-submitted
    pending: HashSet<Uuid>,
}

impl SeatSelectionSession {
    pub fn new(inventory: Arc<dyn SeatInventoryApi>) -> Self {
        Self {
            inventory,
            state: SessionState::Idle,
            showing_id: None,
            seats: HashMap::new(),
            row_order: Vec::new(),
            selected: HashSet::new(),
            pending: HashSet::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn showing_id(&self) -> Option<Uuid> {
        self.showing_id
    }

    /// Fetch the seat map for a showing, generating seats lazily when the
    /// showing has none yet
    pub async fn load_showing(&mut self, showing_id: Uuid) -> Result<(), SessionError> {
        if self.state == SessionState::Loading {
            return Err(SessionError::NotReady);
        }
        self.state = SessionState::Loading;
        self.showing_id = Some(showing_id);
        self.selected.clear();
        self.pending.clear();

        let seats = match self.fetch_seats(showing_id).await {
            Ok(seats) => seats,
            Err(error) => {
                self.state = SessionState::Idle;
                return Err(error);
            }
        };

        self.index_seats(seats);
        self.state = SessionState::Ready;
        tracing::info!(%showing_id, seats = self.seats.len(), "seat map loaded");
        Ok(())
    }

    async fn fetch_seats(&self, showing_id: Uuid) -> Result<Vec<Seat>, SessionError> {
        let seats = self.inventory.list_seats(showing_id).await?;
        if !seats.is_empty() {
            return Ok(seats);
        }
        tracing::info!(%showing_id, "showing has no seats yet, generating");
        Ok(self.inventory.generate_seats(showing_id).await?)
    }

    /// Refetch the seat map without touching the checkout step (used
    /// after expiry). Selection membership survives only for seats the
    /// backend still reports held.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        let showing_id = self.showing_id.ok_or(SessionError::NotReady)?;
        let seats = self.fetch_seats(showing_id).await?;
        self.index_seats(seats);
        self.selected.retain(|id| {
            matches!(
                self.seats.get(id).map(|s| s.status),
                Some(SeatStatus::Held)
            )
        });
        self.state = SessionState::Ready;
        Ok(())
    }

    fn index_seats(&mut self, seats: Vec<Seat>) {
        self.seats = seats.into_iter().map(|s| (s.id, s)).collect();
        let mut rows: Vec<String> = self.seats.values().map(|s| s.row.clone()).collect();
        rows.sort();
        rows.dedup();
        self.row_order = rows;
    }

    /// Select or deselect one seat. The backend is the single arbiter of
    /// hold ownership: nothing is assumed before its response arrives,
    /// and the cache is reconciled to whatever it answers.
    pub async fn toggle(&mut self, seat_id: Uuid) -> Result<ToggleOutcome, SessionError> {
        if self.state != SessionState::Ready {
            return Err(SessionError::NotReady);
        }
        if self.pending.contains(&seat_id) {
            return Ok(ToggleOutcome::Ignored);
        }
        let Some(seat) = self.seats.get(&seat_id) else {
            tracing::debug!(%seat_id, "toggle on unknown seat");
            return Ok(ToggleOutcome::Ignored);
        };

        if self.selected.contains(&seat_id) {
            return self.deselect(seat_id).await;
        }

        if seat.status != SeatStatus::Available {
            // Occupied or held by another session; the UI must not offer it
            return Ok(ToggleOutcome::Ignored);
        }
        self.select(seat_id).await
    }

    async fn select(&mut self, seat_id: Uuid) -> Result<ToggleOutcome, SessionError> {
        self.pending.insert(seat_id);
        let result = self.inventory.hold(seat_id).await;
        self.pending.remove(&seat_id);

        match result {
            Ok(updated) => {
                let snapshot = updated.clone();
                self.seats.insert(updated.id, updated);
                self.selected.insert(seat_id);
                Ok(ToggleOutcome::Selected(snapshot))
            }
            Err(error @ ApiError::Conflict(_)) => {
                // Another user won the race. The arbiter says the seat is
                // taken; a live event or reload refines held vs occupied.
                if let Some(seat) = self.seats.get_mut(&seat_id) {
                    seat.status = SeatStatus::Held;
                }
                Err(SessionError::SeatUnavailable(error.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn deselect(&mut self, seat_id: Uuid) -> Result<ToggleOutcome, SessionError> {
        self.pending.insert(seat_id);
        let result = self.inventory.release(seat_id).await;
        self.pending.remove(&seat_id);

        // The seat leaves the selection on both paths: a failed release
        // must not strand the UI on a seat the backend may already report
        // free.
        self.selected.remove(&seat_id);

        match result {
            Ok(updated) => {
                let snapshot = updated.clone();
                self.seats.insert(updated.id, updated);
                Ok(ToggleOutcome::Released(snapshot))
            }
            Err(error) => {
                tracing::warn!(%seat_id, %error, "release failed, dropping seat locally");
                let snapshot = self
                    .seats
                    .get(&seat_id)
                    .cloned()
                    .ok_or(SessionError::NotReady)?;
                Ok(ToggleOutcome::Released(snapshot))
            }
        }
    }

    /// Overwrite the cached status with an out-of-band report. Events are
    /// "latest known status", so this never merges, it replaces. A member
    /// reported no-longer-held was released by another process (e.g. a
    /// server-side expiry sweep) and leaves the selection.
    pub fn apply_remote_event(&mut self, event: &SeatChangeEvent) {
        let Some(seat) = self.seats.get_mut(&event.seat_id) else {
            return;
        };
        seat.status = event.new_status;
        if event.new_status != SeatStatus::Held && self.selected.remove(&event.seat_id) {
            tracing::info!(seat = %seat.label(), "selected seat released out of band");
        }
    }

    /// Release every selected seat, swallowing failures: cleanup must
    /// never block or fail the surrounding navigation/expiry flow. The
    /// selection is empty afterwards, so a second call issues nothing.
    pub async fn release_all(&mut self) {
        let mut members: Vec<Uuid> = self.selected.drain().collect();
        members.sort();
        for seat_id in members {
            match self.inventory.release(seat_id).await {
                Ok(updated) => {
                    self.seats.insert(updated.id, updated);
                }
                Err(error) => {
                    tracing::warn!(%seat_id, %error, "release during cleanup failed");
                }
            }
        }
    }

    /// Terminal teardown; the session cannot be used afterwards without a
    /// fresh `load_showing`
    pub fn mark_cleared(&mut self) {
        self.state = SessionState::Cleared;
        self.selected.clear();
        self.pending.clear();
    }

    pub fn is_selected(&self, seat_id: Uuid) -> bool {
        self.selected.contains(&seat_id)
    }

    pub fn selection_is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn seat(&self, seat_id: Uuid) -> Option<&Seat> {
        self.seats.get(&seat_id)
    }

    pub fn rows(&self) -> &[String] {
        &self.row_order
    }

    pub fn seats_in_row(&self, row: &str) -> Vec<&Seat> {
        let mut seats: Vec<&Seat> = self.seats.values().filter(|s| s.row == row).collect();
        seats.sort_by_key(|s| s.number);
        seats
    }

    /// Selection in presentation order: row, then number
    pub fn selected_seats(&self) -> Vec<&Seat> {
        let mut seats: Vec<&Seat> = self
            .selected
            .iter()
            .filter_map(|id| self.seats.get(id))
            .collect();
        seats.sort_by(|a, b| a.row.cmp(&b.row).then(a.number.cmp(&b.number)));
        seats
    }

    pub fn selected_ids(&self) -> Vec<Uuid> {
        self.selected_seats().iter().map(|s| s.id).collect()
    }

    /// Occupancy summary computed from the cached map
    pub fn counts(&self) -> SeatCounts {
        let mut counts = SeatCounts {
            total: 0,
            available: 0,
            held: 0,
            occupied: 0,
        };
        for seat in self.seats.values() {
            counts.total += 1;
            match seat.status {
                SeatStatus::Available => counts.available += 1,
                SeatStatus::Held => counts.held += 1,
                SeatStatus::Occupied => counts.occupied += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinerama_core::InMemorySeatInventory;
    use cinerama_shared::SeatAction;

    async fn ready_session() -> (Uuid, Arc<InMemorySeatInventory>, SeatSelectionSession) {
        let showing_id = Uuid::new_v4();
        let inventory = Arc::new(InMemorySeatInventory::with_layout(
            showing_id,
            &["A", "B"],
            3,
        ));
        let mut session = SeatSelectionSession::new(inventory.clone() as Arc<dyn SeatInventoryApi>);
        session.load_showing(showing_id).await.unwrap();
        (showing_id, inventory, session)
    }

    #[tokio::test]
    async fn test_load_generates_when_empty() {
        let (_, _, session) = ready_session().await;
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.rows(), &["A".to_string(), "B".to_string()]);
        assert_eq!(session.seats_in_row("A").len(), 3);
        assert_eq!(session.counts().available, 6);
    }

    #[tokio::test]
    async fn test_toggle_select_then_deselect_round_trips() {
        let (_, inventory, mut session) = ready_session().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();

        let outcome = session.toggle(a1).await.unwrap();
        assert!(matches!(outcome, ToggleOutcome::Selected(_)));
        assert!(session.is_selected(a1));
        assert_eq!(session.seat(a1).unwrap().status, SeatStatus::Held);

        let outcome = session.toggle(a1).await.unwrap();
        assert!(matches!(outcome, ToggleOutcome::Released(_)));
        assert!(!session.is_selected(a1));
        assert_eq!(session.seat(a1).unwrap().status, SeatStatus::Available);
        assert!(session.selection_is_empty());
    }

    #[tokio::test]
    async fn test_selection_matches_successful_holds_only() {
        let (_, inventory, mut session) = ready_session().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();
        let a2 = inventory.seat_id_by_label("A2").unwrap();
        let b1 = inventory.seat_id_by_label("B1").unwrap();

        // B1 is taken by someone else before our hold lands
        inventory.set_status(b1, SeatStatus::Held);
        session.toggle(a1).await.unwrap();
        session.toggle(a2).await.unwrap();
        let blocked = session.toggle(b1).await.unwrap();
        assert!(matches!(blocked, ToggleOutcome::Ignored));

        let selected: Vec<Uuid> = session.selected_ids();
        assert_eq!(selected, vec![a1, a2]);
    }

    #[tokio::test]
    async fn test_conflict_leaves_seat_unselected_and_marked_taken() {
        let (_, inventory, mut session) = ready_session().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();

        // The cached map still says available, but another session wins
        // the race at the backend
        let other = inventory.hold(a1).await.unwrap();
        assert_eq!(other.status, SeatStatus::Held);
        // Pin the local cache to the stale pre-race view
        session.seats.get_mut(&a1).unwrap().status = SeatStatus::Available;

        let result = session.toggle(a1).await;
        assert!(matches!(result, Err(SessionError::SeatUnavailable(_))));
        assert!(!session.is_selected(a1));
        assert_ne!(session.seat(a1).unwrap().status, SeatStatus::Available);
    }

    #[tokio::test]
    async fn test_release_failure_still_drops_selection() {
        let (_, inventory, mut session) = ready_session().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();
        session.toggle(a1).await.unwrap();

        inventory.poison_seat(a1);
        let outcome = session.toggle(a1).await.unwrap();
        assert!(matches!(outcome, ToggleOutcome::Released(_)));
        assert!(!session.is_selected(a1));
    }

    #[tokio::test]
    async fn test_pending_seat_is_debounced() {
        let (_, inventory, mut session) = ready_session().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();

        session.pending.insert(a1);
        let outcome = session.toggle(a1).await.unwrap();
        assert!(matches!(outcome, ToggleOutcome::Ignored));
        assert!(!session.is_selected(a1));
    }

    #[tokio::test]
    async fn test_remote_release_evicts_member() {
        let (showing_id, inventory, mut session) = ready_session().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();
        session.toggle(a1).await.unwrap();

        // Server-side expiry sweep released our hold
        session.apply_remote_event(&SeatChangeEvent {
            seat_id: a1,
            showing_id,
            new_status: SeatStatus::Available,
            action: SeatAction::Release,
        });
        assert!(!session.is_selected(a1));
        assert_eq!(session.seat(a1).unwrap().status, SeatStatus::Available);
    }

    #[tokio::test]
    async fn test_remote_hold_on_foreign_seat_updates_cache_only() {
        let (showing_id, inventory, mut session) = ready_session().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();
        let b2 = inventory.seat_id_by_label("B2").unwrap();
        session.toggle(a1).await.unwrap();

        session.apply_remote_event(&SeatChangeEvent {
            seat_id: b2,
            showing_id,
            new_status: SeatStatus::Held,
            action: SeatAction::Hold,
        });
        assert_eq!(session.seat(b2).unwrap().status, SeatStatus::Held);
        assert!(session.is_selected(a1));
        assert_eq!(session.selected_ids().len(), 1);
    }

    #[tokio::test]
    async fn test_release_all_is_idempotent() {
        let (showing_id, inventory, mut session) = ready_session().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();
        let a2 = inventory.seat_id_by_label("A2").unwrap();
        session.toggle(a1).await.unwrap();
        session.toggle(a2).await.unwrap();

        session.release_all().await;
        assert!(session.selection_is_empty());
        let counts = inventory.seat_counts(showing_id).await.unwrap();
        assert_eq!(counts.held, 0);

        // Second pass has nothing to release; watch the feed for silence
        let mut subscription = cinerama_core::SeatFeed::subscribe(&*inventory, showing_id)
            .await
            .unwrap();
        session.release_all().await;
        let quiet =
            tokio::time::timeout(std::time::Duration::from_millis(20), subscription.next()).await;
        assert!(quiet.is_err(), "no further release traffic expected");
    }

    #[tokio::test]
    async fn test_release_all_survives_failures() {
        let (_, inventory, mut session) = ready_session().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();
        let a2 = inventory.seat_id_by_label("A2").unwrap();
        session.toggle(a1).await.unwrap();
        session.toggle(a2).await.unwrap();

        inventory.poison_seat(a1);
        session.release_all().await;
        assert!(session.selection_is_empty());
    }

    #[tokio::test]
    async fn test_reload_after_expiry_shows_available() {
        let (_, inventory, mut session) = ready_session().await;
        let a1 = inventory.seat_id_by_label("A1").unwrap();
        let a2 = inventory.seat_id_by_label("A2").unwrap();
        session.toggle(a1).await.unwrap();
        session.toggle(a2).await.unwrap();

        session.release_all().await;
        session.reload().await.unwrap();
        assert!(session.selection_is_empty());
        assert_eq!(session.seat(a1).unwrap().status, SeatStatus::Available);
        assert_eq!(session.seat(a2).unwrap().status, SeatStatus::Available);
    }
}
