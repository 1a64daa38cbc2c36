use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seat availability as arbitrated by the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Held,
    Occupied,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatKind {
    Standard,
    Premium,
}

/// A single seat in a showing's room. The backend owns the authoritative
/// value; clients cache a possibly stale copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: Uuid,
    pub showing_id: Uuid,
    pub row: String,
    pub number: u32,
    pub kind: SeatKind,
    pub status: SeatStatus,
    /// Per-seat price override; the showing's ticket price applies when absent
    pub price_cents: Option<i64>,
}

impl Seat {
    /// Display label, e.g. "B12"
    pub fn label(&self) -> String {
        format!("{}{}", self.row, self.number)
    }
}

/// What the backend did to a seat
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatAction {
    Hold,
    Release,
    Confirm,
}

/// Out-of-band seat-state change, delivered at-least-once and unordered.
/// Carries the latest known status, never a delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatChangeEvent {
    pub seat_id: Uuid,
    pub showing_id: Uuid,
    pub new_status: SeatStatus,
    pub action: SeatAction,
}

/// Occupancy summary for a showing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeatCounts {
    pub total: u32,
    pub available: u32,
    pub held: u32,
    pub occupied: u32,
}

impl SeatCounts {
    pub fn occupancy_pct(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.held + self.occupied) / f64::from(self.total) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_deserialization() {
        let json = r#"
            {
                "id": "4f8a2c1e-9b3d-4e5f-8a7b-6c5d4e3f2a1b",
                "showingId": "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0",
                "row": "B",
                "number": 12,
                "kind": "PREMIUM",
                "status": "AVAILABLE",
                "priceCents": 1500
            }
        "#;
        let seat: Seat = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(seat.row, "B");
        assert_eq!(seat.label(), "B12");
        assert_eq!(seat.kind, SeatKind::Premium);
        assert_eq!(seat.status, SeatStatus::Available);
        assert_eq!(seat.price_cents, Some(1500));
    }

    #[test]
    fn test_occupancy_pct() {
        let counts = SeatCounts {
            total: 40,
            available: 30,
            held: 4,
            occupied: 6,
        };
        assert!((counts.occupancy_pct() - 25.0).abs() < f64::EPSILON);

        let empty = SeatCounts {
            total: 0,
            available: 0,
            held: 0,
            occupied: 0,
        };
        assert_eq!(empty.occupancy_pct(), 0.0);
    }
}
