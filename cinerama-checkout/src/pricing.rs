//! Optimistic client-side totals. The backend's calculate-total response
//! is authoritative whenever available; this mirror exists so the UI can
//! show a figure before (or without) that round trip.

use cinerama_shared::{Seat, Showing, TicketLine, TotalBreakdown};

use crate::cart::ConcessionCart;

/// Itemize the current picks from locally cached data. Seat price falls
/// back to the showing's base ticket price when the seat carries no
/// override.
pub fn local_breakdown(showing: &Showing, seats: &[&Seat], cart: &ConcessionCart) -> TotalBreakdown {
    let tickets: Vec<TicketLine> = seats
        .iter()
        .map(|seat| TicketLine {
            seat_id: seat.id,
            seat_label: seat.label(),
            price_cents: seat.price_cents.unwrap_or(showing.ticket_price_cents),
        })
        .collect();

    let ticket_subtotal_cents: i64 = tickets.iter().map(|t| t.price_cents).sum();
    let concession_subtotal_cents = cart.subtotal_cents();

    TotalBreakdown {
        ticket_subtotal_cents,
        concession_subtotal_cents,
        total_cents: ticket_subtotal_cents + concession_subtotal_cents,
        tickets,
        concessions: cart.details(),
    }
}
