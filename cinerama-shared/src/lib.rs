pub mod catalog;
pub mod envelope;
pub mod purchase;
pub mod seat;

pub use catalog::{Movie, Product, Showing};
pub use envelope::ApiEnvelope;
pub use purchase::{
    ConcessionDetail, ConcessionLine, ConfirmRequest, PaymentMethod, Receipt, TicketLine,
    TotalBreakdown, TotalRequest,
};
pub use seat::{Seat, SeatAction, SeatChangeEvent, SeatCounts, SeatKind, SeatStatus};
