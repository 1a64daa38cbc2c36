pub mod cart;
pub mod models;
pub mod orchestrator;
pub mod pricing;
pub mod session;
pub mod timer;

pub use cart::{CartLine, ConcessionCart};
pub use models::{CheckoutContext, CheckoutDetails, CheckoutStep};
pub use orchestrator::{CheckoutError, CheckoutEvent, CheckoutOrchestrator};
pub use session::{SeatSelectionSession, SessionError, SessionState, ToggleOutcome};
pub use timer::{CheckoutTimer, TimerEvent};
