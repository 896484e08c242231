//! Round orchestration (client side) and the house engine (server side)

pub mod dealer;
pub mod orchestrator;
pub mod round;

pub use dealer::{Dealer, HistoryEntry, PlayerId};
pub use orchestrator::RoundOrchestrator;
pub use round::{Round, RoundEvent, RoundState};
