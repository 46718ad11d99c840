//! Services
//!
//! Card lifecycle operations and the transfer engine. Each service owns a
//! pool-backed store and exposes `execute`-style async operations.

mod cards;
mod transfer;

pub use cards::CardService;
pub use transfer::{TransferCommand, TransferEngine, TransferResult};
