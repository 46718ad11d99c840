//! Domain types
//!
//! Core card ledger types, pure of any infrastructure concerns.

mod amount;
mod card;
mod error;
mod page;

pub use amount::{Amount, AmountError};
pub use card::{Card, CardStatus, ParseCardStatusError};
pub use error::CardError;
pub use page::{Page, PageParams};
