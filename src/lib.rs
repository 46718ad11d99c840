//! card-ledger Library
//!
//! Re-exports modules for integration testing and the server binary.

pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod domain;
pub mod service;
pub mod store;

mod error;

pub use config::Config;
pub use domain::{Amount, AmountError, Card, CardError, CardStatus, Page, PageParams};
pub use error::{AppError, AppResult};
