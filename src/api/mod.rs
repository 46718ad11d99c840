//! API module

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use sqlx::PgPool;

use crate::crypto::PanCrypto;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub crypto: Arc<PanCrypto>,
}

pub use routes::create_router;
