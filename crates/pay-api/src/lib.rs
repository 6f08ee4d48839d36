//! # pay-api
//!
//! HTTP API layer for paygate-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Charge endpoint that redirects to the provider's hosted checkout
//! - Provider health reporting
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/payments/health` | Health of enabled providers |
//! | POST | `/payments/charge` | Initialize charge (303 to checkout) |
//! | GET | `/payments/verify/{reference}` | Verify transaction |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
