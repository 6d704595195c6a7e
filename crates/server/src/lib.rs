//! HTTP boundary for the Vitrine collection browser.
//!
//! Exposes the content resolution endpoint (with its CORS preflight), the
//! collection page endpoint driving the pagination orchestrator, explicit
//! cache management, and a health probe.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
