//! # api-adapters
//!
//! The web routing and orchestration layer: axum handlers over the
//! service layer, bearer-token extraction, the `{success, …}` response
//! envelope, and the prometheus registry.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;

#[cfg(feature = "web-axum")]
mod router;
#[cfg(feature = "web-axum")]
pub use router::{router, AppState};
