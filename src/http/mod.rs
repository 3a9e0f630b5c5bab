//! HTTP protocol handling subsystem (request router).
//!
//! # Data Flow
//! ```text
//! TCP connection (bound by the lifecycle controller)
//!     → request.rs (request ID, span)
//!     → server.rs (Axum router + middleware)
//!         GET /health   → health aggregator
//!         GET /metrics  → metrics registry
//!         /api/*        → domain router
//!         otherwise     → 404
//!     → response.rs (terminal error handling)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use response::AppError;
pub use server::{build_router, AppState};
