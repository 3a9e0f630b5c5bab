//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (controller.rs):
//!     Telemetry → Cache (optional) → Database (mandatory) → Bind listener
//!
//! Serving (controller.rs):
//!     select(accept loop, shutdown channel)
//!
//! Shutdown (shutdown.rs, controller.rs):
//!     Request received → Database disconnect → Cache disconnect → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: listener binds last (traffic only when ready)
//! - Shutdown runs at most once; later requests are no-ops
//! - The process exits from `main`, never from inside the controller

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use controller::{Components, LifecycleController, LifecycleError};
pub use shutdown::{Shutdown, ShutdownReason};
pub use signals::spawn_signal_listener;
pub use state::ListenState;
