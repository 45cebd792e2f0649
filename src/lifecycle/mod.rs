//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config + store → register tasks → Supervisor::run
//!
//! Supervisor (supervisor.rs):
//!     spawn every task under one CancellationToken
//!     first task to return → token.cancel() → everyone stops cooperatively
//!     join all → report the first failure (if any)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → token.cancel()
//!
//! Shutdown (shutdown.rs):
//!     token cancelled → stop accepting → drain in-flight → Drained | ForceClosed
//! ```
//!
//! # Design Decisions
//! - Cancellation is the only stop signal a task ever receives
//! - Shutdown has timeout: remaining connections are dropped after the grace period
//! - A forced close is a degraded success, not an error

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;
pub mod task;

pub use shutdown::{ListenerState, ServerControl};
pub use supervisor::{Supervisor, SupervisorError};
pub use task::{Completion, Task, TaskError, TaskFn, TaskResult};
