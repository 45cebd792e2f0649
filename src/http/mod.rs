//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::Listener)
//!     → server.rs (accept loop, hyper connection, graceful/forced close)
//!     → request.rs (x-request-id)
//!     → handlers.rs (controller: input → users::service → response)
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{HttpServer, LISTENER_TASK};
