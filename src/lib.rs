//! HTTP server supervised as a single unit.
//!
//! A signal watcher, the HTTP accept loop and a bounded drain routine run
//! under one [`lifecycle::Supervisor`]. The first task to return cancels the
//! others, and the first failure becomes the result of the run.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod users;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::{Supervisor, SupervisorError};
