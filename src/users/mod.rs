//! User records and the read-modify-write operation served over HTTP.
//!
//! # Data Flow
//! ```text
//! http handler (controller: maps errors to responses)
//!     → service.rs (business: propagates errors unchanged)
//!     → store.rs (data access: classifies NotFound vs storage faults)
//! ```

pub mod service;
pub mod store;

pub use service::{update_user, UserInput};
pub use store::{MemoryStore, StoreError, User, UserStore};
