//! In-memory bridging session storage.
//!
//! Sessions live only in process memory and are reclaimed by the
//! answer-timeout sweep. No external persistence, no call history.

mod error;
mod session;
mod store;

pub use error::StoreError;
pub use session::*;
pub use store::SessionStore;
