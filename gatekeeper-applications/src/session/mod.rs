//! Session Management Module
//!
//! Anonymous session creation, lookup, lazy expiry and promotion of a
//! session to an authenticated principal.

pub mod manager;
pub mod storage;
pub mod types;

pub use manager::SessionManager;
#[cfg(feature = "sqlite")]
pub use storage::SqliteSessionStore;
pub use storage::MemorySessionStore;
pub use types::*;
