//! Gatekeeper Core - Core data structures and trait definitions
//!
//! This module defines the access tiers, the session record, the session store
//! contract and the shared infrastructure (errors, configuration, logging, time)
//! used by the rest of the gatekeeper workspace.

pub mod config;
pub mod error;
pub mod logging;
pub mod time;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use time::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
