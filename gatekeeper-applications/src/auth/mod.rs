//! Authentication and Authorization Module
//!
//! - Identity: who the caller is, supplied by a pluggable provider
//! - Policy: which access tier a request path requires

pub mod identity;
pub mod policy;

pub use identity::{IdentityProvider, StaticIdentityProvider};
pub use policy::{PathMatcher, PolicyRegistry, ResourcePolicy};
