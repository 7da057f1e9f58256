//! Per-request gate: session resolution, tier enforcement and CSRF checks

pub mod context;
pub mod gatekeeper;

pub use context::{IncomingRequest, PendingCookies, RequestContext};
pub use gatekeeper::{GateError, GateOutcome, GateState, Gatekeeper};
