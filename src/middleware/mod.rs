//! Middleware layer.
//!
//! Cross-cutting concerns wrapped around every request the server
//! dispatches:
//! - [`trace`]: the per-request span and its completion event

pub(crate) mod trace;
