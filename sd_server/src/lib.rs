//! HTTP surface for the swiss_draft tournament engine.
//!
//! The binary in `main.rs` wires these modules together; they live in a
//! library target so integration tests can drive the router directly.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
