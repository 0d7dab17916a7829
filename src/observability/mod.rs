//! # Observability Infrastructure
//!
//! Structured logging setup and the resolution span macro. Every resolver
//! `get` call emits one span carrying the secret name, resolved version, and
//! backend name; status is recorded on the span and never alters control
//! flow.

pub mod logging;

pub use logging::init_logging;
