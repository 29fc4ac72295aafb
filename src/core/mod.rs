//! The trace/span data model: identifiers, endpoints, annotations, spans,
//! and the per-request [`Trace`] that orchestrates them.
//!
//! [`Trace`]: crate::core::trace::Trace

pub mod annotation;
pub mod endpoint;
pub mod identifier;
pub mod span;
pub mod trace;
pub mod tracer;
