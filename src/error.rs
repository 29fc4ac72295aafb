use crate::core::identifier::Identifier;
use thiserror::Error;

/// A specialized `Result` for tracing operations.
pub type TraceResult<T> = Result<T, TraceError>;

/// Errors returned by the tracing core.
///
/// Every operation fails fast with one of these variants; nothing is
/// suppressed internally. The host integration is expected to catch them,
/// log, and degrade via [`Tracer::set_debug`] so a tracing failure never
/// fails the business request.
///
/// [`Tracer::set_debug`]: crate::core::tracer::Tracer::set_debug
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TraceError {
    /// A header value could not be parsed as a 64-bit hex or decimal id.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A record or inject operation requires a current span but the stack
    /// is empty.
    #[error("no active span in the trace")]
    NoActiveSpan,

    /// The span has already been finalized.
    #[error("span is closed")]
    SpanClosed,

    /// The trace has been closed; no further operations are possible.
    #[error("trace is closed")]
    TraceClosed,

    /// A span with this id is already present in the trace's span stack.
    #[error("span {0} already exists in the span stack")]
    SpanConflict(Identifier),

    /// A malformed annotation or tag was passed to a record call. The call
    /// is rejected as a whole; the span is left unchanged.
    #[error("record rejected: {0}")]
    Record(String),
}
