use crate::core::annotation::{Annotation, BinaryAnnotation};
use crate::core::identifier::Identifier;
use crate::error::{TraceError, TraceResult};
use crate::time;

/// One timed unit of work within a trace.
///
/// A span is created when the unit of work begins, accumulates annotations
/// and tags while the work runs, and is finalized exactly once when the work
/// ends. After finalization the span is immutable: `record` fails with
/// [`TraceError::SpanClosed`] and the duration is preserved.
#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    name: String,
    trace_id: Identifier,
    span_id: Identifier,
    parent_span_id: Option<Identifier>,
    timestamp: u64,
    duration: Option<u64>,
    annotations: Vec<Annotation>,
    binary_annotations: Vec<BinaryAnnotation>,
}

impl Span {
    /// Create a span starting now.
    pub fn new(
        name: impl Into<String>,
        trace_id: Identifier,
        span_id: Identifier,
        parent_span_id: Option<Identifier>,
    ) -> Self {
        Span {
            name: name.into(),
            trace_id,
            span_id,
            parent_span_id,
            timestamp: time::now_micros(),
            duration: None,
            annotations: Vec::new(),
            binary_annotations: Vec::new(),
        }
    }

    /// Append annotations and tags to this span.
    ///
    /// The whole batch is validated before anything is appended: if any item
    /// is malformed (an empty tag key, an empty custom event name) the call
    /// fails with [`TraceError::Record`] and the span is unchanged.
    pub fn record(
        &mut self,
        annotations: Vec<Annotation>,
        binary_annotations: Vec<BinaryAnnotation>,
    ) -> TraceResult<()> {
        if self.duration.is_some() {
            return Err(TraceError::SpanClosed);
        }
        for annotation in &annotations {
            if annotation.value().as_str().is_empty() {
                return Err(TraceError::Record("empty annotation value".to_owned()));
            }
        }
        for tag in &binary_annotations {
            if tag.key().is_empty() {
                return Err(TraceError::Record("empty tag key".to_owned()));
            }
        }
        self.annotations.extend(annotations);
        self.binary_annotations.extend(binary_annotations);
        Ok(())
    }

    /// End the span, computing `duration = now - start`.
    ///
    /// A second call fails with [`TraceError::SpanClosed`] and leaves the
    /// original duration untouched.
    pub fn finalize(&mut self) -> TraceResult<()> {
        if self.duration.is_some() {
            return Err(TraceError::SpanClosed);
        }
        // Clamp to 1µs so zero-length spans stay visible in collectors.
        let elapsed = time::now_micros().saturating_sub(self.timestamp).max(1);
        self.duration = Some(elapsed);
        Ok(())
    }

    /// The operation name, e.g. `"GET /users"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The id of the trace this span belongs to.
    pub fn trace_id(&self) -> Identifier {
        self.trace_id
    }

    /// This span's id.
    pub fn span_id(&self) -> Identifier {
        self.span_id
    }

    /// The parent span's id, absent for a root span.
    pub fn parent_span_id(&self) -> Option<Identifier> {
        self.parent_span_id
    }

    /// Start time in microseconds since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Duration in microseconds, `None` until the span is finalized.
    pub fn duration(&self) -> Option<u64> {
        self.duration
    }

    /// Whether [`finalize`] has been called.
    ///
    /// [`finalize`]: Span::finalize
    pub fn is_finalized(&self) -> bool {
        self.duration.is_some()
    }

    /// The recorded annotations, in append order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// The recorded tags, in append order.
    pub fn binary_annotations(&self) -> &[BinaryAnnotation] {
        &self.binary_annotations
    }
}
