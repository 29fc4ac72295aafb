use crate::core::annotation::{Annotation, BinaryAnnotation};
use crate::core::endpoint::Endpoint;
use crate::core::identifier::Identifier;
use crate::core::span::Span;
use crate::core::tracer::{Sampled, Tracer};
use crate::error::{TraceError, TraceResult};
use std::net::{IpAddr, Ipv4Addr};

/// Describes a span to be pushed onto a [`Trace`]'s stack.
///
/// Propagated identities are opt-in: a span id supplied by an upstream
/// caller (the B3 pattern where the caller pre-allocates the callee's span
/// id) is adopted via [`with_span_id`], and an explicit parent overrides the
/// current top-of-stack span via [`with_parent_span_id`].
///
/// [`with_span_id`]: SpanBuilder::with_span_id
/// [`with_parent_span_id`]: SpanBuilder::with_parent_span_id
#[derive(Clone, Debug)]
pub struct SpanBuilder {
    name: String,
    span_id: Option<Identifier>,
    parent_span_id: Option<Identifier>,
}

impl SpanBuilder {
    /// Start describing a span with the given operation name.
    pub fn new(name: impl Into<String>) -> Self {
        SpanBuilder {
            name: name.into(),
            span_id: None,
            parent_span_id: None,
        }
    }

    /// Adopt a span id chosen upstream instead of generating one.
    pub fn with_span_id(mut self, span_id: Identifier) -> Self {
        self.span_id = Some(span_id);
        self
    }

    /// Parent this span explicitly, overriding the current span.
    pub fn with_parent_span_id(mut self, parent_span_id: Identifier) -> Self {
        self.parent_span_id = Some(parent_span_id);
        self
    }
}

/// Builder for [`Trace`]; the `Uninitialized` phase of its lifecycle.
#[derive(Debug, Default)]
pub struct TraceBuilder {
    tracer: Option<Tracer>,
    endpoint: Option<Endpoint>,
    trace_id: Option<Identifier>,
    sampled: Option<Sampled>,
    debug: Option<bool>,
}

impl TraceBuilder {
    /// Supply a pre-built tracer, overriding `sampled`/`debug`.
    pub fn tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// The endpoint stamped onto recorded annotations.
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Adopt a trace id propagated from an upstream caller. The resulting
    /// trace is a continuation, not a new root.
    pub fn trace_id(mut self, trace_id: Identifier) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// The inbound sampling decision; defaults to always sample.
    pub fn sampled(mut self, sampled: Sampled) -> Self {
        self.sampled = Some(sampled);
        self
    }

    /// The inbound debug flag; defaults to `true`.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Transition to `Active` with an empty span stack.
    ///
    /// A missing trace id is freshly generated; a missing endpoint falls
    /// back to the unknown service on localhost.
    pub fn build(self) -> Trace {
        let tracer = self.tracer.unwrap_or_else(|| {
            Tracer::new(self.sampled.unwrap_or_default(), self.debug.unwrap_or(true))
        });
        Trace {
            trace_id: self.trace_id.unwrap_or_else(Identifier::random),
            spans: Vec::new(),
            endpoint: self
                .endpoint
                .unwrap_or_else(|| Endpoint::new("", IpAddr::V4(Ipv4Addr::LOCALHOST), 0)),
            tracer,
            closed: false,
        }
    }
}

/// The current request's span stack and endpoint.
///
/// One `Trace` exists per inbound request and is never shared across
/// requests, so no internal locking is needed. The stack grows on
/// [`create_span`]/[`push_span`], shrinks on [`finish_span`]/[`pop_span`],
/// and at most one span — the top of the stack — is "current" at any time.
///
/// The trace never catches its own errors: every operation fails loudly
/// with a typed [`TraceError`] and leaves degrade decisions to the caller.
/// After [`close`], every mutating or stack operation fails with
/// [`TraceError::TraceClosed`]; the read accessors ([`trace_id`],
/// [`spans`], [`current_span`], [`endpoint`], [`tracer`]) stay usable so
/// the request-end hook can still inspect and export what was recorded.
///
/// [`close`]: Trace::close
/// [`trace_id`]: Trace::trace_id
/// [`spans`]: Trace::spans
/// [`current_span`]: Trace::current_span
/// [`endpoint`]: Trace::endpoint
/// [`tracer`]: Trace::tracer
///
/// [`create_span`]: Trace::create_span
/// [`push_span`]: Trace::push_span
/// [`finish_span`]: Trace::finish_span
/// [`pop_span`]: Trace::pop_span
#[derive(Clone, Debug)]
pub struct Trace {
    trace_id: Identifier,
    // Stack of live spans; the last element is the current span.
    spans: Vec<Span>,
    endpoint: Endpoint,
    tracer: Tracer,
    closed: bool,
}

impl Trace {
    /// Start building a trace.
    pub fn builder() -> TraceBuilder {
        TraceBuilder::default()
    }

    /// Create a span and push it onto the stack, making it current.
    ///
    /// The span id is taken from the builder when propagated, else freshly
    /// generated. Parent resolution precedence: explicit builder parent,
    /// then the current top-of-stack span's id, then none (root span).
    /// Returns the new span's id.
    pub fn create_span(&mut self, builder: SpanBuilder) -> TraceResult<Identifier> {
        self.ensure_open()?;
        let span_id = builder.span_id.unwrap_or_else(Identifier::random);
        if self.spans.iter().any(|span| span.span_id() == span_id) {
            return Err(TraceError::SpanConflict(span_id));
        }
        let parent_span_id = builder
            .parent_span_id
            .or_else(|| self.spans.last().map(Span::span_id));
        self.spans
            .push(Span::new(builder.name, self.trace_id, span_id, parent_span_id));
        Ok(span_id)
    }

    /// Record annotations and tags against the current span.
    ///
    /// Items without an endpoint are stamped with the trace's endpoint
    /// before being handed to the span. Fails with
    /// [`TraceError::NoActiveSpan`] if the stack is empty.
    pub fn record(
        &mut self,
        mut annotations: Vec<Annotation>,
        mut binary_annotations: Vec<BinaryAnnotation>,
    ) -> TraceResult<()> {
        self.ensure_open()?;
        for annotation in &mut annotations {
            annotation.set_endpoint_if_absent(&self.endpoint);
        }
        for tag in &mut binary_annotations {
            tag.set_endpoint_if_absent(&self.endpoint);
        }
        let span = self.spans.last_mut().ok_or(TraceError::NoActiveSpan)?;
        span.record(annotations, binary_annotations)
    }

    /// Push an existing span, re-establishing it as current.
    ///
    /// Used to make the server span current again after intervening work.
    /// Fails with [`TraceError::SpanConflict`] — leaving the stack
    /// unchanged — if a span with the same id is already on the stack.
    pub fn push_span(&mut self, span: Span) -> TraceResult<()> {
        self.ensure_open()?;
        if self.spans.iter().any(|s| s.span_id() == span.span_id()) {
            return Err(TraceError::SpanConflict(span.span_id()));
        }
        self.spans.push(span);
        Ok(())
    }

    /// Pop the current span off the stack without finalizing it.
    pub fn pop_span(&mut self) -> TraceResult<Option<Span>> {
        self.ensure_open()?;
        Ok(self.spans.pop())
    }

    /// Finalize the current span and remove it from the stack, handing it
    /// back for export.
    pub fn finish_span(&mut self) -> TraceResult<Span> {
        self.ensure_open()?;
        let mut span = self.spans.pop().ok_or(TraceError::NoActiveSpan)?;
        span.finalize()?;
        Ok(span)
    }

    /// Rebind the endpoint used for subsequent annotations, e.g. after
    /// request routing resolves the final handler's service name.
    pub fn set_endpoint(&mut self, endpoint: Endpoint) -> TraceResult<()> {
        self.ensure_open()?;
        self.endpoint = endpoint;
        Ok(())
    }

    /// Close the trace; every later operation fails with
    /// [`TraceError::TraceClosed`].
    pub fn close(&mut self) -> TraceResult<()> {
        self.ensure_open()?;
        self.closed = true;
        Ok(())
    }

    /// The trace id, immutable for the life of the trace.
    pub fn trace_id(&self) -> Identifier {
        self.trace_id
    }

    /// Snapshot of the live span stack, most recent first.
    pub fn spans(&self) -> Vec<&Span> {
        self.spans.iter().rev().collect()
    }

    /// The current (top-of-stack) span, if any.
    pub fn current_span(&self) -> Option<&Span> {
        self.spans.last()
    }

    /// The endpoint stamped onto recorded annotations.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The trace's sampling/debug flags.
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Mutable access to the flags, e.g. for the degrade kill switch.
    pub fn tracer_mut(&mut self) -> &mut Tracer {
        &mut self.tracer
    }

    /// Whether [`close`] has been called.
    ///
    /// [`close`]: Trace::close
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> TraceResult<()> {
        if self.closed {
            Err(TraceError::TraceClosed)
        } else {
            Ok(())
        }
    }
}
