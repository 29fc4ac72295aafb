//! The request-scoped tracing boundary.
//!
//! A [`TracingContext`] is created by the host's request-start hook and
//! carried explicitly to the request-end hook — as a function parameter or
//! inside the host's request-scoped store — never as process-global state.
//! Downstream HTTP clients read outbound headers from it directly via
//! [`inject`].
//!
//! Error policy lives at this boundary: the core types below it fail fast
//! with typed errors, and the host catches those, calls [`degrade`], and
//! continues serving the request. A tracing failure never fails the
//! business request.
//!
//! [`inject`]: TracingContext::inject
//! [`degrade`]: TracingContext::degrade

use crate::core::annotation::{Annotation, BinaryAnnotation};
use crate::core::endpoint::Endpoint;
use crate::core::identifier::Identifier;
use crate::core::span::Span;
use crate::core::trace::{SpanBuilder, Trace};
use crate::error::{TraceError, TraceResult};
use crate::export::SpanExporter;
use crate::propagation::b3::Propagator;
use crate::propagation::{Extractor, Injector};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

/// Builder for [`TracingContext`].
#[derive(Debug, Default)]
pub struct TracingContextBuilder {
    endpoint: Option<Endpoint>,
    exporter: Option<Arc<dyn SpanExporter>>,
    propagator: Option<Propagator>,
}

impl TracingContextBuilder {
    /// The endpoint describing this service instance.
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Where finished spans are handed off. Without an exporter the
    /// context records normally and drops finished spans.
    pub fn exporter(mut self, exporter: Arc<dyn SpanExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Override the header codec; defaults to B3 multi-headers.
    pub fn propagator(mut self, propagator: Propagator) -> Self {
        self.propagator = Some(propagator);
        self
    }

    /// Build the context. The trace itself is created by
    /// [`TracingContext::start`] once inbound headers are available.
    pub fn build(self) -> TracingContext {
        TracingContext {
            endpoint: self
                .endpoint
                .unwrap_or_else(|| Endpoint::new("", IpAddr::V4(Ipv4Addr::LOCALHOST), 0)),
            exporter: self.exporter,
            propagator: self.propagator.unwrap_or_default(),
            trace: None,
            server_span_id: None,
        }
    }
}

/// Carries one request's trace from the request-start hook to the
/// request-end hook.
///
/// Lifecycle: [`start`] parses inbound B3 headers, creates the trace
/// (adopting propagated identity) and the server span, and records the
/// `sr` annotation plus request tags. During the request, [`inject`]
/// supplies outbound headers and [`trace_mut`] exposes the trace for child
/// spans. [`finish`] records `ss` plus response tags, finalizes the span
/// stack, exports, and closes the trace.
///
/// [`start`]: TracingContext::start
/// [`inject`]: TracingContext::inject
/// [`trace_mut`]: TracingContext::trace_mut
/// [`finish`]: TracingContext::finish
#[derive(Debug)]
pub struct TracingContext {
    endpoint: Endpoint,
    exporter: Option<Arc<dyn SpanExporter>>,
    propagator: Propagator,
    trace: Option<Trace>,
    server_span_id: Option<Identifier>,
}

impl TracingContext {
    /// Start building a context.
    pub fn builder() -> TracingContextBuilder {
        TracingContextBuilder::default()
    }

    /// Begin tracing an inbound request.
    ///
    /// `name` is the server span's operation name; hosts conventionally use
    /// `"{METHOD} {URI}"`. Propagated trace/span/parent ids in `headers`
    /// are adopted rather than regenerated; absent headers start a fresh
    /// trace. `request_tags` are recorded alongside the `sr` annotation
    /// (see [`tags`] for the standard keys).
    ///
    /// Fails with [`TraceError::SpanConflict`] if called twice.
    ///
    /// [`tags`]: crate::tags
    pub fn start(
        &mut self,
        name: impl Into<String>,
        headers: &dyn Extractor,
        request_tags: Vec<BinaryAnnotation>,
    ) -> TraceResult<()> {
        if let Some(server_span_id) = self.server_span_id {
            return Err(TraceError::SpanConflict(server_span_id));
        }
        let b3 = self.propagator.extract(headers)?;

        let mut builder = Trace::builder().endpoint(self.endpoint.clone());
        if let Some(trace_id) = b3.trace_id {
            builder = builder.trace_id(trace_id);
        }
        if let Some(sampled) = b3.sampled {
            builder = builder.sampled(sampled);
        }
        if let Some(debug) = b3.debug {
            builder = builder.debug(debug);
        }
        let mut trace = builder.build();

        let mut span = SpanBuilder::new(name);
        if let Some(span_id) = b3.span_id {
            span = span.with_span_id(span_id);
        }
        if let Some(parent_span_id) = b3.parent_span_id {
            span = span.with_parent_span_id(parent_span_id);
        }
        let server_span_id = trace.create_span(span)?;
        trace.record(vec![Annotation::server_recv()], request_tags)?;

        tracing::debug!(
            trace_id = %trace.trace_id(),
            span_id = %server_span_id,
            "server span started",
        );
        self.trace = Some(trace);
        self.server_span_id = Some(server_span_id);
        Ok(())
    }

    /// Write outbound B3 headers for a downstream call, taken from the
    /// current span.
    pub fn inject(&self, injector: &mut dyn Injector) -> TraceResult<()> {
        let trace = self.trace.as_ref().ok_or(TraceError::NoActiveSpan)?;
        self.propagator.inject(trace, injector)
    }

    /// Finish the request: record the `ss` annotation and `response_tags`
    /// on the server span, finalize and export the span stack, and close
    /// the trace.
    ///
    /// Children the business logic created but never finished are
    /// finalized and exported on the way down to the server span.
    pub fn finish(&mut self, response_tags: Vec<BinaryAnnotation>) -> TraceResult<()> {
        let server_span_id = self.server_span_id.ok_or(TraceError::NoActiveSpan)?;
        let exporter = self.exporter.clone();
        let trace = self.trace.as_mut().ok_or(TraceError::NoActiveSpan)?;

        while trace.current_span().map(Span::span_id) != Some(server_span_id) {
            if trace.current_span().is_none() {
                return Err(TraceError::NoActiveSpan);
            }
            let abandoned = trace.finish_span()?;
            tracing::debug!(span_id = %abandoned.span_id(), "finalizing abandoned child span");
            export(&exporter, trace, abandoned);
        }

        trace.record(vec![Annotation::server_send()], response_tags)?;
        let server_span = trace.finish_span()?;
        export(&exporter, trace, server_span);
        trace.close()
    }

    /// Log a tracing failure and flip the export kill switch.
    ///
    /// Called by the host integration when any core operation errors, so
    /// the failure degrades to "do not export" instead of propagating into
    /// business logic.
    pub fn degrade(&mut self, error: &TraceError) {
        tracing::warn!(%error, "tracing error; disabling span export for this request");
        if let Some(trace) = self.trace.as_mut() {
            trace.tracer_mut().set_debug(false);
        }
    }

    /// The request's trace, once [`start`] has run.
    ///
    /// [`start`]: TracingContext::start
    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    /// Mutable access to the trace, e.g. to create child spans around
    /// downstream calls.
    pub fn trace_mut(&mut self) -> Option<&mut Trace> {
        self.trace.as_mut()
    }

    /// The server span's id, once [`start`] has run.
    ///
    /// [`start`]: TracingContext::start
    pub fn server_span_id(&self) -> Option<Identifier> {
        self.server_span_id
    }
}

/// Hand a finished span to the exporter when the debug gate is open.
/// Suppression only skips export; the span was still recorded.
fn export(exporter: &Option<Arc<dyn SpanExporter>>, trace: &Trace, span: Span) {
    if !trace.tracer().debug() {
        return;
    }
    if let Some(exporter) = exporter {
        exporter.export(span.into());
    }
}
