//! The export boundary: finished spans leave the core here.
//!
//! Wire encoding (JSON/Thrift) and transport (HTTP, queue) belong to the
//! exporter implementation, not to this crate. Export is fire-and-forget:
//! implementations must not block the request, and their failures are
//! theirs to handle.

use crate::core::annotation::{Annotation, BinaryAnnotation};
use crate::core::identifier::Identifier;
use crate::core::span::Span;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use typed_builder::TypedBuilder;

/// A finalized span in the shape handed to collectors.
///
/// Identifiers serialize as 16-character lowercase hex and tag values keep
/// their original JSON type.
#[derive(TypedBuilder, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanData {
    trace_id: Identifier,
    span_id: Identifier,
    #[builder(setter(strip_option), default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_span_id: Option<Identifier>,
    name: String,
    timestamp: u64,
    #[builder(setter(strip_option), default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<u64>,
    #[builder(default)]
    annotations: Vec<Annotation>,
    #[builder(default)]
    binary_annotations: Vec<BinaryAnnotation>,
}

impl SpanData {
    /// The id of the trace the span belongs to.
    pub fn trace_id(&self) -> Identifier {
        self.trace_id
    }

    /// The span's id.
    pub fn span_id(&self) -> Identifier {
        self.span_id
    }

    /// The parent span's id, absent for root spans.
    pub fn parent_span_id(&self) -> Option<Identifier> {
        self.parent_span_id
    }

    /// The operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start time in microseconds since the Unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Duration in microseconds; present for spans that were finalized.
    pub fn duration(&self) -> Option<u64> {
        self.duration
    }

    /// The recorded events.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// The recorded tags.
    pub fn binary_annotations(&self) -> &[BinaryAnnotation] {
        &self.binary_annotations
    }
}

impl From<Span> for SpanData {
    fn from(span: Span) -> Self {
        SpanData {
            trace_id: span.trace_id(),
            span_id: span.span_id(),
            parent_span_id: span.parent_span_id(),
            name: span.name().to_owned(),
            timestamp: span.timestamp(),
            duration: span.duration(),
            annotations: span.annotations().to_vec(),
            binary_annotations: span.binary_annotations().to_vec(),
        }
    }
}

/// Receives finished spans for delivery to a collector.
///
/// Implementations are shared across the process behind an `Arc` and must
/// be safe to call from any request's thread.
pub trait SpanExporter: Send + Sync + fmt::Debug {
    /// Hand a finished span off for delivery. Must not block.
    fn export(&self, span: SpanData);
}

/// An in-memory span exporter that stores finished spans in a vector.
///
/// Useful for testing and debugging; spans are retrieved with
/// [`get_finished_spans`].
///
/// [`get_finished_spans`]: InMemorySpanExporter::get_finished_spans
#[derive(Clone, Debug, Default)]
pub struct InMemorySpanExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemorySpanExporter {
    /// Create an empty exporter.
    pub fn new() -> Self {
        InMemorySpanExporter::default()
    }

    /// The finished spans received so far, in export order.
    pub fn get_finished_spans(&self) -> Vec<SpanData> {
        self.spans
            .lock()
            .map(|spans| spans.clone())
            .unwrap_or_default()
    }

    /// Clear the stored spans.
    pub fn reset(&self) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.clear();
        }
    }
}

impl SpanExporter for InMemorySpanExporter {
    fn export(&self, span: SpanData) {
        tracing::trace!(
            trace_id = %span.trace_id(),
            span_id = %span.span_id(),
            name = span.name(),
            "exporting span",
        );
        if let Ok(mut spans) = self.spans.lock() {
            spans.push(span);
        }
    }
}
