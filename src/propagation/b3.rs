//! # B3 Propagator
//!
//! Encodes and decodes trace identity using the multi-header B3 format:
//!
//! ```text
//! X-B3-TraceId: {trace_id}
//! X-B3-SpanId: {span_id}
//! X-B3-ParentSpanId: {parent_span_id}
//! X-B3-Sampled: {sampling_state}
//! X-B3-Flags: {debug_flag}
//! ```
//!
//! Extraction is tolerant of absence — every header is optional, and a
//! missing trace id simply means "start a new trace" — but a header that is
//! present and malformed fails with [`TraceError::InvalidIdentifier`].

use crate::core::identifier::Identifier;
use crate::core::trace::Trace;
use crate::core::tracer::Sampled;
use crate::error::{TraceError, TraceResult};
use crate::propagation::{Extractor, Injector};
use once_cell::sync::Lazy;

// Header names are kept lowercase: HTTP hosts conventionally use
// X-B3-$Name while gRPC uses x-b3-$name, and carriers on the HTTP side
// compare case-insensitively anyway.
const B3_TRACE_ID_HEADER: &str = "x-b3-traceid";
const B3_SPAN_ID_HEADER: &str = "x-b3-spanid";
const B3_PARENT_SPAN_ID_HEADER: &str = "x-b3-parentspanid";
const B3_SAMPLED_HEADER: &str = "x-b3-sampled";
const B3_DEBUG_FLAG_HEADER: &str = "x-b3-flags";

static B3_FIELDS: Lazy<[String; 5]> = Lazy::new(|| {
    [
        B3_TRACE_ID_HEADER.to_string(),
        B3_SPAN_ID_HEADER.to_string(),
        B3_PARENT_SPAN_ID_HEADER.to_string(),
        B3_SAMPLED_HEADER.to_string(),
        B3_DEBUG_FLAG_HEADER.to_string(),
    ]
});

/// Trace identity decoded from inbound B3 headers.
///
/// All fields are optional; absence of a trace id means the receiver
/// starts a new trace.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct B3Context {
    /// The propagated trace id, if any.
    pub trace_id: Option<Identifier>,
    /// The span id pre-allocated for this server's span by the caller.
    pub span_id: Option<Identifier>,
    /// The caller's parent span id.
    pub parent_span_id: Option<Identifier>,
    /// The inbound sampling decision.
    pub sampled: Option<Sampled>,
    /// The inbound debug flag.
    pub debug: Option<bool>,
}

/// Extracts trace identity from inbound carriers and injects the current
/// span's identity into outbound ones using B3 multi-headers.
#[derive(Clone, Debug, Default)]
pub struct Propagator {
    _private: (),
}

impl Propagator {
    /// Create a new B3 multi-header propagator.
    pub fn new() -> Self {
        Propagator::default()
    }

    /// The header names this propagator reads and writes.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        B3_FIELDS.iter().map(|field| field.as_str())
    }

    /// Decode B3 headers from an inbound carrier.
    ///
    /// Absent headers decode to `None`; present-but-malformed identifiers
    /// fail loudly so the host integration can log and degrade.
    pub fn extract(&self, extractor: &dyn Extractor) -> TraceResult<B3Context> {
        Ok(B3Context {
            trace_id: self.extract_identifier(extractor, B3_TRACE_ID_HEADER)?,
            span_id: self.extract_identifier(extractor, B3_SPAN_ID_HEADER)?,
            parent_span_id: self.extract_identifier(extractor, B3_PARENT_SPAN_ID_HEADER)?,
            sampled: extractor
                .get(B3_SAMPLED_HEADER)
                .and_then(Sampled::from_header),
            debug: extractor.get(B3_DEBUG_FLAG_HEADER).and_then(parse_flag),
        })
    }

    /// Encode the trace's current identity into an outbound carrier.
    ///
    /// Writes the root-preserving trace id, the *current* span's id (which
    /// becomes the downstream callee's parent span id), and the tracer's
    /// sampled/debug flags. The trace is never mutated; fails with
    /// [`TraceError::NoActiveSpan`] when no span is current.
    pub fn inject(&self, trace: &Trace, injector: &mut dyn Injector) -> TraceResult<()> {
        if trace.is_closed() {
            return Err(TraceError::TraceClosed);
        }
        let span = trace.current_span().ok_or(TraceError::NoActiveSpan)?;
        injector.set(B3_TRACE_ID_HEADER, trace.trace_id().to_string());
        injector.set(B3_SPAN_ID_HEADER, span.span_id().to_string());
        injector.set(B3_SAMPLED_HEADER, trace.tracer().sampled().to_string());
        injector.set(
            B3_DEBUG_FLAG_HEADER,
            if trace.tracer().debug() { "1" } else { "0" }.to_string(),
        );
        Ok(())
    }

    fn extract_identifier(
        &self,
        extractor: &dyn Extractor,
        header: &str,
    ) -> TraceResult<Option<Identifier>> {
        match extractor.get(header) {
            Some(value) if !value.is_empty() => Identifier::from_header(value).map(Some),
            _ => Ok(None),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trace::SpanBuilder;
    use std::collections::HashMap;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn extract_with_no_headers_is_empty() {
        let propagator = Propagator::new();
        let carrier: HashMap<String, String> = HashMap::new();
        assert_eq!(propagator.extract(&carrier).unwrap(), B3Context::default());
    }

    #[test]
    fn extract_reads_all_fields() {
        let propagator = Propagator::new();
        let carrier = headers(&[
            ("x-b3-traceid", "0000000000abc123"),
            ("x-b3-spanid", "0000000000def456"),
            ("x-b3-parentspanid", "0000000000111222"),
            ("x-b3-sampled", "0.5"),
            ("x-b3-flags", "0"),
        ]);
        let context = propagator.extract(&carrier).unwrap();
        assert_eq!(context.trace_id, Some(Identifier::from_u64(0xabc123)));
        assert_eq!(context.span_id, Some(Identifier::from_u64(0xdef456)));
        assert_eq!(context.parent_span_id, Some(Identifier::from_u64(0x111222)));
        assert_eq!(context.sampled, Some(Sampled::ratio(0.5)));
        assert_eq!(context.debug, Some(false));
    }

    #[test]
    fn malformed_identifier_fails_loudly() {
        let propagator = Propagator::new();
        let carrier = headers(&[("x-b3-traceid", "not an id")]);
        assert!(matches!(
            propagator.extract(&carrier),
            Err(TraceError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn inject_writes_current_span_identity() {
        let propagator = Propagator::new();
        let mut trace = Trace::builder()
            .trace_id(Identifier::from_u64(0xabc123))
            .build();
        let span_id = trace.create_span(SpanBuilder::new("GET /users")).unwrap();

        let mut carrier: HashMap<String, String> = HashMap::new();
        propagator.inject(&trace, &mut carrier).unwrap();

        assert_eq!(
            Extractor::get(&carrier, "x-b3-traceid"),
            Some("0000000000abc123")
        );
        assert_eq!(
            Extractor::get(&carrier, "x-b3-spanid"),
            Some(span_id.to_string().as_str())
        );
        assert_eq!(Extractor::get(&carrier, "x-b3-sampled"), Some("1"));
        assert_eq!(Extractor::get(&carrier, "x-b3-flags"), Some("1"));
    }

    #[test]
    fn inject_passes_ratio_sampled_through_unchanged() {
        let propagator = Propagator::new();
        let mut trace = Trace::builder().sampled(Sampled::ratio(0.25)).build();
        trace.create_span(SpanBuilder::new("GET /users")).unwrap();

        let mut carrier: HashMap<String, String> = HashMap::new();
        propagator.inject(&trace, &mut carrier).unwrap();
        assert_eq!(Extractor::get(&carrier, "x-b3-sampled"), Some("0.25"));
    }

    #[test]
    fn inject_re_emits_the_literal_sampled_header_text() {
        let propagator = Propagator::new();
        let inbound = headers(&[("x-b3-sampled", "1.0")]);
        let context = propagator.extract(&inbound).unwrap();

        let mut trace = Trace::builder().sampled(context.sampled.unwrap()).build();
        trace.create_span(SpanBuilder::new("GET /users")).unwrap();

        let mut outbound: HashMap<String, String> = HashMap::new();
        propagator.inject(&trace, &mut outbound).unwrap();
        assert_eq!(Extractor::get(&outbound, "x-b3-sampled"), Some("1.0"));
    }

    #[test]
    fn inject_without_active_span_fails() {
        let propagator = Propagator::new();
        let trace = Trace::builder().build();
        let mut carrier: HashMap<String, String> = HashMap::new();
        assert_eq!(
            propagator.inject(&trace, &mut carrier),
            Err(TraceError::NoActiveSpan)
        );
    }

    #[test]
    fn extract_then_inject_preserves_the_trace_id() {
        let propagator = Propagator::new();
        let inbound = headers(&[("x-b3-traceid", "0000000000abc123")]);
        let context = propagator.extract(&inbound).unwrap();

        let mut trace = Trace::builder().trace_id(context.trace_id.unwrap()).build();
        trace.create_span(SpanBuilder::new("GET /users")).unwrap();

        let mut outbound: HashMap<String, String> = HashMap::new();
        propagator.inject(&trace, &mut outbound).unwrap();
        assert_eq!(
            Extractor::get(&outbound, "x-b3-traceid"),
            Some("0000000000abc123")
        );
    }
}
