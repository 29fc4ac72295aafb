//! End-to-end request lifecycle tests: inbound B3 headers through server
//! span creation, recording, outbound header encoding, and export.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use zipkin_core::{
    tags, Annotation, BinaryAnnotation, Endpoint, Extractor, Identifier, InMemorySpanExporter,
    SpanBuilder, TracingContext,
};

fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn new_context(exporter: &InMemorySpanExporter) -> TracingContext {
    TracingContext::builder()
        .endpoint(Endpoint::new(
            "user-service",
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            8080,
        ))
        .exporter(Arc::new(exporter.clone()))
        .build()
}

#[test]
fn request_without_b3_headers_starts_a_fresh_trace() {
    let exporter = InMemorySpanExporter::new();
    let mut cx = new_context(&exporter);
    let inbound: HashMap<String, String> = HashMap::new();

    cx.start(
        "GET /users",
        &inbound,
        vec![BinaryAnnotation::string(tags::SERVER_URI, "/users")],
    )
    .unwrap();

    let trace_id = cx.trace().unwrap().trace_id();
    assert_ne!(trace_id.to_u64(), 0);

    cx.finish(vec![BinaryAnnotation::i64(tags::SERVER_RESPONSE_STATUS, 200)])
        .unwrap();

    let spans = exporter.get_finished_spans();
    assert_eq!(spans.len(), 1);
    let span = &spans[0];
    assert_eq!(span.trace_id(), trace_id);
    assert_eq!(span.parent_span_id(), None);
    assert_eq!(span.annotations().len(), 2);
    assert_eq!(span.annotations()[0].value().as_str(), "sr");
    assert_eq!(span.annotations()[1].value().as_str(), "ss");
    assert_eq!(span.binary_annotations().len(), 2);
    assert!(span.duration().unwrap() > 0);
}

#[test]
fn propagated_ids_are_trusted_not_regenerated() {
    let exporter = InMemorySpanExporter::new();
    let mut cx = new_context(&exporter);
    let inbound = headers(&[
        ("x-b3-traceid", "0000000000abc123"),
        ("x-b3-spanid", "0000000000def456"),
        ("x-b3-parentspanid", "0000000000111222"),
    ]);

    cx.start("GET /users", &inbound, vec![]).unwrap();
    cx.finish(vec![]).unwrap();

    let spans = exporter.get_finished_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].trace_id(), Identifier::from_u64(0xabc123));
    assert_eq!(spans[0].span_id(), Identifier::from_u64(0xdef456));
    assert_eq!(
        spans[0].parent_span_id(),
        Some(Identifier::from_u64(0x111222))
    );
}

#[test]
fn short_hex_ids_without_leading_zeros_are_adopted() {
    // B3 senders routinely strip leading zeros from ids.
    let exporter = InMemorySpanExporter::new();
    let mut cx = new_context(&exporter);
    let inbound = headers(&[
        ("x-b3-traceid", "abc123"),
        ("x-b3-spanid", "def456"),
        ("x-b3-parentspanid", "111222"),
    ]);

    cx.start("GET /users", &inbound, vec![]).unwrap();
    let trace = cx.trace().unwrap();
    assert_eq!(trace.trace_id(), Identifier::from_u64(0xabc123));
    let span = trace.current_span().unwrap();
    assert_eq!(span.span_id(), Identifier::from_u64(0xdef456));
    assert_eq!(span.parent_span_id(), Some(Identifier::from_u64(0x111222)));
}

#[test]
fn outbound_headers_carry_the_current_span() {
    let exporter = InMemorySpanExporter::new();
    let mut cx = new_context(&exporter);
    let inbound = headers(&[
        ("x-b3-traceid", "0000000000abc123"),
        ("x-b3-sampled", "1"),
        ("x-b3-flags", "1"),
    ]);
    cx.start("GET /users", &inbound, vec![]).unwrap();
    let server_span_id = cx.server_span_id().unwrap();

    let mut outbound: HashMap<String, String> = HashMap::new();
    cx.inject(&mut outbound).unwrap();

    // The callee will adopt our span id as its parent span id.
    assert_eq!(
        Extractor::get(&outbound, "x-b3-traceid"),
        Some("0000000000abc123")
    );
    assert_eq!(
        Extractor::get(&outbound, "x-b3-spanid"),
        Some(server_span_id.to_string().as_str())
    );
    assert_eq!(Extractor::get(&outbound, "x-b3-sampled"), Some("1"));
    assert_eq!(Extractor::get(&outbound, "x-b3-flags"), Some("1"));
}

#[test]
fn nested_child_span_wraps_a_downstream_call() {
    let exporter = InMemorySpanExporter::new();
    let mut cx = new_context(&exporter);
    let inbound: HashMap<String, String> = HashMap::new();
    cx.start("GET /users", &inbound, vec![]).unwrap();
    let server_span_id = cx.server_span_id().unwrap();

    // Business logic opens a child span around a downstream call; the
    // outbound headers now carry the child's id.
    let trace = cx.trace_mut().unwrap();
    let child_id = trace
        .create_span(SpanBuilder::new("GET downstream /orders"))
        .unwrap();
    trace
        .record(vec![Annotation::new("cs")], vec![])
        .unwrap();

    let mut outbound: HashMap<String, String> = HashMap::new();
    cx.inject(&mut outbound).unwrap();
    assert_eq!(
        Extractor::get(&outbound, "x-b3-spanid"),
        Some(child_id.to_string().as_str())
    );

    let child = cx.trace_mut().unwrap().finish_span().unwrap();
    assert_eq!(child.parent_span_id(), Some(server_span_id));
    cx.finish(vec![]).unwrap();

    // Only the server span went through the context's export path; the
    // child was handed back to the caller.
    let spans = exporter.get_finished_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].span_id(), server_span_id);
}

#[test]
fn malformed_inbound_id_degrades_without_failing_the_request() {
    let exporter = InMemorySpanExporter::new();
    let mut cx = new_context(&exporter);
    let inbound = headers(&[("x-b3-traceid", "zz-not-an-id")]);

    // The host integration's catch-log-degrade-continue path.
    if let Err(error) = cx.start("GET /users", &inbound, vec![]) {
        cx.degrade(&error);
    }
    assert!(cx.trace().is_none());
    assert!(exporter.get_finished_spans().is_empty());
}

#[test]
fn debug_flag_zero_suppresses_export_but_spans_still_record() {
    let exporter = InMemorySpanExporter::new();
    let mut cx = new_context(&exporter);
    let inbound = headers(&[("x-b3-flags", "0")]);

    cx.start(
        "GET /users",
        &inbound,
        vec![BinaryAnnotation::string(tags::SERVER_URI, "/users")],
    )
    .unwrap();
    let recorded = cx.trace().unwrap().current_span().unwrap();
    assert_eq!(recorded.annotations().len(), 1);
    assert_eq!(recorded.binary_annotations().len(), 1);

    cx.finish(vec![]).unwrap();
    assert!(exporter.get_finished_spans().is_empty());
}
