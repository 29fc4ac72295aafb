//! # Zipkin tracing instrumentation core
//!
//! This crate implements the request-side core of a Zipkin-style tracer: a
//! trace/span data model, the [B3 header] propagation contract, and the span
//! lifecycle (create → annotate → finalize → export).
//!
//! The crate deliberately stops at the export boundary. Wire encoding and
//! transport of finished spans to a collector, as well as the hosting
//! framework's request pipeline, are external collaborators: finished spans
//! are handed to a [`SpanExporter`] implementation and forgotten.
//!
//! ## Getting started
//!
//! One [`TracingContext`] is created per inbound request and carried through
//! the request explicitly — there is no process-global "current span".
//!
//! ```
//! use std::collections::HashMap;
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::sync::Arc;
//! use zipkin_core::{
//!     BinaryAnnotation, Endpoint, InMemorySpanExporter, TracingContext,
//! };
//!
//! # fn main() -> Result<(), zipkin_core::TraceError> {
//! let exporter = InMemorySpanExporter::default();
//! let endpoint = Endpoint::new("user-service", IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);
//!
//! // Inbound request headers; absent B3 headers start a fresh trace.
//! let headers: HashMap<String, String> = HashMap::new();
//!
//! let mut cx = TracingContext::builder()
//!     .endpoint(endpoint)
//!     .exporter(Arc::new(exporter.clone()))
//!     .build();
//! cx.start(
//!     "GET /users",
//!     &headers,
//!     vec![BinaryAnnotation::string("server.uri", "/users")],
//! )?;
//!
//! // ... handle the request; `cx.inject` supplies headers for downstream calls ...
//!
//! cx.finish(vec![BinaryAnnotation::i64(
//!     "server.response.http_status_code",
//!     200,
//! )])?;
//!
//! assert_eq!(exporter.get_finished_spans().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! [B3 header]: https://github.com/openzipkin/b3-propagation
//! [`SpanExporter`]: crate::export::SpanExporter
//! [`TracingContext`]: crate::context::TracingContext

#![warn(missing_docs, unreachable_pub, missing_debug_implementations)]

pub mod context;
pub mod core;
mod error;
pub mod export;
pub mod propagation;
pub mod tags;
mod time;

pub use self::context::{TracingContext, TracingContextBuilder};
pub use self::core::annotation::{Annotation, AnnotationValue, BinaryAnnotation, TagValue};
pub use self::core::endpoint::Endpoint;
pub use self::core::identifier::Identifier;
pub use self::core::span::Span;
pub use self::core::trace::{SpanBuilder, Trace, TraceBuilder};
pub use self::core::tracer::{Sampled, Tracer};
pub use self::error::{TraceError, TraceResult};
pub use self::export::{InMemorySpanExporter, SpanData, SpanExporter};
pub use self::propagation::b3::{B3Context, Propagator};
pub use self::propagation::{Extractor, Injector};
