use crate::core::endpoint::Endpoint;
use crate::time;
use serde::Serialize;
use std::fmt;

/// The value of an [`Annotation`]: one of the fixed server-side lifecycle
/// events, or a freeform event name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnnotationValue {
    /// The server received the request ("sr" on the wire).
    ServerRecv,
    /// The server sent the response ("ss" on the wire).
    ServerSend,
    /// An arbitrary named event.
    Custom(String),
}

impl AnnotationValue {
    /// The wire form of this event name.
    pub fn as_str(&self) -> &str {
        match self {
            AnnotationValue::ServerRecv => "sr",
            AnnotationValue::ServerSend => "ss",
            AnnotationValue::Custom(value) => value,
        }
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AnnotationValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A timestamped named event within a span.
///
/// Created at the moment the event occurs and appended to the span's
/// annotation list; never mutated after append. The endpoint is left empty
/// by the factories and stamped by the owning [`Trace`] at record time.
///
/// [`Trace`]: crate::core::trace::Trace
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    value: AnnotationValue,
    timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<Endpoint>,
}

impl Annotation {
    /// An annotation for an arbitrary named event, stamped with the current
    /// time.
    pub fn new(value: impl Into<String>) -> Self {
        Annotation {
            value: AnnotationValue::Custom(value.into()),
            timestamp: time::now_micros(),
            endpoint: None,
        }
    }

    /// The "sr" (server receive) lifecycle annotation, stamped now.
    pub fn server_recv() -> Self {
        Annotation {
            value: AnnotationValue::ServerRecv,
            timestamp: time::now_micros(),
            endpoint: None,
        }
    }

    /// The "ss" (server send) lifecycle annotation, stamped now.
    pub fn server_send() -> Self {
        Annotation {
            value: AnnotationValue::ServerSend,
            timestamp: time::now_micros(),
            endpoint: None,
        }
    }

    /// The event name.
    pub fn value(&self) -> &AnnotationValue {
        &self.value
    }

    /// Microseconds since the Unix epoch at which the event occurred.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The endpoint that recorded the event, if already stamped.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub(crate) fn set_endpoint_if_absent(&mut self, endpoint: &Endpoint) {
        if self.endpoint.is_none() {
            self.endpoint = Some(endpoint.clone());
        }
    }
}

/// A typed tag value.
///
/// The original type is preserved through serialization — a JSON number
/// stays a number and a boolean stays a boolean — which trace-visualization
/// tools rely on for filtering and display.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    /// A boolean tag.
    Bool(bool),
    /// A signed integer tag.
    I64(i64),
    /// A floating point tag.
    F64(f64),
    /// A string tag.
    String(String),
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::I64(value)
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        TagValue::F64(value)
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::String(value)
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::String(value.to_owned())
    }
}

/// A typed key/value tag attached to a span.
///
/// Duplicate keys are allowed and preserved in order — a later tag does not
/// overwrite an earlier one with the same key. Immutable after append.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryAnnotation {
    key: String,
    value: TagValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<Endpoint>,
}

impl BinaryAnnotation {
    /// Create a tag from a key and any supported value type.
    pub fn new(key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        BinaryAnnotation {
            key: key.into(),
            value: value.into(),
            endpoint: None,
        }
    }

    /// A string-valued tag.
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        BinaryAnnotation::new(key, TagValue::String(value.into()))
    }

    /// A boolean-valued tag.
    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        BinaryAnnotation::new(key, value)
    }

    /// An integer-valued tag.
    pub fn i64(key: impl Into<String>, value: i64) -> Self {
        BinaryAnnotation::new(key, value)
    }

    /// A floating-point tag.
    pub fn f64(key: impl Into<String>, value: f64) -> Self {
        BinaryAnnotation::new(key, value)
    }

    /// The tag key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The tag value.
    pub fn value(&self) -> &TagValue {
        &self.value
    }

    /// The endpoint that recorded the tag, if already stamped.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub(crate) fn set_endpoint_if_absent(&mut self, endpoint: &Endpoint) {
        if self.endpoint.is_none() {
            self.endpoint = Some(endpoint.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_factories_use_wire_names() {
        assert_eq!(Annotation::server_recv().value().as_str(), "sr");
        assert_eq!(Annotation::server_send().value().as_str(), "ss");
        assert_eq!(Annotation::new("cache miss").value().as_str(), "cache miss");
    }

    #[test]
    fn factories_stamp_the_current_time() {
        let before = crate::time::now_micros();
        let annotation = Annotation::server_recv();
        let after = crate::time::now_micros();
        assert!(annotation.timestamp() >= before);
        assert!(annotation.timestamp() <= after);
    }

    #[test]
    fn tag_values_keep_their_json_type() {
        assert_eq!(
            serde_json::to_string(&BinaryAnnotation::i64("status", 200)).unwrap(),
            "{\"key\":\"status\",\"value\":200}"
        );
        assert_eq!(
            serde_json::to_string(&BinaryAnnotation::bool("cached", true)).unwrap(),
            "{\"key\":\"cached\",\"value\":true}"
        );
        assert_eq!(
            serde_json::to_string(&BinaryAnnotation::string("uri", "/users")).unwrap(),
            "{\"key\":\"uri\",\"value\":\"/users\"}"
        );
    }

    #[test]
    fn annotation_serializes_event_name() {
        let mut annotation = Annotation::server_recv();
        annotation.set_endpoint_if_absent(&crate::Endpoint::new(
            "users",
            std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            0,
        ));
        let json = serde_json::to_value(&annotation).unwrap();
        assert_eq!(json["value"], "sr");
        assert_eq!(json["endpoint"]["serviceName"], "users");
    }
}
