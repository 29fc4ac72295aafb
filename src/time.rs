use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as microseconds since the Unix epoch, the resolution Zipkin
/// timestamps use on the wire.
pub(crate) fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
