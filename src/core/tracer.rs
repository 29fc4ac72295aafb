use std::fmt;

/// An inbound (or defaulted) sampling decision.
///
/// The core does not implement probabilistic sampling; it carries the
/// decision through for the exporter. Non-boolean values such as a float
/// ratio keep the literal header text they arrived with, so re-injection
/// passes them through byte-for-byte (`"1.0"` stays `"1.0"`, `"0.50"`
/// stays `"0.50"`).
#[derive(Clone, Debug, PartialEq)]
pub enum Sampled {
    /// Sample this trace ("1"/"true" on the wire).
    Always,
    /// Do not sample this trace ("0"/"false" on the wire).
    Never,
    /// A sampling ratio supplied by the caller, carried through verbatim.
    Ratio {
        /// The parsed ratio.
        value: f64,
        /// The literal header text, re-emitted unchanged on inject.
        raw: String,
    },
}

impl Sampled {
    /// A ratio decision built locally rather than parsed from a header.
    pub fn ratio(value: f64) -> Self {
        Sampled::Ratio {
            raw: value.to_string(),
            value,
        }
    }

    /// Parse an `X-B3-Sampled` header value. Unrecognized values yield
    /// `None` and are treated as absent by the propagator.
    pub fn from_header(value: &str) -> Option<Self> {
        match value {
            "1" | "true" => Some(Sampled::Always),
            "0" | "false" => Some(Sampled::Never),
            other => other.parse::<f64>().ok().map(|parsed| Sampled::Ratio {
                value: parsed,
                raw: other.to_owned(),
            }),
        }
    }

    /// Whether the decision keeps the trace.
    pub fn is_sampled(&self) -> bool {
        match self {
            Sampled::Always => true,
            Sampled::Never => false,
            Sampled::Ratio { value, .. } => *value > 0.0,
        }
    }
}

impl Default for Sampled {
    fn default() -> Self {
        Sampled::Always
    }
}

impl fmt::Display for Sampled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sampled::Always => f.write_str("1"),
            Sampled::Never => f.write_str("0"),
            Sampled::Ratio { raw, .. } => f.write_str(raw),
        }
    }
}

/// Per-trace flags gating whether spans are exported.
///
/// `debug = false` suppresses export but not recording, so the span stack
/// keeps behaving identically whether or not anything leaves the process.
/// [`set_debug`] doubles as the kill switch the host integration flips when
/// the tracing subsystem itself errors.
///
/// [`set_debug`]: Tracer::set_debug
#[derive(Clone, Debug, PartialEq)]
pub struct Tracer {
    debug: bool,
    sampled: Sampled,
}

impl Tracer {
    /// Create a tracer with explicit flags.
    pub fn new(sampled: Sampled, debug: bool) -> Self {
        Tracer { debug, sampled }
    }

    /// Whether finished spans should be exported.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Flip the export gate. Recording continues either way.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// The sampling decision carried by this trace.
    pub fn sampled(&self) -> &Sampled {
        &self.sampled
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Tracer {
            debug: true,
            sampled: Sampled::default(),
        }
    }
}
