use crate::error::{TraceError, TraceResult};
use rand::{rngs, Rng, SeedableRng};
use serde::{Serialize, Serializer};
use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;

/// A 64-bit trace, span, or parent-span identifier.
///
/// The canonical string form is lowercase hex, zero-padded to 16 characters,
/// which is also the B3 header encoding. Parsing accepts any 1–16 character
/// lowercase hex string — B3 senders routinely omit leading zeros — and
/// falls back to an unsigned decimal rendering for values too long to be
/// hex; everything else fails with [`TraceError::InvalidIdentifier`].
///
/// String form and parsing round-trip: `parse(id.to_string()) == id`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(u64);

impl Identifier {
    /// Construct an identifier from its numeric value.
    pub const fn from_u64(value: u64) -> Self {
        Identifier(value)
    }

    /// Generate a fresh identifier from 64 random bits, avoiding zero.
    ///
    /// Zero is reserved as "absent" by most trace wire formats, so the
    /// generator re-rolls until it produces a non-zero value.
    pub fn random() -> Self {
        CURRENT_RNG.with(|rng| {
            let mut rng = rng.borrow_mut();
            loop {
                let value = rng.gen::<u64>();
                if value != 0 {
                    return Identifier(value);
                }
            }
        })
    }

    /// Parse an identifier from an inbound header value.
    ///
    /// Hex is tried first: B3 ids are hex on the wire and senders routinely
    /// omit leading zeros, so any 1–16 character lowercase hex string is
    /// accepted. Values that cannot be hex (longer than 16 digits) are
    /// parsed as unsigned decimal for interop with callers that send
    /// numeric ids.
    pub fn from_header(value: &str) -> TraceResult<Self> {
        if !value.is_empty()
            && value.len() <= 16
            && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return u64::from_str_radix(value, 16)
                .map(Identifier)
                .map_err(|_| TraceError::InvalidIdentifier(value.to_owned()));
        }
        value
            .parse::<u64>()
            .map(Identifier)
            .map_err(|_| TraceError::InvalidIdentifier(value.to_owned()))
    }

    /// Return the numeric value of this identifier.
    pub const fn to_u64(self) -> u64 {
        self.0
    }
}

impl FromStr for Identifier {
    type Err = TraceError;

    fn from_str(s: &str) -> TraceResult<Self> {
        Identifier::from_header(s)
    }
}

impl From<u64> for Identifier {
    fn from(value: u64) -> Self {
        Identifier(value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

thread_local! {
    /// Store random number generator for each thread
    static CURRENT_RNG: RefCell<rngs::SmallRng> = RefCell::new(rngs::SmallRng::from_entropy());
}
