//! Carrier traits for reading and writing propagation headers.
//!
//! Propagators move trace identity between processes through whatever
//! carries the request — an HTTP header map, a message envelope. The
//! carrier is abstracted behind [`Extractor`] (inbound) and [`Injector`]
//! (outbound) so the core never depends on a particular framework's header
//! type. `HashMap<String, String>` implementations are provided for tests
//! and simple hosts.

use std::collections::HashMap;

pub mod b3;

/// Injector provides an interface for adding fields to an underlying
/// struct like `HashMap`.
pub trait Injector {
    /// Add a key and value to the underlying data.
    fn set(&mut self, key: &str, value: String);
}

/// Extractor provides an interface for reading fields from an underlying
/// struct like `HashMap`.
pub trait Extractor {
    /// Get a value for a key from the underlying data.
    fn get(&self, key: &str) -> Option<&str>;

    /// Collect all the keys from the underlying data.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the HashMap.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_lowercase(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    /// Get a value for a key from the HashMap.
    fn get(&self, key: &str) -> Option<&str> {
        self.get(&key.to_lowercase()).map(|v| v.as_str())
    }

    /// Collect all the keys from the HashMap.
    fn keys(&self) -> Vec<&str> {
        self.keys().map(|k| k.as_str()).collect()
    }
}
