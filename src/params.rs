//! Outbound call parameters.
//!
//! [`CallParams`] holds the logical parameters of one API call in
//! sorted key order, which makes logging and fingerprinting
//! deterministic. The API credential is never stored here — the
//! transport appends it at send time — so any log of a parameter set is
//! redacted by construction.

use std::collections::BTreeMap;
use std::fmt;

/// Sorted key/value parameter set for one outbound API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallParams {
    pairs: BTreeMap<String, String>,
}

impl CallParams {
    /// Start a parameter set for the given engine.
    pub fn new(engine: &str) -> Self {
        let mut pairs = BTreeMap::new();
        pairs.insert("engine".to_string(), engine.to_string());
        Self { pairs }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.pairs.insert(key.to_string(), value.into());
        self
    }

    /// Look up one parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    /// The engine this call targets.
    pub fn engine(&self) -> &str {
        self.get("engine").unwrap_or("")
    }

    /// Iterate parameters in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the set is empty (never true for a constructed set).
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for CallParams {
    /// Renders `key=value` pairs joined by `&`, in sorted key order.
    /// Safe to log: the credential is not part of the set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                f.write_str("&")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}
