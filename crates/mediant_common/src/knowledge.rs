//! Knowledge value wrapper and distance sample types.
//!
//! Components publish knowledge fields as [`KnowledgeWrapper`] values: the
//! raw field value plus the metadata the correlation engine needs (field
//! name, timestamp, operational flag). The engine never mutates the value or
//! the timestamp; it only observes the operational flag.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A knowledge field value together with its correlation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeWrapper {
    /// The raw field value. Heterogeneous across fields; the domain metric
    /// provider is the only party that interprets it.
    pub value: Value,
    /// The name of the wrapped knowledge field.
    pub name: String,
    /// When the value was obtained, in host time units.
    pub timestamp: u64,
    /// Whether the sensor that produced the value was working.
    pub operational: bool,
}

impl KnowledgeWrapper {
    /// Wrap a field value. New wrappers start operational.
    pub fn new(name: impl Into<String>, value: Value, timestamp: u64) -> Self {
        Self {
            value,
            name: name.into(),
            timestamp,
            operational: true,
        }
    }

    /// Mark the producing sensor as malfunctioned.
    pub fn fault(&mut self) {
        self.operational = false;
    }

    /// The discrete time slot this value falls into.
    pub fn slot(&self, slot_duration: u64) -> u64 {
        self.timestamp / slot_duration
    }
}

impl fmt::Display for KnowledgeWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}:{}:{}:{})",
            self.name,
            self.value,
            self.timestamp,
            if self.operational { "o" } else { "f" }
        )
    }
}

/// Coarse classification of how similar two subject values are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceClass {
    Close,
    Far,
}

impl DistanceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Close => "Close",
            Self::Far => "Far",
        }
    }
}

/// One correlation evidence point: the filter-knowledge distance between two
/// components and the class of their subject knowledge, taken from a single
/// aligned time slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceSample {
    pub distance: f64,
    pub class: DistanceClass,
    /// Timestamp of the first component's filter value. Diagnostic only.
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrapper_starts_operational() {
        let w = KnowledgeWrapper::new("temp", json!(21.5), 1500);
        assert!(w.operational);
        assert_eq!(w.name, "temp");
        assert_eq!(w.timestamp, 1500);
    }

    #[test]
    fn fault_flips_operational_only() {
        let mut w = KnowledgeWrapper::new("temp", json!(21.5), 1500);
        w.fault();
        assert!(!w.operational);
        assert_eq!(w.value, json!(21.5));
        assert_eq!(w.timestamp, 1500);
    }

    #[test]
    fn slot_is_integer_division() {
        let w = KnowledgeWrapper::new("pos", json!([0, 0]), 2999);
        assert_eq!(w.slot(1000), 2);
        assert_eq!(w.slot(3000), 0);
    }

    #[test]
    fn display_marks_faulty_values() {
        let mut w = KnowledgeWrapper::new("temp", json!(7), 42);
        assert_eq!(w.to_string(), "(temp:7:42:o)");
        w.fault();
        assert_eq!(w.to_string(), "(temp:7:42:f)");
    }
}
