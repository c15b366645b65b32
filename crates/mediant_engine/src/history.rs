//! Time-ordered knowledge history of all known components.
//!
//! Grows by append during `monitor`. The aligner consumes entries from its
//! working copies as it pairs them up (see [`crate::align`]); the store
//! itself additionally clamps every field series to a configured maximum so
//! that histories stay bounded even when `plan` runs rarely relative to
//! `monitor`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use mediant_common::{ComponentId, ComponentPair, KnowledgeWrapper, LabelPair};

/// Per-component, per-field history of knowledge values, each series in
/// ascending timestamp order.
pub struct KnowledgeHistory {
    entries: BTreeMap<ComponentId, BTreeMap<String, Vec<KnowledgeWrapper>>>,
    max_per_field: usize,
}

impl KnowledgeHistory {
    pub fn new(max_per_field: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_per_field,
        }
    }

    /// Append a knowledge value to the producing component's field series.
    ///
    /// The series stays sorted by timestamp even if values arrive out of
    /// order, and is clamped to the most recent `max_per_field` entries.
    pub fn record(&mut self, component: &ComponentId, field: KnowledgeWrapper) {
        let series = self
            .entries
            .entry(component.clone())
            .or_default()
            .entry(field.name.clone())
            .or_default();
        let at = series.partition_point(|w| w.timestamp <= field.timestamp);
        series.insert(at, field);
        if series.len() > self.max_per_field {
            let excess = series.len() - self.max_per_field;
            series.drain(..excess);
        }
    }

    /// The recorded series for one component field.
    pub fn field_series(&self, component: &ComponentId, field: &str) -> Option<&[KnowledgeWrapper]> {
        self.entries
            .get(component)?
            .get(field)
            .map(Vec::as_slice)
    }

    /// All unordered pairs of distinct components with recorded history.
    pub fn component_pairs(&self) -> Vec<ComponentPair> {
        let ids: Vec<&ComponentId> = self.entries.keys().collect();
        let mut pairs = Vec::new();
        for i in 0..ids.len() {
            for j in i + 1..ids.len() {
                pairs.push(ComponentPair::new(ids[i].clone(), ids[j].clone()));
            }
        }
        pairs
    }

    /// Every ordered pair of distinct labels that co-occurs in the recorded
    /// history of at least one component pair. Both directions of each
    /// qualifying pair are returned, since filter and subject roles differ.
    pub fn label_pairs(&self) -> BTreeSet<LabelPair> {
        let mut pairs = BTreeSet::new();
        for component_pair in self.component_pairs() {
            let (Some(first), Some(second)) = (
                self.entries.get(&component_pair.first),
                self.entries.get(&component_pair.second),
            ) else {
                continue;
            };
            for label1 in first.keys() {
                for label2 in first.keys() {
                    if label1 == label2 {
                        continue;
                    }
                    if second.contains_key(label1) && second.contains_key(label2) {
                        pairs.insert(LabelPair::new(label1.clone(), label2.clone()));
                    }
                }
            }
        }
        pairs
    }

    /// Components whose history holds both labels of the given pair.
    pub fn components_with_labels(&self, labels: &LabelPair) -> Vec<ComponentId> {
        self.entries
            .iter()
            .filter(|(_, fields)| {
                fields.contains_key(&labels.filter) && fields.contains_key(&labels.subject)
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Free-text dump of the whole history table, for diagnostics.
    pub fn dump(&self) -> String {
        let mut out = String::from("Knowledge history:\n");
        for (id, fields) in &self.entries {
            let _ = writeln!(out, "Component {id}");
            for (field, series) in fields {
                let times: Vec<String> =
                    series.iter().map(|w| w.timestamp.to_string()).collect();
                let values: Vec<String> = series.iter().map(|w| w.value.to_string()).collect();
                let _ = writeln!(out, "\t{field}:");
                let _ = writeln!(out, "\ttime: {}", times.join(", "));
                let _ = writeln!(out, "\tvalues: {}", values.join(", "));
            }
        }
        out
    }
}
