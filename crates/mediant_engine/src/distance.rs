//! Distance and classification of aligned knowledge quadruples.
//!
//! For every component pair holding both labels, the recorded series are
//! aligned slot by slot; each fully-operational quadruple yields one
//! distance sample: the filter-knowledge distance between the two components
//! and the similarity class of their subject knowledge. Samples are pooled
//! across every eligible component pair. The domain metric itself comes from
//! the host's [`KnowledgeMetadata`] provider.

use std::fmt::Write as _;

use tracing::debug;

use mediant_common::{
    ComponentId, ComponentPair, DistanceSample, KnowledgeMetadata, LabelPair,
};

use crate::align::TimeSlotAligner;
use crate::history::KnowledgeHistory;

/// Pool distance samples for one label pair across all eligible component
/// pairs. Pairs without a common time slot contribute nothing; that is a
/// normal outcome for sparse telemetry and is only logged.
pub fn compute_distances(
    history: &KnowledgeHistory,
    metadata: &dyn KnowledgeMetadata,
    labels: &LabelPair,
    slot_duration: u64,
    dump_values: bool,
) -> Vec<DistanceSample> {
    let components = history.components_with_labels(labels);
    let mut samples = Vec::new();

    for pair in component_pairs(&components) {
        let quadruples = align_pair(history, &pair, labels, slot_duration);
        if quadruples.is_empty() {
            debug!("correlation for {pair}{{{labels}}} skipped: no common time slot");
            continue;
        }
        for quadruple in quadruples {
            // Non-operational quadruples cannot evidence correlation.
            if !quadruple.operational() {
                continue;
            }
            let distance = metadata.distance(
                &labels.filter,
                &quadruple.c1_filter.value,
                &quadruple.c2_filter.value,
            );
            let class = metadata.classify_distance(
                &labels.subject,
                &quadruple.c1_subject.value,
                &quadruple.c2_subject.value,
            );
            samples.push(DistanceSample {
                distance,
                class,
                timestamp: quadruple.c1_filter.timestamp,
            });
        }
    }

    if dump_values {
        debug!("computed distances for {labels}\n{}", samples_table(&samples));
    }

    samples
}

fn align_pair(
    history: &KnowledgeHistory,
    pair: &ComponentPair,
    labels: &LabelPair,
    slot_duration: u64,
) -> Vec<crate::align::KnowledgeQuadruple> {
    let series = |component: &ComponentId, label: &str| {
        history
            .field_series(component, label)
            .map(<[_]>::to_vec)
            .unwrap_or_default()
    };
    TimeSlotAligner::new(
        slot_duration,
        series(&pair.first, &labels.filter),
        series(&pair.first, &labels.subject),
        series(&pair.second, &labels.filter),
        series(&pair.second, &labels.subject),
    )
    .collect_all()
}

fn component_pairs(components: &[ComponentId]) -> Vec<ComponentPair> {
    let mut pairs = Vec::new();
    for i in 0..components.len() {
        for j in i + 1..components.len() {
            pairs.push(ComponentPair::new(
                components[i].clone(),
                components[j].clone(),
            ));
        }
    }
    pairs
}

/// Tabular dump of distance samples, one row per dimension.
pub fn samples_table(samples: &[DistanceSample]) -> String {
    let mut out = String::new();
    let times: Vec<String> = samples.iter().map(|s| s.timestamp.to_string()).collect();
    let distances: Vec<String> = samples.iter().map(|s| format!("{:.1}", s.distance)).collect();
    let classes: Vec<&str> = samples.iter().map(|s| s.class.as_str()).collect();
    let _ = writeln!(out, "time: {}", times.join(", "));
    let _ = writeln!(out, "distance: {}", distances.join(", "));
    let _ = writeln!(out, "class: {}", classes.join(", "));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediant_common::{DistanceClass, KnowledgeWrapper};
    use serde_json::{json, Value};

    /// Numeric metric: distance is |a - b| on the filter label, Close iff
    /// the subject values differ by at most 1.0.
    struct NumericMetadata;

    impl KnowledgeMetadata for NumericMetadata {
        fn distance(&self, _label: &str, a: &Value, b: &Value) -> f64 {
            (a.as_f64().unwrap_or(f64::NAN) - b.as_f64().unwrap_or(f64::NAN)).abs()
        }

        fn classify_distance(&self, label: &str, a: &Value, b: &Value) -> DistanceClass {
            if self.distance(label, a, b) <= 1.0 {
                DistanceClass::Close
            } else {
                DistanceClass::Far
            }
        }

        fn confidence_level(&self, _label: &str) -> f64 {
            0.66
        }
    }

    fn record(
        history: &mut KnowledgeHistory,
        component: &str,
        field: &str,
        timestamp: u64,
        value: f64,
    ) {
        history.record(
            &ComponentId::new(component),
            KnowledgeWrapper::new(field, json!(value), timestamp),
        );
    }

    #[test]
    fn samples_pool_across_aligned_slots() {
        let mut history = KnowledgeHistory::new(64);
        for (slot, (pos_a, pos_b, temp_a, temp_b)) in
            [(0u64, (0.0, 1.0, 20.0, 20.5)), (1, (0.0, 5.0, 20.0, 25.0))]
        {
            let t = slot * 1000 + 100;
            record(&mut history, "A", "pos", t, pos_a);
            record(&mut history, "A", "temp", t, temp_a);
            record(&mut history, "B", "pos", t, pos_b);
            record(&mut history, "B", "temp", t, temp_b);
        }

        let labels = LabelPair::new("pos", "temp");
        let samples = compute_distances(&history, &NumericMetadata, &labels, 1000, false);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].class, DistanceClass::Close);
        assert_eq!(samples[1].class, DistanceClass::Far);
    }

    #[test]
    fn non_operational_quadruples_are_discarded() {
        let mut history = KnowledgeHistory::new(64);
        record(&mut history, "A", "pos", 100, 0.0);
        record(&mut history, "A", "temp", 100, 20.0);
        record(&mut history, "B", "pos", 100, 1.0);
        let mut faulty = KnowledgeWrapper::new("temp", json!(20.5), 100);
        faulty.fault();
        history.record(&ComponentId::new("B"), faulty);

        let labels = LabelPair::new("pos", "temp");
        let samples = compute_distances(&history, &NumericMetadata, &labels, 1000, false);
        assert!(samples.is_empty());
    }

    #[test]
    fn pair_without_common_slot_contributes_nothing() {
        let mut history = KnowledgeHistory::new(64);
        record(&mut history, "A", "pos", 100, 0.0);
        record(&mut history, "A", "temp", 100, 20.0);
        record(&mut history, "B", "pos", 5100, 1.0);
        record(&mut history, "B", "temp", 5100, 20.5);

        let labels = LabelPair::new("pos", "temp");
        let samples = compute_distances(&history, &NumericMetadata, &labels, 1000, false);
        assert!(samples.is_empty());
    }

    #[test]
    fn components_missing_a_label_are_excluded() {
        let mut history = KnowledgeHistory::new(64);
        record(&mut history, "A", "pos", 100, 0.0);
        record(&mut history, "A", "temp", 100, 20.0);
        record(&mut history, "B", "pos", 100, 1.0);
        record(&mut history, "B", "temp", 100, 20.5);
        // C publishes only pos; it must not form pairs for (pos, temp).
        record(&mut history, "C", "pos", 100, 0.5);

        let labels = LabelPair::new("pos", "temp");
        let samples = compute_distances(&history, &NumericMetadata, &labels, 1000, false);
        assert_eq!(samples.len(), 1);
    }
}
