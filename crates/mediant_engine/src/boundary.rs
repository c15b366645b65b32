//! Confidence-bounded distance boundary: solver and per-label-pair cache.
//!
//! With the samples sorted ascending by distance, the running ratio of Close
//! samples at each prefix approximates "probability the subject values are
//! close, given filter distance at most this threshold". The solver picks
//! the largest distance whose prefix ratio still meets the configured
//! confidence level; that is the widest radius for which mediation remains
//! justified. `NaN` means no radius qualifies.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use mediant_common::{DistanceClass, DistanceSample, LabelPair};

/// Solve for the mediation boundary of one label pair.
///
/// Sorts `samples` ascending by distance in place, then scans from the
/// largest distance downward for the largest index whose prefix correlation
/// `close_cnt / i` meets `confidence`. Returns `NaN` when no index
/// qualifies.
///
/// The ratio at index 0 is degenerate (`close_cnt / 0`); it is treated as
/// undefined evidence and excluded from the scan, so a single sample can
/// never establish a boundary.
pub fn solve_boundary(samples: &mut Vec<DistanceSample>, confidence: f64) -> f64 {
    samples.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let mut correlations = vec![f64::NAN; samples.len()];
    let mut close_cnt = 0usize;
    for (i, sample) in samples.iter().enumerate() {
        if sample.class == DistanceClass::Close {
            close_cnt += 1;
        }
        if i > 0 {
            correlations[i] = close_cnt as f64 / i as f64;
        }
    }

    for i in (0..samples.len()).rev() {
        // NaN prefixes (index 0) never satisfy the comparison.
        if correlations[i] >= confidence {
            return samples[i].distance;
        }
    }
    f64::NAN
}

/// The cached boundary of one label pair, with a dirty flag tracking whether
/// it changed since the connector lifecycle last acted on it.
#[derive(Debug, Clone)]
pub struct BoundaryValue {
    value: f64,
    changed: bool,
}

impl BoundaryValue {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            changed: true,
        }
    }

    /// Overwrite the boundary. The dirty flag is raised only when the new
    /// value materially differs; NaN replacing NaN counts as unchanged.
    pub fn set(&mut self, value: f64) {
        let unchanged =
            (self.value.is_nan() && value.is_nan()) || self.value == value;
        if !unchanged {
            self.changed = true;
        }
        self.value = value;
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// A boundary is valid when some distance threshold satisfied the
    /// confidence level; NaN marks "correlation too weak to mediate".
    pub fn is_valid(&self) -> bool {
        !self.value.is_nan()
    }

    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Mark the current value as acted upon, so identical plan outcomes do
    /// not cause redundant redeployment.
    pub fn consume(&mut self) {
        self.changed = false;
    }
}

/// Boundary values keyed by label pair.
#[derive(Default)]
pub struct BoundaryCache {
    bounds: BTreeMap<LabelPair, BoundaryValue>,
}

impl BoundaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the boundary for a label pair. Fresh entries
    /// start with the dirty flag raised.
    pub fn update(&mut self, labels: LabelPair, value: f64) {
        match self.bounds.get_mut(&labels) {
            Some(holder) => holder.set(value),
            None => {
                self.bounds.insert(labels, BoundaryValue::new(value));
            }
        }
    }

    pub fn get(&self, labels: &LabelPair) -> Option<&BoundaryValue> {
        self.bounds.get(labels)
    }

    pub fn get_mut(&mut self, labels: &LabelPair) -> Option<&mut BoundaryValue> {
        self.bounds.get_mut(labels)
    }

    /// Label pairs whose subject label equals the given field name.
    pub fn pairs_with_subject(&self, subject: &str) -> Vec<LabelPair> {
        self.bounds
            .keys()
            .filter(|labels| labels.subject == subject)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Free-text dump of the boundary table, for diagnostics.
    pub fn dump(&self) -> String {
        let mut out = String::from("Correlation boundaries:\n");
        for (labels, holder) in &self.bounds {
            let _ = writeln!(out, "{labels} : {:.2}", holder.value());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(distance: f64, class: DistanceClass) -> DistanceSample {
        DistanceSample {
            distance,
            class,
            timestamp: 0,
        }
    }

    #[test]
    fn boundary_is_one_of_the_sample_distances() {
        let mut samples = vec![
            sample(4.0, DistanceClass::Close),
            sample(2.0, DistanceClass::Close),
            sample(8.0, DistanceClass::Far),
            sample(6.0, DistanceClass::Close),
        ];
        let boundary = solve_boundary(&mut samples, 0.7);
        assert!(samples.iter().any(|s| s.distance == boundary));
    }

    #[test]
    fn all_close_yields_maximum_distance() {
        let mut samples = vec![
            sample(1.0, DistanceClass::Close),
            sample(5.0, DistanceClass::Close),
            sample(9.0, DistanceClass::Close),
        ];
        let boundary = solve_boundary(&mut samples, 1.0);
        assert_relative_eq!(boundary, 9.0);
    }

    #[test]
    fn all_far_yields_nan() {
        let mut samples = vec![
            sample(1.0, DistanceClass::Far),
            sample(5.0, DistanceClass::Far),
            sample(9.0, DistanceClass::Far),
        ];
        assert!(solve_boundary(&mut samples, 0.01).is_nan());
    }

    #[test]
    fn empty_samples_yield_nan() {
        assert!(solve_boundary(&mut Vec::new(), 0.5).is_nan());
    }

    /// A single sample only produces the degenerate index-0 ratio, which is
    /// undefined evidence; the boundary must stay NaN even for a Close
    /// sample and a minimal confidence level.
    #[test]
    fn single_sample_is_no_evidence() {
        let mut samples = vec![sample(1.0, DistanceClass::Close)];
        assert!(solve_boundary(&mut samples, 0.01).is_nan());
    }

    /// Three slots with distances [1, 5, 9], classes [Close, Close, Far],
    /// confidence 0.66: scanning from the end, index 2 has close_cnt = 2 and
    /// ratio 2/2 = 1.0 >= 0.66, so the boundary is 9.0.
    #[test]
    fn reference_scenario_boundary_is_nine() {
        let mut samples = vec![
            sample(1.0, DistanceClass::Close),
            sample(5.0, DistanceClass::Close),
            sample(9.0, DistanceClass::Far),
        ];
        let boundary = solve_boundary(&mut samples, 0.66);
        assert_relative_eq!(boundary, 9.0);
    }

    #[test]
    fn unsorted_input_is_sorted_before_the_scan() {
        let mut samples = vec![
            sample(9.0, DistanceClass::Far),
            sample(1.0, DistanceClass::Close),
            sample(5.0, DistanceClass::Close),
        ];
        let boundary = solve_boundary(&mut samples, 0.66);
        assert_relative_eq!(boundary, 9.0);
        assert_relative_eq!(samples[0].distance, 1.0);
    }

    #[test]
    fn fresh_cache_entry_is_marked_changed() {
        let mut cache = BoundaryCache::new();
        cache.update(LabelPair::new("pos", "temp"), 9.0);
        let holder = cache.get(&LabelPair::new("pos", "temp")).unwrap();
        assert!(holder.has_changed());
        assert!(holder.is_valid());
    }

    #[test]
    fn identical_update_after_consume_stays_unchanged() {
        let labels = LabelPair::new("pos", "temp");
        let mut cache = BoundaryCache::new();
        cache.update(labels.clone(), 9.0);
        cache.get_mut(&labels).unwrap().consume();

        cache.update(labels.clone(), 9.0);
        assert!(!cache.get(&labels).unwrap().has_changed());
    }

    #[test]
    fn nan_replacing_nan_is_unchanged() {
        let labels = LabelPair::new("pos", "temp");
        let mut cache = BoundaryCache::new();
        cache.update(labels.clone(), f64::NAN);
        cache.get_mut(&labels).unwrap().consume();

        cache.update(labels.clone(), f64::NAN);
        assert!(!cache.get(&labels).unwrap().has_changed());
    }

    #[test]
    fn material_change_raises_the_flag() {
        let labels = LabelPair::new("pos", "temp");
        let mut cache = BoundaryCache::new();
        cache.update(labels.clone(), 9.0);
        cache.get_mut(&labels).unwrap().consume();

        cache.update(labels.clone(), 5.0);
        assert!(cache.get(&labels).unwrap().has_changed());

        cache.get_mut(&labels).unwrap().consume();
        cache.update(labels.clone(), f64::NAN);
        assert!(cache.get(&labels).unwrap().has_changed());
    }

    #[test]
    fn pairs_with_subject_filters_by_second_label() {
        let mut cache = BoundaryCache::new();
        cache.update(LabelPair::new("pos", "temp"), 9.0);
        cache.update(LabelPair::new("temp", "pos"), 3.0);
        cache.update(LabelPair::new("humidity", "temp"), f64::NAN);

        let pairs = cache.pairs_with_subject("temp");
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.subject == "temp"));
    }
}
