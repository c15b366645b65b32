//! Time-slot alignment of four independently-timestamped knowledge series.
//!
//! Timestamps are discretized into slots of the configured duration
//! (`slot(t) = t / duration`). The aligner scans the first component's
//! filter series in order and, for each value's slot, looks for the earliest
//! value in the same slot in the other three series. When all four exist it
//! emits the quadruple and consumes every entry at or below the emitted slot
//! from all four series, so the same or older data can never feed a later
//! alignment.

use mediant_common::KnowledgeWrapper;

/// The four values of one aligned time slot:
/// `(c1@filter, c1@subject, c2@filter, c2@subject)`.
#[derive(Debug, Clone)]
pub struct KnowledgeQuadruple {
    pub c1_filter: KnowledgeWrapper,
    pub c1_subject: KnowledgeWrapper,
    pub c2_filter: KnowledgeWrapper,
    pub c2_subject: KnowledgeWrapper,
    pub slot: u64,
}

impl KnowledgeQuadruple {
    /// Whether all four wrapped values were produced by working sensors.
    pub fn operational(&self) -> bool {
        self.c1_filter.operational
            && self.c1_subject.operational
            && self.c2_filter.operational
            && self.c2_subject.operational
    }
}

/// Sliding-window aligner over working copies of four knowledge series, each
/// sorted ascending by timestamp.
pub struct TimeSlotAligner {
    slot_duration: u64,
    c1_filter: Vec<KnowledgeWrapper>,
    c1_subject: Vec<KnowledgeWrapper>,
    c2_filter: Vec<KnowledgeWrapper>,
    c2_subject: Vec<KnowledgeWrapper>,
}

impl TimeSlotAligner {
    pub fn new(
        slot_duration: u64,
        c1_filter: Vec<KnowledgeWrapper>,
        c1_subject: Vec<KnowledgeWrapper>,
        c2_filter: Vec<KnowledgeWrapper>,
        c2_subject: Vec<KnowledgeWrapper>,
    ) -> Self {
        Self {
            slot_duration,
            c1_filter,
            c1_subject,
            c2_filter,
            c2_subject,
        }
    }

    /// Emit the quadruple of the smallest common time slot still present,
    /// consuming that slot and everything older from all four series.
    /// Returns `None` once no common slot remains.
    pub fn next_quadruple(&mut self) -> Option<KnowledgeQuadruple> {
        let duration = self.slot_duration;
        let mut found = None;
        for c1_filter in &self.c1_filter {
            let slot = c1_filter.slot(duration);
            let c1_subject = earliest_in_slot(&self.c1_subject, slot, duration);
            let c2_filter = earliest_in_slot(&self.c2_filter, slot, duration);
            let c2_subject = earliest_in_slot(&self.c2_subject, slot, duration);
            if let (Some(c1_subject), Some(c2_filter), Some(c2_subject)) =
                (c1_subject, c2_filter, c2_subject)
            {
                found = Some(KnowledgeQuadruple {
                    c1_filter: c1_filter.clone(),
                    c1_subject: c1_subject.clone(),
                    c2_filter: c2_filter.clone(),
                    c2_subject: c2_subject.clone(),
                    slot,
                });
                break;
            }
        }

        let quadruple = found?;
        let slot = quadruple.slot;
        for series in [
            &mut self.c1_filter,
            &mut self.c1_subject,
            &mut self.c2_filter,
            &mut self.c2_subject,
        ] {
            series.retain(|w| w.slot(duration) > slot);
        }
        Some(quadruple)
    }

    /// Drain every alignable quadruple. Finite: each emission strictly
    /// consumes at least one slot from the first filter series.
    pub fn collect_all(mut self) -> Vec<KnowledgeQuadruple> {
        let mut quadruples = Vec::new();
        while let Some(q) = self.next_quadruple() {
            quadruples.push(q);
        }
        quadruples
    }
}

/// The value with the smallest timestamp inside the given slot, if any.
/// Ties break by source timestamp, not insertion order.
fn earliest_in_slot(
    values: &[KnowledgeWrapper],
    slot: u64,
    duration: u64,
) -> Option<&KnowledgeWrapper> {
    let mut earliest: Option<&KnowledgeWrapper> = None;
    for value in values {
        if value.slot(duration) == slot
            && earliest.map_or(true, |e| e.timestamp > value.timestamp)
        {
            earliest = Some(value);
        }
    }
    earliest
}
