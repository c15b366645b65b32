//! Detection and de-duplication of component knowledge failures.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use mediant_common::{Component, ComponentId};

/// Tracks which failing fields have already been handled by a previous
/// adaptation round, so repeated ticks do not re-trigger connector creation
/// for the same fault.
#[derive(Default)]
pub struct FailureTracker {
    handled: BTreeMap<ComponentId, BTreeSet<String>>,
}

impl FailureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Components whose currently-faulty field set is non-empty and not
    /// already fully contained in the handled set for that component.
    pub fn detect_new_failures(
        &self,
        components: &[Rc<dyn Component>],
    ) -> BTreeMap<ComponentId, BTreeSet<String>> {
        let mut failures = BTreeMap::new();
        for component in components {
            let faulty = component.faulty_knowledge();
            if faulty.is_empty() {
                continue;
            }
            let already_handled = self
                .handled
                .get(&component.id())
                .is_some_and(|handled| faulty.is_subset(handled));
            if !already_handled {
                failures.insert(component.id(), faulty);
            }
        }
        failures
    }

    /// Merge a round's handled failures. Called after `execute` completes.
    pub fn mark_handled(&mut self, failures: &BTreeMap<ComponentId, BTreeSet<String>>) {
        for (component, fields) in failures {
            self.handled
                .entry(component.clone())
                .or_default()
                .extend(fields.iter().cloned());
        }
    }
}
