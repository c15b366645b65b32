//! The correlation manager: MAPE orchestration of the mediation engine.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use mediant_common::{
    ComponentId, ComponentManager, ConnectorManager, CorrelationConfig, KnowledgeMetadata,
    MediationError,
};

use crate::boundary::{solve_boundary, BoundaryCache};
use crate::connectors::ConnectorLifecycle;
use crate::distance::{compute_distances, samples_table};
use crate::failures::FailureTracker;
use crate::history::KnowledgeHistory;
use crate::mape::{Inspectable, MapeAdaptation};

/// Correlation-based adaptation strategy.
///
/// One round: `monitor` records every component's current knowledge into the
/// history; `analyze` gates the round on unhandled knowledge failures;
/// `plan` recomputes the distance boundary of every co-occurring label pair;
/// `execute` drives the connector lifecycle for every faulty field and
/// marks the round's failures handled.
pub struct CorrelationManager {
    config: CorrelationConfig,
    components: Rc<dyn ComponentManager>,
    metadata: Rc<dyn KnowledgeMetadata>,
    history: KnowledgeHistory,
    boundaries: BoundaryCache,
    failures: FailureTracker,
    lifecycle: ConnectorLifecycle,
    /// Failures found by `analyze`, consumed by `execute` in the same round.
    pending_failures: BTreeMap<ComponentId, BTreeSet<String>>,
}

impl CorrelationManager {
    /// Create an engine instance bound to its host collaborators.
    ///
    /// An invalid configuration is a fatal construction error and is not
    /// retried.
    pub fn new(
        config: CorrelationConfig,
        components: Rc<dyn ComponentManager>,
        connector_manager: Rc<dyn ConnectorManager>,
        metadata: Rc<dyn KnowledgeMetadata>,
    ) -> Result<Self, MediationError> {
        config.validate().map_err(MediationError::InvalidConfig)?;
        Ok(Self {
            history: KnowledgeHistory::new(config.max_history_per_field),
            boundaries: BoundaryCache::new(),
            failures: FailureTracker::new(),
            lifecycle: ConnectorLifecycle::new(connector_manager, Rc::clone(&metadata)),
            config,
            components,
            metadata,
            pending_failures: BTreeMap::new(),
        })
    }

    /// Toggle per-phase progress logging.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.config.verbose = verbose;
    }

    /// Toggle history and distance table dumps.
    pub fn set_dump_values(&mut self, dump_values: bool) {
        self.config.dump_values = dump_values;
    }

    /// Access to the boundary cache, for diagnostics and tests.
    pub fn boundaries(&self) -> &BoundaryCache {
        &self.boundaries
    }

    /// Access to the connector lifecycle state, for diagnostics and tests.
    pub fn lifecycle(&self) -> &ConnectorLifecycle {
        &self.lifecycle
    }
}

impl MapeAdaptation for CorrelationManager {
    fn monitor(&mut self) {
        for component in self.components.components() {
            let id = component.id();
            for (_, wrapper) in component.knowledge() {
                self.history.record(&id, wrapper);
            }
        }
    }

    fn analyze(&mut self) -> bool {
        let components = self.components.components();
        self.pending_failures = self.failures.detect_new_failures(&components);
        if self.pending_failures.is_empty() {
            debug!("no unhandled knowledge failures; skipping correlation round");
            return false;
        }
        true
    }

    fn plan(&mut self) {
        if self.config.verbose {
            info!("correlation process started");
        }

        for labels in self.history.label_pairs() {
            let mut samples = compute_distances(
                &self.history,
                self.metadata.as_ref(),
                &labels,
                self.config.time_slot_duration,
                self.config.dump_values,
            );
            let confidence = self.metadata.confidence_level(&labels.subject);
            let boundary = solve_boundary(&mut samples, confidence);
            if self.config.dump_values {
                debug!("sorted distances for {labels}\n{}", samples_table(&samples));
            }
            if self.config.verbose {
                info!("{labels}: boundary {boundary}");
            }
            self.boundaries.update(labels, boundary);
        }
    }

    fn execute(&mut self) {
        if self.config.verbose {
            info!("connector lifecycle management started");
        }

        let components = self.components.components();
        let pending = std::mem::take(&mut self.pending_failures);

        for (component_id, fields) in &pending {
            let Some(component) = components.iter().find(|c| &c.id() == component_id) else {
                warn!("faulty component {component_id} disappeared before execute");
                continue;
            };
            for field in fields {
                for labels in self.boundaries.pairs_with_subject(field) {
                    let Some(holder) = self.boundaries.get_mut(&labels) else {
                        continue;
                    };
                    // A failure on one label pair must not abort the rest.
                    match self.lifecycle.apply(&labels, holder, component, &components) {
                        Ok(action) => {
                            debug!("{labels} for {component_id}: {action:?}");
                        }
                        Err(e) => {
                            error!("mediation of {labels} for {component_id} failed: {e}");
                        }
                    }
                }
            }
        }

        self.failures.mark_handled(&pending);
    }

    fn as_inspectable(&self) -> Option<&dyn Inspectable> {
        if self.config.dump_values {
            Some(self)
        } else {
            None
        }
    }
}

impl Inspectable for CorrelationManager {
    fn dump_diagnostics(&self) -> String {
        format!("{}\n{}", self.history.dump(), self.boundaries.dump())
    }
}
