//! Lifecycle of the mediation connectors driven by boundary state.
//!
//! For a label pair whose subject matches a faulty field, the cached
//! boundary decides the action: an invalid (NaN) boundary retracts the
//! connector, a changed valid boundary (re)deploys it with a fresh admission
//! predicate and mediation ports, and a valid unchanged boundary is the
//! steady state and costs nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tracing::{debug, info};

use mediant_common::{
    AdmissionPredicate, Component, ComponentId, ConnectorManager, KnowledgeMetadata, LabelPair,
    MediatedKnowledge, MediationError, PortKind,
};

use crate::boundary::BoundaryValue;

/// The outcome of one lifecycle decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorAction {
    Deployed,
    Retracted,
    Unchanged,
}

/// Deploys, updates and retracts mediation connectors through the host's
/// [`ConnectorManager`], remembering which components were granted ports for
/// each active connector.
pub struct ConnectorLifecycle {
    connector_manager: Rc<dyn ConnectorManager>,
    metadata: Rc<dyn KnowledgeMetadata>,
    /// Components granted ports, per active connector name.
    active: BTreeMap<String, BTreeSet<ComponentId>>,
}

impl ConnectorLifecycle {
    pub fn new(
        connector_manager: Rc<dyn ConnectorManager>,
        metadata: Rc<dyn KnowledgeMetadata>,
    ) -> Self {
        Self {
            connector_manager,
            metadata,
            active: BTreeMap::new(),
        }
    }

    /// Apply the boundary state of one label pair for one faulty component.
    ///
    /// `components` is the full set of known components; on deployment every
    /// one of them is granted consumer and producer ports for the mediated
    /// fields, so any of them can stand in for the failed sensor.
    pub fn apply(
        &mut self,
        labels: &LabelPair,
        boundary: &mut BoundaryValue,
        faulty_component: &Rc<dyn Component>,
        components: &[Rc<dyn Component>],
    ) -> Result<ConnectorAction, MediationError> {
        let mediated = MediatedKnowledge::new(labels.filter.clone(), labels.subject.clone());
        let name = mediated.name();

        if !boundary.is_valid() {
            let removed = self.connector_manager.remove_connector(&name)?;
            self.active.remove(&name);
            if removed {
                info!("retracted connector {name}: correlation no longer reliable");
                return Ok(ConnectorAction::Retracted);
            }
            debug!("connector {name} already absent");
            return Ok(ConnectorAction::Unchanged);
        }

        if !boundary.has_changed() {
            debug!("connector {name} left as-is: boundary unchanged");
            return Ok(ConnectorAction::Unchanged);
        }

        // Redeploy with the new boundary: drop any stale instance first.
        self.connector_manager.remove_connector(&name)?;

        let predicate = self.admission_predicate(labels, boundary.value(), faulty_component)?;
        let connector = self.connector_manager.add_connector(predicate, mediated)?;

        let fields = vec![labels.filter.clone(), labels.subject.clone()];
        connector.add_port(&fields, PortKind::Consumer)?;
        connector.add_port(&fields, PortKind::Producer)?;

        let mut granted = BTreeSet::new();
        for component in components {
            component.add_port(&fields, PortKind::Consumer)?;
            component.add_port(&fields, PortKind::Producer)?;
            granted.insert(component.id());
        }
        self.active.insert(name.clone(), granted);

        boundary.consume();
        info!(
            "deployed connector {name} with boundary {:.2}",
            boundary.value()
        );
        Ok(ConnectorAction::Deployed)
    }

    /// Admission predicate for a counterpart component: it qualifies when
    /// its filter knowledge lies strictly within the boundary of the faulty
    /// component's filter knowledge.
    fn admission_predicate(
        &self,
        labels: &LabelPair,
        boundary: f64,
        faulty_component: &Rc<dyn Component>,
    ) -> Result<AdmissionPredicate, MediationError> {
        let local_filter = faulty_component
            .knowledge()
            .get(&labels.filter)
            .map(|w| w.value.clone())
            .ok_or_else(|| MediationError::MissingKnowledge {
                component: faulty_component.id(),
                field: labels.filter.clone(),
            })?;

        let metadata = Rc::clone(&self.metadata);
        let filter_label = labels.filter.clone();
        Ok(Box::new(move |candidate| {
            candidate
                .get(&filter_label)
                .map(|value| metadata.distance(&filter_label, value, &local_filter) < boundary)
                .unwrap_or(false)
        }))
    }

    /// Component ids granted ports for the given connector name, if active.
    pub fn granted_components(&self, name: &str) -> Option<&BTreeSet<ComponentId>> {
        self.active.get(name)
    }
}
