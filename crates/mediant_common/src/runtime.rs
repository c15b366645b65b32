//! Collaborator contracts of the hosting component runtime.
//!
//! The correlation engine does not own components, connectors, or the domain
//! distance metric. The host runtime implements these traits and hands the
//! engine shared handles at construction time. All traits take `&self`; host
//! implementations use interior mutability where they need it (the engine is
//! single-threaded by contract, see `mediant_engine`).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MediationError;
use crate::knowledge::{DistanceClass, KnowledgeWrapper};

/// Opaque component identity. Equality and hashing are by value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which end of a mediation channel a port serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortKind {
    Consumer,
    Producer,
}

/// A component of the hosted system, as seen by the engine.
pub trait Component {
    fn id(&self) -> ComponentId;

    /// Current knowledge of the component, keyed by field name.
    fn knowledge(&self) -> BTreeMap<String, KnowledgeWrapper>;

    /// Names of the knowledge fields currently flagged non-operational.
    fn faulty_knowledge(&self) -> BTreeSet<String>;

    /// Request a mediation port for the given fields on this component.
    fn add_port(&self, fields: &[String], kind: PortKind) -> Result<(), MediationError>;
}

/// Enumerates the components of the hosted system.
pub trait ComponentManager {
    fn components(&self) -> Vec<Rc<dyn Component>>;
}

/// The knowledge a connector mediates between components: the filter label
/// measures component-to-component distance, the subject label is the
/// knowledge being substituted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MediatedKnowledge {
    pub filter: String,
    pub subject: String,
}

impl MediatedKnowledge {
    pub fn new(filter: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            subject: subject.into(),
        }
    }

    /// Connector identification name for this mediated knowledge.
    pub fn name(&self) -> String {
        format!("{}_{}", self.filter, self.subject)
    }
}

impl fmt::Display for MediatedKnowledge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.filter, self.subject)
    }
}

/// Admission predicate of a connector: decides from a candidate component's
/// current knowledge whether it may join the mediation channel.
pub type AdmissionPredicate = Box<dyn Fn(&BTreeMap<String, Value>) -> bool>;

/// A deployed mediation channel.
pub trait DynamicConnector {
    fn name(&self) -> String;

    fn add_port(&self, fields: &[String], kind: PortKind) -> Result<(), MediationError>;
}

/// Owns connector deployment and retraction in the host runtime.
pub trait ConnectorManager {
    fn connectors(&self) -> Vec<Rc<dyn DynamicConnector>>;

    fn add_connector(
        &self,
        filter: AdmissionPredicate,
        mediated_knowledge: MediatedKnowledge,
    ) -> Result<Rc<dyn DynamicConnector>, MediationError>;

    /// Remove the connector with the given name. Returns whether a connector
    /// was actually present; absence is not an error.
    fn remove_connector(&self, name: &str) -> Result<bool, MediationError>;
}

/// Domain-specific knowledge metadata: distance metrics, distance
/// classification, and the confidence level required per subject label.
pub trait KnowledgeMetadata {
    /// Numeric distance between two values of the field named by `label`.
    fn distance(&self, label: &str, a: &Value, b: &Value) -> f64;

    /// Coarse similarity class of two values of the field named by `label`.
    fn classify_distance(&self, label: &str, a: &Value, b: &Value) -> DistanceClass;

    /// Minimum fraction of Close outcomes required to trust a distance
    /// radius as a mediation boundary for the given subject label.
    fn confidence_level(&self, label: &str) -> f64;
}
