//! Mediant Common - Shared domain model for the knowledge mediation engine
//!
//! Holds the knowledge value wrapper, the pair key types, the collaborator
//! traits implemented by the hosting component runtime, the per-engine
//! configuration, and the error types. No algorithms live here; the
//! correlation engine proper is in `mediant_engine`.

pub mod config;
pub mod error;
pub mod knowledge;
pub mod pairs;
pub mod runtime;

pub use config::CorrelationConfig;
pub use error::MediationError;
pub use knowledge::{DistanceClass, DistanceSample, KnowledgeWrapper};
pub use pairs::{ComponentPair, LabelPair};
pub use runtime::{
    AdmissionPredicate, Component, ComponentId, ComponentManager, ConnectorManager,
    DynamicConnector, KnowledgeMetadata, MediatedKnowledge, PortKind,
};
