//! Error types shared between the engine and host runtime implementations.

use crate::runtime::ComponentId;

/// Errors raised by the mediation engine or by host collaborator calls.
///
/// Construction-time configuration errors are fatal. Connector deploy and
/// retract failures are caught per label pair during `execute`, logged, and
/// do not abort the remaining pairs of the round.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MediationError {
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("component `{component}` has no knowledge for field `{field}`")]
    MissingKnowledge {
        component: ComponentId,
        field: String,
    },

    #[error("deployment of connector `{name}` failed: {reason}")]
    ConnectorDeploy { name: String, reason: String },

    #[error("retraction of connector `{name}` failed: {reason}")]
    ConnectorRetract { name: String, reason: String },

    #[error("port registration on component `{component}` failed: {reason}")]
    PortRegistration { component: String, reason: String },

    #[error("host runtime error: {0}")]
    Host(String),
}
