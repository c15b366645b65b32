//! Mediant Engine - Correlation-driven knowledge mediation
//!
//! Infers statistical correlation between knowledge values produced by
//! independent components and, when a component's sensor fails, deploys a
//! mediation connector that substitutes the failed reading with a value from
//! a correlated component.
//!
//! The engine is one adaptation strategy behind the generic
//! [`MapeAdaptation`] trait. An external scheduler ticks one adaptation
//! round at a time (`monitor` -> `analyze` -> `plan` -> `execute`); the
//! engine is strictly single-threaded and must not be invoked concurrently
//! with itself. All internal state is exclusively owned by the engine
//! instance and mutated only within a round.

pub mod align;
pub mod boundary;
pub mod connectors;
pub mod distance;
pub mod failures;
pub mod history;
pub mod manager;
pub mod mape;

pub use boundary::{solve_boundary, BoundaryCache, BoundaryValue};
pub use connectors::{ConnectorAction, ConnectorLifecycle};
pub use failures::FailureTracker;
pub use history::KnowledgeHistory;
pub use manager::CorrelationManager;
pub use mape::{AdaptationLoop, Inspectable, MapeAdaptation};
