//! The MAPE adaptation contract and the loop driver that ticks it.

use tracing::debug;

/// One Monitor-Analyze-Plan-Execute adaptation strategy.
///
/// The phases are invoked strictly in order each round. `plan` and `execute`
/// are skipped entirely when `analyze` returns false; no other phase may be
/// skipped.
pub trait MapeAdaptation {
    /// Observe the current state of the hosted system.
    fn monitor(&mut self);

    /// Decide whether this round needs planning. Returns true iff the
    /// adaptation is applicable.
    fn analyze(&mut self) -> bool;

    /// Compute the adaptation decisions.
    fn plan(&mut self);

    /// Apply the planned decisions to the hosted system.
    fn execute(&mut self);

    /// Optional diagnostics capability. Strategies that can dump their
    /// internal state implement [`Inspectable`] and surface it here; the
    /// loop driver queries the capability instead of inspecting the
    /// concrete strategy type.
    fn as_inspectable(&self) -> Option<&dyn Inspectable> {
        None
    }
}

/// Capability of dumping human-readable internal diagnostics.
pub trait Inspectable {
    fn dump_diagnostics(&self) -> String;
}

/// Drives the MAPE loop of every registered adaptation strategy. One call to
/// [`reason`](Self::reason) is one adaptation round.
#[derive(Default)]
pub struct AdaptationLoop {
    adaptations: Vec<Box<dyn MapeAdaptation>>,
}

impl AdaptationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adaptation: Box<dyn MapeAdaptation>) {
        self.adaptations.push(adaptation);
    }

    /// Run one round of every registered adaptation.
    pub fn reason(&mut self) {
        for adaptation in &mut self.adaptations {
            adaptation.monitor();
            let applicable = adaptation.analyze();
            if applicable {
                adaptation.plan();
                adaptation.execute();
            }
            if let Some(inspectable) = adaptation.as_inspectable() {
                debug!("{}", inspectable.dump_diagnostics());
            }
        }
    }
}
