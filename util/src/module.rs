//! Cyclic module interface
//!
//! The exec drives every cyclic module the same way: `init` once from a params file with the
//! session open, then `proc` once per 20 ms cycle with that cycle's inputs. `TrackCtrl` is the
//! current implementor.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// A module run by the exec's main loop.
pub trait State {
    /// Passed to `init`, typically the name of the module's params file.
    type InitData;
    type InitError;

    /// Everything the module reads in one cycle, for example a detection batch.
    type InputData;
    /// Demands produced for the rest of the exec.
    type OutputData;
    /// Per-cycle flags and values which go to telemetry but drive nothing.
    type StatusReport;
    type ProcError;

    /// Load parameters and open any archives under `session`.
    ///
    /// Called once before the main loop. A failure here is fatal to the exec.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one cycle.
    ///
    /// An `Err` is logged by the exec and the cycle's outputs are left at their stop defaults, so
    /// implementors should return `Ok` with safe outputs for conditions expected in normal
    /// running, such as no target in view.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
