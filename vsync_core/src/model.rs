//! The linear timing model and its trust state.

use crate::time::Nsecs;

/// Coefficients of the fit `time(k) = anchor + k * slope + intercept` over
/// sample ordinals. `slope` approximates the true hardware period;
/// `intercept` absorbs the phase offset of the fit relative to the anchor
/// (the oldest retained sample).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Model {
    pub slope: Nsecs,
    pub intercept: Nsecs,
}

impl Model {
    /// The synthetic fallback: the nominal cadence with zero phase offset.
    pub const fn ideal(period: Nsecs) -> Self {
        Self {
            slope: period,
            intercept: 0,
        }
    }
}

/// Per-mode estimator state.
///
/// `Fresh -> Warming` on the first sample, `-> Locked` once a plausible fit
/// exists, `-> Untrusted` when a refit falls outside the tolerance band,
/// and back to `Warming` after a reset or flush. Predictions use the
/// synthetic model in every state but `Locked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// No sample has ever been observed for this mode.
    Fresh,
    /// Samples are accumulating; not enough for a trusted fit.
    Warming,
    /// A trusted regression is live.
    Locked,
    /// The most recent fit fell outside the tolerance band.
    Untrusted,
}

impl ModelState {
    pub fn is_locked(self) -> bool {
        matches!(self, ModelState::Locked)
    }
}
