//! Build errors and sample-rejection reasons for the prediction engine.
//!
//! The hot path never returns errors: bad samples are reported as a `false`
//! accept and model trouble degrades to the synthetic cadence. Only
//! construction can fail.
use thiserror::Error;

/// Why a vsync timestamp was not admitted into the sample history.
/// Diagnostic only; callers observe rejection as `add_vsync_timestamp ->
/// false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Off the period grid relative to the newest retained sample.
    OutOfPhase,
    /// Within the tolerance band of an already-retained sample.
    NearDuplicate,
    /// The sample was admitted but the resulting fit was implausible and
    /// the history was flushed.
    UntrustedFit,
    /// The sample was admitted but the history collapsed onto a single
    /// ordinal, so no line can be fit.
    DegenerateFit,
}

impl core::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RejectReason::OutOfPhase => write!(f, "out of phase"),
            RejectReason::NearDuplicate => write!(f, "near duplicate"),
            RejectReason::UntrustedFit => write!(f, "untrusted fit"),
            RejectReason::DegenerateFit => write!(f, "degenerate fit"),
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing display mode")]
    MissingMode,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
