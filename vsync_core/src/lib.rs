#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Online vsync timing model (hardware-agnostic).
//!
//! Given a noisy stream of observed display vsync timestamps and a nominal
//! display period, this crate predicts the wall-clock time of the next
//! vsync at or after a requested reference time, answers phase-alignment
//! queries for divided frame rates, and adapts to variable-refresh-rate
//! displays constrained only by a minimum inter-frame interval.
//!
//! ## Architecture
//!
//! - **History**: bounded FIFO ring of recent timestamps with phase and
//!   near-duplicate filtering at ingest (`history` module)
//! - **Regression**: integer least-squares fit with data-derived ordinals
//!   and a residual outlier pass (`regression` module)
//! - **Model**: (slope, intercept) plus the trust state machine (`model`)
//! - **Prediction**: grid evaluation, render-rate division, VRR snapping
//!   (`predictor`, `rate`, `vrr` modules)
//! - **Modes**: display-mode descriptors and the per-mode fit cache
//!   (`mode`, `predictor`)
//!
//! ## Arithmetic
//!
//! Everything is integer nanoseconds (`i64`), with 128-bit intermediates
//! in the least-squares accumulators and the oldest retained timestamp
//! subtracted as a bias, so precision holds for decade-long uptimes.

pub mod error;
pub mod mode;
pub mod model;
pub mod predictor;
pub mod time;
pub mod util;

mod history;
mod rate;
mod regression;
mod vrr;

pub use error::{BuildError, RejectReason, Result};
pub use mode::{DisplayMode, DisplayModeId, Resolution, VrrConfig};
pub use model::{Model, ModelState};
pub use predictor::{Missing, PredictorDump, Set, VrrDump, VsyncPredictor, VsyncPredictorBuilder};
pub use time::Nsecs;

// Construction-time tunables live in their own crate; re-exported so most
// callers need only this one.
pub use vsync_config::Tunables;
