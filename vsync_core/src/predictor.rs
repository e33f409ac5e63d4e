//! The vsync predictor: an online timing model over observed vsync
//! timestamps.
//!
//! One object, one mutex. Samples go in through `add_vsync_timestamp`,
//! predictions come out of `next_anticipated_vsync_time_from`; frame
//! begin/miss events are pushed in for VRR modes. The predictor owns no
//! threads, performs no I/O and never panics on bad input.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use vsync_config::Tunables;

use crate::error::{BuildError, RejectReason, Result};
use crate::history::SampleRing;
use crate::mode::{DisplayMode, DisplayModeId};
use crate::model::{Model, ModelState};
use crate::rate::divisor_for;
use crate::regression::{FitOutcome, fit_model};
use crate::time::Nsecs;
use crate::util::{div_ceil, div_floor, round_up_to_multiple};
use crate::vrr::VrrTimeline;

/// Cached fits are kept for this many distinct modes; the oldest key is
/// evicted beyond that.
const MODE_CACHE_LIMIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FitEntry {
    model: Model,
    trusted: bool,
}

impl FitEntry {
    fn ideal(period: Nsecs) -> Self {
        Self {
            model: Model::ideal(period),
            trusted: false,
        }
    }
}

/// Diagnostic snapshot of the predictor. Exposes the last fit and the ring
/// contents; intended for bug reports and dumpsys-style output, not for
/// driving decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorDump {
    pub mode_id: DisplayModeId,
    pub nominal_period_ns: Nsecs,
    pub state: ModelState,
    pub model: Model,
    pub samples: Vec<Nsecs>,
    pub known_timestamp: Option<Nsecs>,
    pub render_period_ns: Option<Nsecs>,
    pub last_rejection: Option<RejectReason>,
    pub vrr: Option<VrrDump>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VrrDump {
    pub min_frame_interval_ns: Nsecs,
    pub last_committed_vsync: Option<Nsecs>,
    pub pipeline_anchor: Option<Nsecs>,
    pub missed_vsync: Option<Nsecs>,
}

struct TrackerState {
    tunables: Tunables,
    mode: DisplayMode,
    ring: SampleRing,
    /// Newest timestamp ever observed, retained across ring flushes so the
    /// synthetic model stays phase-locked to the last real vsync. Cleared
    /// on every accepted sample.
    known_timestamp: Option<Nsecs>,
    fits: BTreeMap<DisplayModeId, FitEntry>,
    state: ModelState,
    /// Requested render period; the divisor is recomputed on use so it
    /// tracks refits and mode changes.
    render_period: Option<Nsecs>,
    vrr: Option<VrrTimeline>,
    last_rejection: Option<RejectReason>,
}

impl TrackerState {
    fn new(mode: DisplayMode, tunables: Tunables) -> Self {
        let vrr = mode
            .vrr_config()
            .map(|c| VrrTimeline::new(c.min_frame_interval_ns));
        Self {
            ring: SampleRing::new(tunables.history_size),
            known_timestamp: None,
            fits: BTreeMap::new(),
            state: ModelState::Fresh,
            render_period: None,
            vrr,
            last_rejection: None,
            tunables,
            mode,
        }
    }

    fn period(&self) -> Nsecs {
        self.mode.nominal_period_ns()
    }

    fn tolerance(&self) -> u32 {
        self.tunables.outlier_tolerance_percent
    }

    fn entry(&self) -> FitEntry {
        self.fits
            .get(&self.mode.id())
            .copied()
            .unwrap_or_else(|| FitEntry::ideal(self.period()))
    }

    fn store_entry(&mut self, entry: FitEntry) {
        let id = self.mode.id();
        if !self.fits.contains_key(&id) && self.fits.len() == MODE_CACHE_LIMIT {
            self.fits.pop_first();
        }
        self.fits.insert(id, entry);
    }

    fn note_known(&mut self, ts: Nsecs) {
        let newest = self.ring.newest().unwrap_or(ts);
        let prior = self.known_timestamp.unwrap_or(ts);
        self.known_timestamp = Some(ts.max(newest).max(prior));
    }

    /// Flush the ring, keeping the newest timestamp as the synthetic
    /// anchor.
    fn flush_ring(&mut self) {
        if let Some(newest) = self.ring.newest() {
            self.note_known(newest);
        }
        self.ring.clear();
    }

    // ── Sample ingest ────────────────────────────────────────────────────

    fn add_vsync_timestamp(&mut self, ts: Nsecs) -> bool {
        match self.ring.admit(ts, self.period(), self.tolerance()) {
            Err(reason) => {
                self.last_rejection = Some(reason);
                if self.ring.len() < self.tunables.min_samples {
                    // Still learning: start over with the incongruent
                    // timestamp as the new synthetic anchor.
                    self.ring.push(ts);
                    self.flush_ring();
                    self.state = ModelState::Warming;
                } else {
                    // The fit stays live; the caller decides whether to
                    // reset.
                    self.note_known(ts);
                }
                tracing::trace!(ts, %reason, "vsync timestamp rejected");
                false
            }
            Ok(()) => {
                self.known_timestamp = None;
                self.ring.push(ts);
                if self.ring.len() < self.tunables.min_samples {
                    self.store_entry(FitEntry::ideal(self.period()));
                    self.state = ModelState::Warming;
                    return true;
                }
                self.refit(ts)
            }
        }
    }

    fn refit(&mut self, ts: Nsecs) -> bool {
        let current_slope = self.entry().model.slope;
        let samples = self.ring.to_vec();
        match fit_model(&samples, current_slope, self.period(), self.tolerance()) {
            FitOutcome::Fit(model) => {
                self.store_entry(FitEntry {
                    model,
                    trusted: true,
                });
                self.state = ModelState::Locked;
                tracing::trace!(
                    ts,
                    slope = model.slope,
                    intercept = model.intercept,
                    "prediction model updated"
                );
                true
            }
            FitOutcome::Degenerate => {
                self.store_entry(FitEntry::ideal(self.period()));
                self.flush_ring();
                self.state = ModelState::Untrusted;
                self.last_rejection = Some(RejectReason::DegenerateFit);
                tracing::debug!(ts, "degenerate sample history, falling back to synthetic");
                false
            }
            FitOutcome::OutOfBand { slope } => {
                self.store_entry(FitEntry::ideal(self.period()));
                self.flush_ring();
                self.state = ModelState::Untrusted;
                self.last_rejection = Some(RejectReason::UntrustedFit);
                tracing::debug!(
                    ts,
                    slope,
                    nominal = self.period(),
                    "fitted slope outside tolerance band, falling back to synthetic"
                );
                false
            }
        }
    }

    // ── Prediction ───────────────────────────────────────────────────────

    /// The evaluation grid: the live fit anchored at the oldest retained
    /// sample, or the ideal cadence anchored at the last known vsync (the
    /// monotonic origin before any vsync was ever observed).
    fn grid(&self) -> (Nsecs, Model) {
        match self.ring.oldest() {
            Some(oldest) => (oldest, self.entry().model),
            None => (
                self.known_timestamp.unwrap_or(0),
                Model::ideal(self.period()),
            ),
        }
    }

    /// Smallest grid ordinal whose time is at or after `reference`, via
    /// floor division plus an explicit correction: near-integer-boundary
    /// fits must never return a time in the past. A reference exactly on
    /// the grid yields the next point.
    fn next_on_grid(&self, reference: Nsecs) -> (Nsecs, Nsecs, Model) {
        let (anchor, model) = self.grid();
        let zero = anchor + model.intercept;
        let mut k = div_floor(reference - zero, model.slope) + 1;
        let mut prediction = anchor + k * model.slope + model.intercept;
        while prediction < reference {
            k += 1;
            prediction = anchor + k * model.slope + model.intercept;
        }
        (k, prediction, model)
    }

    /// Smallest (optionally divisor-aligned) grid point at or after `t`.
    fn snap_up(&self, t: Nsecs, anchor: Nsecs, model: Model, divisor: Nsecs) -> Nsecs {
        let zero = anchor + model.intercept;
        let mut k = div_ceil(t - zero, model.slope);
        if divisor > 1 {
            k = round_up_to_multiple(k, divisor);
        }
        anchor + k * model.slope + model.intercept
    }

    fn render_divisor(&self, slope: Nsecs) -> Nsecs {
        self.render_period
            .and_then(|p| divisor_for(p, slope))
            .unwrap_or(1)
    }

    fn next_anticipated_vsync_time_from(
        &self,
        reference: Nsecs,
        last_confirmed: Option<Nsecs>,
    ) -> Nsecs {
        if self.vrr.is_some() {
            return self.next_vrr_time_from(reference, last_confirmed);
        }
        let (k, prediction, model) = self.next_on_grid(reference);
        let divisor = self.render_divisor(model.slope);
        if divisor > 1 {
            let (anchor, _) = self.grid();
            let aligned = round_up_to_multiple(k, divisor);
            return anchor + aligned * model.slope + model.intercept;
        }
        prediction
    }

    /// VRR: the slope is a quantization grid, not a cadence. Predictions
    /// snap up to the grid subject to the minimum-interval floor, and while
    /// a frame is in flight, to the render cadence repeating from its
    /// commit time.
    fn next_vrr_time_from(&self, reference: Nsecs, last_confirmed: Option<Nsecs>) -> Nsecs {
        let Some(vrr) = &self.vrr else {
            return self.next_anticipated_vsync_time_from(reference, last_confirmed);
        };
        // A missed present invalidates every opportunity up to and
        // including itself.
        let reference = match vrr.missed() {
            Some(missed) if reference <= missed => missed,
            _ => reference,
        };
        let (k, raw, model) = self.next_on_grid(reference);
        let (anchor, _) = self.grid();
        let floor = vrr.min_interval_floor(last_confirmed);

        if let Some(committed_at) = vrr.pipeline_anchor() {
            let cadence = self.render_period.unwrap_or(model.slope);
            let lo = floor.map_or(raw, |f| f.max(raw));
            let beat = committed_at + div_ceil(lo - committed_at, cadence) * cadence;
            return self.snap_up(beat, anchor, model, 1);
        }

        let divisor = self.render_divisor(model.slope);
        let mut prediction = if divisor > 1 {
            anchor + round_up_to_multiple(k, divisor) * model.slope + model.intercept
        } else {
            raw
        };
        if let Some(floor) = floor
            && prediction < floor
        {
            prediction = self.snap_up(floor, anchor, model, divisor);
        }
        prediction
    }

    fn is_vsync_in_phase(&self, ts: Nsecs, divided_period: Nsecs) -> bool {
        let (anchor, model) = self.grid();
        let Some(divisor) = divisor_for(divided_period, model.slope) else {
            return false;
        };
        if divisor == 1 {
            return true;
        }
        let zero = anchor + model.intercept;
        let k = div_floor(ts - zero + model.slope / 2, model.slope);
        let nearest = anchor + k * model.slope + model.intercept;
        // a time exactly halfway between two vsyncs coincides with neither
        if (nearest - ts).abs() >= div_ceil(model.slope, 2) {
            return false;
        }
        k.rem_euclid(divisor) == 0
    }

    // ── Control surface ──────────────────────────────────────────────────

    fn set_display_mode(&mut self, mode: DisplayMode) {
        if mode.id() == self.mode.id() {
            return;
        }
        tracing::debug!(
            from = %self.mode.id(),
            to = %mode.id(),
            period = mode.nominal_period_ns(),
            "display mode changed"
        );
        self.flush_ring();
        self.vrr = mode
            .vrr_config()
            .map(|c| VrrTimeline::new(c.min_frame_interval_ns));
        self.mode = mode;
        let entry = self.entry();
        self.store_entry(entry);
        self.state = if entry.trusted {
            ModelState::Locked
        } else {
            ModelState::Fresh
        };
    }

    fn set_render_rate(&mut self, period: Nsecs) {
        let slope = self.entry().model.slope;
        if divisor_for(period, slope).is_some() {
            self.render_period = Some(period);
        } else {
            tracing::debug!(period, slope, "render rate is not a divisor, ignored");
            self.render_period = None;
        }
    }

    fn reset_model(&mut self) {
        tracing::debug!(mode = %self.mode.id(), "prediction model reset");
        self.store_entry(FitEntry::ideal(self.period()));
        self.flush_ring();
        self.state = ModelState::Warming;
    }

    fn dump(&self) -> PredictorDump {
        let entry = self.entry();
        PredictorDump {
            mode_id: self.mode.id(),
            nominal_period_ns: self.period(),
            state: self.state,
            model: entry.model,
            samples: self.ring.to_vec(),
            known_timestamp: self.known_timestamp,
            render_period_ns: self.render_period,
            last_rejection: self.last_rejection,
            vrr: self.vrr.as_ref().map(|v| VrrDump {
                min_frame_interval_ns: v.min_frame_interval(),
                last_committed_vsync: v.last_committed(),
                pipeline_anchor: v.pipeline_anchor(),
                missed_vsync: v.missed(),
            }),
        }
    }
}

/// Online vsync timing model.
///
/// All operations serialize on one internal non-recursive mutex; between
/// concurrent callers, outcomes are consistent with some sequential order.
pub struct VsyncPredictor {
    inner: Mutex<TrackerState>,
}

impl core::fmt::Debug for VsyncPredictor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = self.locked();
        f.debug_struct("VsyncPredictor")
            .field("mode", &s.mode.id())
            .field("state", &s.state)
            .field("samples", &s.ring.len())
            .finish()
    }
}

impl VsyncPredictor {
    /// Start building a predictor.
    pub fn builder() -> VsyncPredictorBuilder<Missing> {
        VsyncPredictorBuilder::default()
    }

    /// Build with explicit tunables.
    pub fn new(mode: DisplayMode, tunables: Tunables) -> Result<Self> {
        Self::builder()
            .with_mode(mode)
            .with_tunables(tunables)
            .build()
    }

    fn locked(&self) -> MutexGuard<'_, TrackerState> {
        // State mutations are single-assignment swaps, so a poisoned lock
        // still guards a coherent state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the active display mode. A mode with the same id is a
    /// no-op; otherwise sample history restarts and any previously fitted
    /// model for the incoming mode is reused until new samples replace it.
    pub fn set_display_mode(&self, mode: DisplayMode) {
        self.locked().set_display_mode(mode);
    }

    /// Request a render cadence. Non-integer multiples of the hardware
    /// cadence are ignored (and clear any previous divisor).
    pub fn set_render_rate(&self, period_ns: Nsecs) {
        self.locked().set_render_rate(period_ns);
    }

    /// Offer an observed vsync timestamp. Returns whether it was accepted;
    /// rejection signals that the model may need resetting.
    pub fn add_vsync_timestamp(&self, ts: Nsecs) -> bool {
        self.locked().add_vsync_timestamp(ts)
    }

    /// True while the active mode has no trusted fit.
    pub fn needs_more_samples(&self) -> bool {
        !self.locked().entry().trusted
    }

    /// The wall-clock time of the next vsync at or after `reference_ns`.
    /// For VRR modes, `last_confirmed_present_ns` tightens the
    /// minimum-interval constraint.
    pub fn next_anticipated_vsync_time_from(
        &self,
        reference_ns: Nsecs,
        last_confirmed_present_ns: Option<Nsecs>,
    ) -> Nsecs {
        self.locked()
            .next_anticipated_vsync_time_from(reference_ns, last_confirmed_present_ns)
    }

    /// Whether `ts_ns` lands on a hardware vsync that is on-beat for the
    /// given divided cadence. Non-divisor cadences are never in phase.
    pub fn is_vsync_in_phase(&self, ts_ns: Nsecs, divided_period_ns: Nsecs) -> bool {
        self.locked().is_vsync_in_phase(ts_ns, divided_period_ns)
    }

    /// The current prediction model (diagnostic).
    pub fn prediction_model(&self) -> Model {
        self.locked().entry().model
    }

    /// Drop the sample history and the active mode's fit; the synthetic
    /// model applies until enough new samples arrive. Idempotent.
    pub fn reset_model(&self) {
        self.locked().reset_model();
    }

    /// VRR only: a frame was committed expecting to present at
    /// `expected_present_ns`. No-op for fixed-rate modes.
    pub fn on_frame_begin(&self, expected_present_ns: Nsecs, committed_at_ns: Nsecs) {
        let mut s = self.locked();
        if let Some(vrr) = s.vrr.as_mut() {
            vrr.on_frame_begin(expected_present_ns, committed_at_ns);
        }
    }

    /// VRR only: a committed frame missed its expected present time.
    /// No-op for fixed-rate modes.
    pub fn on_frame_missed(&self, missed_present_ns: Nsecs) {
        let mut s = self.locked();
        if let Some(vrr) = s.vrr.as_mut() {
            vrr.on_frame_missed(missed_present_ns);
        }
    }

    /// Diagnostic snapshot.
    pub fn dump(&self) -> PredictorDump {
        self.locked().dump()
    }
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

/// Builder for `VsyncPredictor`; the display mode is required, tunables
/// default per `vsync_config`.
pub struct VsyncPredictorBuilder<M> {
    mode: Option<DisplayMode>,
    tunables: Option<Tunables>,
    _m: PhantomData<M>,
}

impl Default for VsyncPredictorBuilder<Missing> {
    fn default() -> Self {
        Self {
            mode: None,
            tunables: None,
            _m: PhantomData,
        }
    }
}

impl<M> VsyncPredictorBuilder<M> {
    pub fn with_tunables(mut self, tunables: Tunables) -> Self {
        self.tunables = Some(tunables);
        self
    }

    /// Fallible build available in any type-state; returns a typed
    /// `BuildError` for missing or inconsistent pieces.
    pub fn try_build(self) -> Result<VsyncPredictor> {
        let mode = self
            .mode
            .ok_or_else(|| eyre::Report::new(BuildError::MissingMode))?;
        let tunables = self.tunables.unwrap_or_default();

        if tunables.min_samples < 2 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "min_samples must be >= 2",
            )));
        }
        if tunables.history_size < tunables.min_samples {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "history_size must be >= min_samples",
            )));
        }
        if tunables.outlier_tolerance_percent == 0 || tunables.outlier_tolerance_percent >= 50 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "outlier_tolerance_percent must be in 1..=49",
            )));
        }

        Ok(VsyncPredictor {
            inner: Mutex::new(TrackerState::new(mode, tunables)),
        })
    }
}

impl VsyncPredictorBuilder<Missing> {
    pub fn with_mode(self, mode: DisplayMode) -> VsyncPredictorBuilder<Set> {
        VsyncPredictorBuilder {
            mode: Some(mode),
            tunables: self.tunables,
            _m: PhantomData,
        }
    }
}

impl VsyncPredictorBuilder<Set> {
    /// Validate and build. Only available once the mode is set.
    pub fn build(self) -> Result<VsyncPredictor> {
        self.try_build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Resolution;

    fn mode(id: u32, period: Nsecs) -> DisplayMode {
        DisplayMode::new(DisplayModeId(id), period, Resolution::new(1920, 1080))
    }

    #[test]
    fn build_requires_consistent_tunables() {
        let bad = Tunables {
            history_size: 4,
            min_samples: 6,
            ..Tunables::default()
        };
        assert!(VsyncPredictor::new(mode(0, 1000), bad).is_err());
    }

    #[test]
    fn try_build_without_mode_fails() {
        assert!(VsyncPredictor::builder().try_build().is_err());
    }

    #[test]
    fn fresh_predictor_reports_ideal_model() {
        let p = VsyncPredictor::new(mode(0, 1000), Tunables::default()).unwrap();
        assert_eq!(p.prediction_model(), Model::ideal(1000));
        assert!(p.needs_more_samples());
        assert_eq!(p.dump().state, ModelState::Fresh);
    }

    #[test]
    fn frame_events_are_noops_for_fixed_rate_modes() {
        let p = VsyncPredictor::new(mode(0, 1000), Tunables::default()).unwrap();
        p.on_frame_begin(2000, 1500);
        p.on_frame_missed(4500);
        assert_eq!(p.dump().vrr, None);
        assert_eq!(p.next_anticipated_vsync_time_from(0, None), 1000);
    }

    #[test]
    fn mode_cache_is_bounded() {
        let p = VsyncPredictor::new(mode(0, 1000), Tunables::default()).unwrap();
        for id in 1..=(MODE_CACHE_LIMIT as u32 + 8) {
            p.set_display_mode(mode(id, 1000));
        }
        assert!(p.locked().fits.len() <= MODE_CACHE_LIMIT);
    }
}
