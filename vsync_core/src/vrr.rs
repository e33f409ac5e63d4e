//! Timeline state for variable-refresh-rate modes.
//!
//! A VRR panel presents whenever the compositor commits, subject to a
//! minimum inter-frame interval, so the fitted slope acts as a quantization
//! grid rather than a cadence. This struct tracks the anchors that
//! constrain where on that grid the next presentation can land.

use crate::time::Nsecs;

#[derive(Debug, Clone, Copy)]
pub(crate) struct VrrTimeline {
    min_frame_interval: Nsecs,
    /// Expected present time of the most recently committed frame; default
    /// anchor for the minimum-interval constraint.
    last_committed_vsync: Option<Nsecs>,
    /// Commit time of the frame in flight; presentation opportunities
    /// repeat at the render cadence from here.
    pipeline_anchor: Option<Nsecs>,
    /// A present the compositor reported as missed; the next prediction
    /// must strictly exceed it.
    missed_vsync: Option<Nsecs>,
}

impl VrrTimeline {
    pub fn new(min_frame_interval: Nsecs) -> Self {
        Self {
            min_frame_interval,
            last_committed_vsync: None,
            pipeline_anchor: None,
            missed_vsync: None,
        }
    }

    pub fn min_frame_interval(&self) -> Nsecs {
        self.min_frame_interval
    }

    pub fn pipeline_anchor(&self) -> Option<Nsecs> {
        self.pipeline_anchor
    }

    pub fn missed(&self) -> Option<Nsecs> {
        self.missed_vsync
    }

    pub fn last_committed(&self) -> Option<Nsecs> {
        self.last_committed_vsync
    }

    /// A newly committed frame supersedes any older miss.
    pub fn on_frame_begin(&mut self, expected_present: Nsecs, committed_at: Nsecs) {
        self.last_committed_vsync = Some(expected_present);
        self.pipeline_anchor = Some(committed_at);
        if self.missed_vsync.is_some_and(|m| expected_present > m) {
            self.missed_vsync = None;
        }
    }

    /// Invalidate anchors at or before the missed present. A miss with no
    /// committed frame on record is ignored.
    pub fn on_frame_missed(&mut self, missed_present: Nsecs) {
        if self.last_committed_vsync.is_none() && self.pipeline_anchor.is_none() {
            return;
        }
        self.missed_vsync = Some(missed_present);
        if self.last_committed_vsync.is_some_and(|v| v <= missed_present) {
            self.last_committed_vsync = None;
        }
        if self.pipeline_anchor.is_some_and(|v| v <= missed_present) {
            self.pipeline_anchor = None;
        }
    }

    /// Earliest time the next present may land given the minimum interval,
    /// anchored on the caller-confirmed present when supplied, else the
    /// last committed frame. Anchors invalidated by a miss do not count.
    pub fn min_interval_floor(&self, last_confirmed: Option<Nsecs>) -> Option<Nsecs> {
        let anchor = last_confirmed.or(self.last_committed_vsync)?;
        if self.missed_vsync.is_some_and(|m| anchor <= m) {
            return None;
        }
        Some(anchor + self.min_frame_interval)
    }
}
