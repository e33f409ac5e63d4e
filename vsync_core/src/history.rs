//! Bounded history of observed vsync timestamps with ingest filtering.
//!
//! Outlier pre-filtering at ingest keeps the regressor numerically sane;
//! the regressor still does a second residual pass to reject individual
//! stragglers.

use std::collections::VecDeque;

use crate::error::RejectReason;
use crate::time::Nsecs;

#[derive(Debug, Clone)]
pub(crate) struct SampleRing {
    samples: VecDeque<Nsecs>,
    capacity: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Check a candidate timestamp against the retained history.
    ///
    /// A sample is admissible when it lands within the tolerance band of a
    /// whole multiple of the nominal period from the newest retained sample
    /// (so a skipped vsync or an idle gap of whole periods is fine, an
    /// off-grid straggler is not), and is not within the tolerance band of
    /// any already-retained sample. The near-duplicate rule is the defense
    /// against the kernel reporting one vsync twice within microseconds.
    pub fn admit(&self, ts: Nsecs, period: Nsecs, tolerance_percent: u32) -> Result<(), RejectReason> {
        let Some(&newest) = self.samples.back() else {
            return Ok(());
        };
        let tol = Nsecs::from(tolerance_percent);

        // Truncating remainder: the sign follows the dividend, so an
        // out-of-order but on-grid timestamp yields a small negative phase
        // which passes the band test below.
        let phase_pct = (ts - newest) % period * 100 / period;
        if phase_pct >= tol && phase_pct <= 100 - tol {
            return Err(RejectReason::OutOfPhase);
        }

        let nearest = self
            .samples
            .iter()
            .copied()
            .min_by_key(|&s| (ts - s).abs());
        if let Some(nearest) = nearest {
            let dist_pct = i128::from((nearest - ts).abs()) * 100 / i128::from(period);
            if dist_pct < i128::from(tol) {
                return Err(RejectReason::NearDuplicate);
            }
        }
        Ok(())
    }

    /// Insert in observation order, evicting FIFO beyond capacity.
    pub fn push(&mut self, ts: Nsecs) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(ts);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Oldest timestamp by value. Samples may arrive out of order (and on
    /// the grid), so this is a minimum, not the front of the deque.
    pub fn oldest(&self) -> Option<Nsecs> {
        self.samples.iter().copied().min()
    }

    pub fn newest(&self) -> Option<Nsecs> {
        self.samples.iter().copied().max()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Retained samples in insertion order.
    pub fn to_vec(&self) -> Vec<Nsecs> {
        self.samples.iter().copied().collect()
    }
}
