//! Ordinary least-squares fit of vsync timestamps to (slope, intercept).
//!
//! Ordinals are derived from the timestamps themselves by rounding the
//! distance from the oldest retained sample against the current slope
//! estimate, so a trace with gaps of whole periods occupies the correct
//! ordinals. The fixed-point scale keeps fractional precision in the
//! ordinal mean; the oldest timestamp is subtracted as a bias so the
//! arithmetic stays exact for devices that have been up for years.

use crate::model::Model;
use crate::time::Nsecs;

/// Fixed-point scale applied to ordinals during the fit.
const ORDINAL_SCALE: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FitOutcome {
    /// A plausible fit; intercept is relative to the oldest sample that
    /// survived the residual pass.
    Fit(Model),
    /// All samples collapsed onto one ordinal; no line can be fit.
    Degenerate,
    /// The fitted slope fell outside the tolerance band around the nominal
    /// period.
    OutOfBand { slope: Nsecs },
}

/// Fit `samples` (observation order) against `current_slope`, validating
/// the result against `nominal_period` with the given tolerance band.
pub(crate) fn fit_model(
    samples: &[Nsecs],
    current_slope: Nsecs,
    nominal_period: Nsecs,
    tolerance_percent: u32,
) -> FitOutcome {
    debug_assert!(samples.len() >= 2);

    let Some((slope, intercept)) = fit_once(samples, current_slope) else {
        return FitOutcome::Degenerate;
    };

    // One residual pass: drop stragglers the ingest filter let through,
    // then refit over the survivors.
    let threshold = i128::from(nominal_period) * i128::from(tolerance_percent) / 100;
    let oldest = min_of(samples);
    let survivors: Vec<Nsecs> = samples
        .iter()
        .copied()
        .filter(|&ts| {
            let y = i128::from(ts - oldest);
            let x = i128::from(ordinal_of(ts - oldest, current_slope));
            let predicted = i128::from(slope) * x / i128::from(ORDINAL_SCALE) + i128::from(intercept);
            (y - predicted).abs() <= threshold
        })
        .collect();

    let (slope, intercept) = if survivors.len() != samples.len() && survivors.len() >= 2 {
        match fit_once(&survivors, current_slope) {
            Some(refit) => refit,
            None => return FitOutcome::Degenerate,
        }
    } else {
        (slope, intercept)
    };

    let band_pct = i128::from((slope - nominal_period).abs()) * 100 / i128::from(nominal_period);
    if band_pct >= i128::from(tolerance_percent) {
        return FitOutcome::OutOfBand { slope };
    }
    FitOutcome::Fit(Model { slope, intercept })
}

fn min_of(samples: &[Nsecs]) -> Nsecs {
    samples.iter().copied().min().unwrap_or(0)
}

/// Scaled ordinal of a bias-subtracted timestamp (`offset >= 0`).
fn ordinal_of(offset: Nsecs, slope: Nsecs) -> i64 {
    (offset + slope / 2) / slope * ORDINAL_SCALE
}

fn fit_once(samples: &[Nsecs], current_slope: Nsecs) -> Option<(Nsecs, Nsecs)> {
    let oldest = min_of(samples);
    let n = samples.len() as i128;

    let ys: Vec<i64> = samples.iter().map(|&ts| ts - oldest).collect();
    let xs: Vec<i64> = ys.iter().map(|&y| ordinal_of(y, current_slope)).collect();

    let mean_y = (ys.iter().map(|&y| i128::from(y)).sum::<i128>() / n) as i64;
    let mean_x = (xs.iter().map(|&x| i128::from(x)).sum::<i128>() / n) as i64;

    let mut top: i128 = 0;
    let mut bottom: i128 = 0;
    for (&y, &x) in ys.iter().zip(&xs) {
        let dy = i128::from(y - mean_y);
        let dx = i128::from(x - mean_x);
        top += dy * dx;
        bottom += dx * dx;
    }
    if bottom == 0 {
        return None;
    }

    let slope = (top * i128::from(ORDINAL_SCALE) / bottom) as i64;
    let intercept = mean_y - (i128::from(slope) * i128::from(mean_x) / i128::from(ORDINAL_SCALE)) as i64;
    Some((slope, intercept))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_cadence_fits_exactly() {
        let samples: Vec<Nsecs> = (1..=6).map(|i| i * 1000).collect();
        assert_eq!(
            fit_model(&samples, 1000, 1000, 25),
            FitOutcome::Fit(Model {
                slope: 1000,
                intercept: 0
            })
        );
    }

    #[test]
    fn whole_period_gaps_occupy_their_ordinals() {
        // vsyncs 0,1,2 then 10,11 on an exact 1ms cadence
        let samples = [0, 1_000_000, 2_000_000, 10_000_000, 11_000_000];
        assert_eq!(
            fit_model(&samples, 1_000_000, 1_000_000, 25),
            FitOutcome::Fit(Model {
                slope: 1_000_000,
                intercept: 0
            })
        );
    }

    #[test]
    fn duplicate_ordinals_are_degenerate() {
        let samples = [5000, 5001, 5002, 4999, 5003, 4998];
        assert_eq!(fit_model(&samples, 1000, 1000, 25), FitOutcome::Degenerate);
    }

    #[test]
    fn drifted_cadence_out_of_band() {
        // A consistent cadence 30% off the nominal period fits cleanly but
        // must not be trusted.
        let samples: Vec<Nsecs> = (0..6).map(|i| i * 1300).collect();
        match fit_model(&samples, 1300, 1000, 25) {
            FitOutcome::OutOfBand { slope } => assert_eq!(slope, 1300),
            other => panic!("expected out-of-band, got {other:?}"),
        }
    }

    #[test]
    fn residual_pass_discards_stragglers() {
        // A clean cadence plus one straggler mid-trace that an ingest
        // filter keyed on the previous sample would admit.
        let clean = [0, 1000, 2000, 3000, 4000, 5000, 6000, 7000];
        let mut with_straggler = clean.to_vec();
        with_straggler.insert(4, 4400); // lands on ordinal 4, 400ns late
        let expected = fit_model(&clean, 1000, 1000, 25);
        assert_eq!(fit_model(&with_straggler, 1000, 1000, 25), expected);
    }

    #[test]
    fn intercept_is_relative_to_oldest() {
        // cadence offset from the grid by a constant bias
        let samples: Vec<Nsecs> = (0..6).map(|i| 100_000 + i * 1000).collect();
        assert_eq!(
            fit_model(&samples, 1000, 1000, 25),
            FitOutcome::Fit(Model {
                slope: 1000,
                intercept: 0
            })
        );
    }

    #[test]
    fn decade_uptime_keeps_precision() {
        let base: Nsecs = 100 * 365 * 24 * 3600 * 1_000_000_000;
        let samples: Vec<Nsecs> = (0..10).map(|i| base + i * 1000).collect();
        assert_eq!(
            fit_model(&samples, 1000, 1000, 25),
            FitOutcome::Fit(Model {
                slope: 1000,
                intercept: 0
            })
        );
    }
}
