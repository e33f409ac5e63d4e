#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Construction-time tunables for the vsync prediction engine.
//!
//! - `Tunables` is deserialized from TOML and validated.
//! - All values are fixed at predictor construction; there is no dynamic
//!   reconfiguration path.
use serde::Deserialize;

/// Tunables for the timing model.
///
/// Example TOML:
/// ```toml
/// history_size = 20
/// min_samples = 6
/// outlier_tolerance_percent = 25
/// ```
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Tunables {
    /// Number of retained vsync samples. FIFO eviction beyond this.
    pub history_size: usize,
    /// Minimum retained samples before a regression is attempted.
    pub min_samples: usize,
    /// Tolerance band, in percent of the nominal period, used both for
    /// sample ingest filtering and for rejecting implausible fitted slopes.
    pub outlier_tolerance_percent: u32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            history_size: 20,
            min_samples: 6,
            outlier_tolerance_percent: 25,
        }
    }
}

impl Tunables {
    /// Validate internal consistency. The same checks run again when a
    /// predictor is built, so hand-constructed values cannot bypass them.
    pub fn validate(&self) -> eyre::Result<()> {
        if self.min_samples < 2 {
            eyre::bail!(
                "min_samples must be >= 2 to fit a line, got {}",
                self.min_samples
            );
        }
        if self.history_size < self.min_samples {
            eyre::bail!(
                "history_size ({}) must be >= min_samples ({})",
                self.history_size,
                self.min_samples
            );
        }
        if self.outlier_tolerance_percent == 0 || self.outlier_tolerance_percent >= 50 {
            eyre::bail!(
                "outlier_tolerance_percent must be in 1..=49, got {}",
                self.outlier_tolerance_percent
            );
        }
        Ok(())
    }
}

pub fn load_toml(s: &str) -> Result<Tunables, toml::de::Error> {
    toml::from_str::<Tunables>(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Tunables::default().validate().unwrap();
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let t = load_toml("").unwrap();
        assert_eq!(t, Tunables::default());
    }
}
