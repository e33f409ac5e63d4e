//! Display-mode descriptors.
//!
//! A `DisplayMode` is immutable once created and replaced atomically via
//! `VsyncPredictor::set_display_mode`. Identity is the mode id; resolution
//! and group participate only in equality.

use crate::time::Nsecs;

/// Opaque display-mode identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DisplayModeId(pub u32);

impl core::fmt::Display for DisplayModeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "mode#{}", self.0)
    }
}

/// Pixel dimensions, opaque to the timing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Variable-refresh-rate constraints. Present only on VRR modes, where the
/// panel presents on commit subject to a minimum inter-frame interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VrrConfig {
    pub min_frame_interval_ns: Nsecs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMode {
    id: DisplayModeId,
    nominal_period_ns: Nsecs,
    resolution: Resolution,
    group: i32,
    vrr: Option<VrrConfig>,
}

impl DisplayMode {
    /// A fixed-cadence mode. `nominal_period_ns` must be positive; a
    /// non-positive period is clamped to 1ns rather than panicking, since
    /// the descriptor arrives from hardware enumeration.
    pub fn new(id: DisplayModeId, nominal_period_ns: Nsecs, resolution: Resolution) -> Self {
        Self {
            id,
            nominal_period_ns: nominal_period_ns.max(1),
            resolution,
            group: 0,
            vrr: None,
        }
    }

    pub fn with_group(mut self, group: i32) -> Self {
        self.group = group;
        self
    }

    /// Attach VRR constraints; the minimum interval is clamped to at least
    /// the nominal period (a panel cannot present faster than it refreshes).
    pub fn with_vrr(mut self, vrr: VrrConfig) -> Self {
        self.vrr = Some(VrrConfig {
            min_frame_interval_ns: vrr.min_frame_interval_ns.max(self.nominal_period_ns),
        });
        self
    }

    pub fn id(&self) -> DisplayModeId {
        self.id
    }

    pub fn nominal_period_ns(&self) -> Nsecs {
        self.nominal_period_ns
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn group(&self) -> i32 {
        self.group
    }

    pub fn vrr_config(&self) -> Option<VrrConfig> {
        self.vrr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_is_clamped_positive() {
        let m = DisplayMode::new(DisplayModeId(0), 0, Resolution::default());
        assert_eq!(m.nominal_period_ns(), 1);
    }

    #[test]
    fn vrr_interval_clamped_to_period() {
        let m = DisplayMode::new(DisplayModeId(1), 1000, Resolution::default()).with_vrr(
            VrrConfig {
                min_frame_interval_ns: 10,
            },
        );
        assert_eq!(m.vrr_config().unwrap().min_frame_interval_ns, 1000);
    }

    #[test]
    fn identity_is_the_id_equality_is_everything() {
        let a = DisplayMode::new(DisplayModeId(2), 1000, Resolution::new(1920, 1080));
        let b = DisplayMode::new(DisplayModeId(2), 1000, Resolution::new(1280, 720));
        assert_eq!(a.id(), b.id());
        assert_ne!(a, b);
    }
}
