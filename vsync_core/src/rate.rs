//! Integer-divisor render cadence on top of the hardware cadence.

use crate::time::Nsecs;

/// Resolve a requested render period to an integer divisor of the hardware
/// cadence. `None` when the ratio is not an integer within 1% of the
/// request; the caller treats that as "not applicable", never as an error.
pub(crate) fn divisor_for(requested_period: Nsecs, slope: Nsecs) -> Option<Nsecs> {
    if requested_period <= 0 || slope <= 0 {
        return None;
    }
    let n = (requested_period + slope / 2) / slope;
    if n < 1 {
        return None;
    }
    let error = (requested_period - n * slope).abs();
    if i128::from(error) * 100 > i128::from(requested_period) {
        return None;
    }
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1000, 1000, Some(1))]
    #[case(3000, 1000, Some(3))]
    #[case(2000, 1000, Some(2))]
    #[case(3500, 1000, None)] // x3.5 is not a divisor
    #[case(400, 1000, None)] // faster than the hardware cadence
    #[case(33_333_333, 16_666_666, Some(2))] // 30Hz over 60Hz, off by 1ns
    #[case(0, 1000, None)]
    fn divisor_resolution(
        #[case] requested: Nsecs,
        #[case] slope: Nsecs,
        #[case] expected: Option<Nsecs>,
    ) {
        assert_eq!(divisor_for(requested, slope), expected);
    }

    #[test]
    fn one_percent_band_is_respected() {
        assert_eq!(divisor_for(3030, 1000), Some(3)); // 1.0% high
        assert_eq!(divisor_for(3031, 1000), None);
    }
}
