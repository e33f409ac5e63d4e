//! Nanosecond time base.
//!
//! All times are integer nanoseconds from an arbitrary monotonic origin.
//! Frequencies are represented as periods.

pub type Nsecs = i64;

pub const ONE_US: Nsecs = 1_000;
pub const ONE_MS: Nsecs = 1_000 * ONE_US;
pub const ONE_S: Nsecs = 1_000 * ONE_MS;
