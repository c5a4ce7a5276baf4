//! 速率样本及其校验。
//! Delivery-rate samples and their validation.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A delivery-rate measurement handed over by the host on every
/// congestion-control event.
///
/// 主机在每次拥塞控制事件中提供的交付速率测量。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateSample {
    /// Segments delivered during the interval.
    /// 区间内交付的段数。
    pub delivered: i32,
    /// Length of the delivery interval in microseconds.
    /// 交付区间长度（微秒）。
    pub interval_us: i64,
    /// RTT sample in microseconds.
    /// RTT 样本（微秒）。
    pub rtt_us: i64,
    /// Timestamp at the start of the interval, in microseconds.
    /// 区间起始时间戳（微秒）。
    pub prior_mstamp_us: u64,
}

/// Bitmask of the checks a [`RateSample`] failed.
///
/// [`RateSample`] 未通过的检查项位掩码。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SampleFlaws(u8);

impl SampleFlaws {
    pub const NONE: Self = Self(0);
    /// `delivered <= 0`
    pub const NO_DELIVERY: Self = Self(1);
    /// `interval_us <= 0`
    pub const NO_INTERVAL: Self = Self(1 << 1);
    /// `rtt_us <= 0`
    pub const NO_RTT: Self = Self(1 << 2);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SampleFlaws {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SampleFlaws {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for SampleFlaws {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::NO_DELIVERY, "no delivery"),
            (Self::NO_INTERVAL, "no interval"),
            (Self::NO_RTT, "no rtt"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("valid")?;
        }
        Ok(())
    }
}

/// Checks a rate sample before any flow state is touched.
///
/// Returns the set of failed checks when the sample cannot be used.
///
/// 在修改任何流状态之前校验速率样本。样本不可用时返回失败的检查项集合。
pub fn validate(rs: &RateSample) -> Result<(), SampleFlaws> {
    let mut flaws = SampleFlaws::NONE;
    if rs.delivered <= 0 {
        flaws |= SampleFlaws::NO_DELIVERY;
    }
    if rs.interval_us <= 0 {
        flaws |= SampleFlaws::NO_INTERVAL;
    }
    if rs.rtt_us <= 0 {
        flaws |= SampleFlaws::NO_RTT;
    }

    if flaws.is_empty() { Ok(()) } else { Err(flaws) }
}
