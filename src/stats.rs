//! 每条流的单调聚合统计。
//! Per-flow monotone aggregates.

/// Number of aggregate slots kept per flow.
pub const NUM_GLOBAL_STATS: usize = 1;

/// Slot holding the minimum observed RTT in microseconds.
pub const MIN_RTT_US: usize = 0;

/// Marker for an aggregate that has not seen a sample yet.
pub const UNSET: i64 = -1;

/// Folds an RTT sample into the running minimum.
///
/// 将RTT样本合并到当前最小值中。
#[inline]
pub fn observe_rtt(current_min: i64, sample: i64) -> i64 {
    if current_min < 0 || sample < current_min {
        sample
    } else {
        current_min
    }
}

/// Fixed-size array of per-flow aggregates.
///
/// 固定大小的每流聚合数组。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalStats {
    values: [i64; NUM_GLOBAL_STATS],
}

impl GlobalStats {
    pub fn new() -> Self {
        Self {
            values: [UNSET; NUM_GLOBAL_STATS],
        }
    }

    /// Updates the minimum RTT with a sample that already passed validation.
    /// 使用已通过校验的样本更新最小RTT。
    pub fn observe_rtt(&mut self, rtt_us: i64) {
        if rtt_us <= 0 {
            return;
        }
        self.values[MIN_RTT_US] = observe_rtt(self.values[MIN_RTT_US], rtt_us);
    }

    /// The minimum RTT seen so far, if any.
    /// 迄今为止观察到的最小RTT（如有）。
    pub fn min_rtt_us(&self) -> Option<i64> {
        let min = self.values[MIN_RTT_US];
        (min > 0).then_some(min)
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.values
    }

    pub fn reset(&mut self) {
        self.values = [UNSET; NUM_GLOBAL_STATS];
    }
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self::new()
    }
}
