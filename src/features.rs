//! 特征提取器 - 将速率样本转换为定点特征向量
//! Feature extractor - turns rate samples into fixed-point feature vectors
//!
//! 职责：
//! - 计算延迟比（相对于最小RTT）
//! - 计算吞吐比（接收速率 / 发送速率）
//! - 保留占位槽位，保持模型输入宽度稳定
//!
//! Responsibilities:
//! - Latency ratio relative to the minimum RTT
//! - Throughput ratio (delivery rate over send rate)
//! - Reserved slots that keep the model input width stable

use crate::history::FeatureSlots;
use crate::sample::RateSample;
use tracing::trace;

pub mod send_log;


/// Number of slots in every feature vector.
pub const NUM_INPUT_METRICS: usize = 3;

/// Fixed-point scale applied to every ratio.
pub const INPUT_SCALE: i64 = 1000;

/// Latency ratio `rtt / min_rtt`.
pub const LAT_RATIO: usize = 0;
/// Throughput ratio `delivery rate / send rate`.
pub const SEND_RATIO: usize = 1;
/// Sent-latency inflation. Reserved, always zero.
pub const SENT_LAT_INFLATION: usize = 2;

/// Capacity of the recently-sent segment record.
pub const MAX_SKB_STORED: usize = 16;

const S_TO_US: u128 = 1_000_000;

/// One engineered feature vector, produced once per congestion-control event.
///
/// 一个工程化特征向量，每次拥塞控制事件产生一次。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureVector([i64; NUM_INPUT_METRICS]);

impl FeatureVector {
    pub fn latency_ratio(&self) -> i64 {
        self.0[LAT_RATIO]
    }

    pub fn throughput_ratio(&self) -> i64 {
        self.0[SEND_RATIO]
    }

    pub fn sent_latency_inflation(&self) -> i64 {
        self.0[SENT_LAT_INFLATION]
    }

    pub fn values(&self) -> &[i64; NUM_INPUT_METRICS] {
        &self.0
    }
}

impl From<[i64; NUM_INPUT_METRICS]> for FeatureVector {
    fn from(values: [i64; NUM_INPUT_METRICS]) -> Self {
        Self(values)
    }
}

impl FeatureSlots for FeatureVector {
    const WIDTH: usize = NUM_INPUT_METRICS;

    fn slots(&self) -> &[i64] {
        &self.0
    }

    fn from_slots(slots: &[i64]) -> Self {
        Self(<[i64; NUM_INPUT_METRICS]>::from_slots(slots))
    }
}

/// Socket-side context a sample is interpreted in.
///
/// 解释样本所需的套接字侧上下文。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleContext {
    /// Current socket timestamp in microseconds.
    /// 当前套接字时间戳（微秒）。
    pub now_us: u64,
    /// Segment size in bytes.
    /// 段大小（字节）。
    pub mss: u32,
    /// Send-side duration matching the sample, when the host could find one.
    /// 与样本匹配的发送侧持续时间（如果主机能找到）。
    pub send_duration_us: Option<u64>,
}

impl SampleContext {
    /// Time over which the acknowledgements arrived.
    #[inline]
    pub fn ack_duration_us(&self, rs: &RateSample) -> u64 {
        self.now_us.saturating_sub(rs.prior_mstamp_us)
    }
}

/// `INPUT_SCALE * rtt / min_rtt`, or the neutral ratio when no baseline exists.
///
/// 有基线时为 `INPUT_SCALE * rtt / min_rtt`，否则为中性比值。
pub fn latency_ratio(rtt_us: i64, min_rtt_us: Option<i64>) -> i64 {
    match min_rtt_us {
        Some(min) if min > 0 => {
            let scaled = i128::from(INPUT_SCALE) * i128::from(rtt_us) / i128::from(min);
            saturate(scaled)
        }
        _ => INPUT_SCALE,
    }
}

/// Ratio of the send-side rate to the ack-side rate, scaled by `INPUT_SCALE`.
///
/// Both rates are `delivered * mss * 1s / duration`. Any zero or unknown
/// duration, or a rate that truncates to zero, yields the neutral ratio.
///
/// 发送侧速率与确认侧速率之比，按 `INPUT_SCALE` 缩放。
/// 任一持续时间为零或未知，或速率截断为零时，返回中性比值。
pub fn throughput_ratio(delivered: i32, mss: u32, snd_us: Option<u64>, ack_us: u64) -> i64 {
    let snd_us = match snd_us {
        Some(us) if us > 0 => us,
        _ => return INPUT_SCALE,
    };
    if ack_us == 0 || delivered <= 0 {
        return INPUT_SCALE;
    }

    let bytes_us = delivered as u128 * u128::from(mss) * S_TO_US;
    let rin = bytes_us / u128::from(snd_us);
    let rout = bytes_us / u128::from(ack_us);
    if rout == 0 {
        return INPUT_SCALE;
    }

    let scaled = (INPUT_SCALE as u128).saturating_mul(rin) / rout;
    i64::try_from(scaled).unwrap_or(i64::MAX)
}

/// Computes the feature vector for a validated sample.
///
/// `min_rtt_us` must already include this sample's RTT.
///
/// 为已校验的样本计算特征向量。`min_rtt_us` 必须已经包含该样本的RTT。
pub fn extract(rs: &RateSample, min_rtt_us: Option<i64>, ctx: &SampleContext) -> FeatureVector {
    let mut values = [0; NUM_INPUT_METRICS];
    values[LAT_RATIO] = latency_ratio(rs.rtt_us, min_rtt_us);
    values[SEND_RATIO] = throughput_ratio(
        rs.delivered,
        ctx.mss,
        ctx.send_duration_us,
        ctx.ack_duration_us(rs),
    );
    values[SENT_LAT_INFLATION] = 0;

    trace!(
        rtt_us = rs.rtt_us,
        min_rtt_us = min_rtt_us.unwrap_or(-1),
        lat_ratio = values[LAT_RATIO],
        send_ratio = values[SEND_RATIO],
        "features extracted"
    );

    FeatureVector(values)
}

fn saturate(v: i128) -> i64 {
    i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX })
}
