//! 每条流的状态与控制循环
//! Per-flow state and control loop
//!
//! 职责：
//! - 连接生命周期（未初始化 → 受管 → 已释放）
//! - 确认事件的簿记
//! - 拥塞控制事件：校验 → 统计 → 特征 → 历史 → 模型查询
//!
//! Responsibilities:
//! - Connection lifecycle (uninitialized → managed → released)
//! - Ack event bookkeeping
//! - Congestion-control events: validate → stats → features → history → query

use crate::error::{Error, Result};
use crate::features::{self, FeatureVector, SampleContext};
use crate::history::HistoryRing;
use crate::host::{AckFlags, Endpoints};
use crate::model::{self, AppId, InferenceService};
use crate::sample::{self, RateSample};
use crate::stats::GlobalStats;
use tracing::trace;


/// Lifecycle of a flow's congestion-control state.
///
/// 流拥塞控制状态的生命周期。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifecycle {
    /// Not initialised, or initialisation could not allocate the history.
    /// 未初始化，或初始化时无法分配历史缓冲区。
    #[default]
    Uninitialized,
    /// History allocated; control hooks are active.
    /// 历史已分配，控制钩子生效。
    Managed,
    /// History freed; every hook is a no-op.
    /// 历史已释放，所有钩子均为空操作。
    Released,
}

/// What the most recent ack event acknowledged.
///
/// 最近一次确认事件所确认的内容。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AckedDelta {
    pub bytes: u32,
    /// Acknowledged segments, partial segments rounded up.
    pub segments: u32,
    /// The ack carried an ECN echo.
    pub ecn: bool,
}

/// Congestion-control state of one flow.
///
/// Lives in the socket's private congestion-control area and is only touched
/// from that socket's hooks, so it carries no locks.
///
/// 单条流的拥塞控制状态。存放在套接字私有的拥塞控制区域中，
/// 仅由该套接字的钩子访问，因此不带锁。
#[derive(Debug, Default)]
pub struct FlowState {
    lifecycle: Lifecycle,
    endpoints: Endpoints,
    last_acked_sequence: u32,
    last_ack: AckedDelta,
    stats: GlobalStats,
    cursor: usize,
    history: Option<HistoryRing<FeatureVector>>,
    /// Preallocated model input, `history_len * NUM_INPUT_METRICS` wide.
    input: Box<[i64]>,
    /// Preallocated model output.
    output: Box<[i64]>,
    /// Events that passed validation.
    events: u64,
}

impl FlowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the flow identity and allocates the history and scratch
    /// buffers. On allocation failure the flow stays unmanaged.
    ///
    /// 记录流标识并分配历史和临时缓冲区。分配失败时流保持非受管状态。
    pub fn init(
        &mut self,
        endpoints: Endpoints,
        snd_una: u32,
        history_len: usize,
        output_size: usize,
    ) -> Result<()> {
        self.endpoints = endpoints;
        self.last_acked_sequence = snd_una;
        self.last_ack = AckedDelta::default();
        self.stats.reset();
        self.cursor = 0;
        self.events = 0;

        let history = HistoryRing::<FeatureVector>::try_new(history_len)?;
        let input = zeroed(history.flat_len())?;
        let output = zeroed(output_size)?;

        self.history = Some(history);
        self.input = input;
        self.output = output;
        self.lifecycle = Lifecycle::Managed;
        Ok(())
    }

    /// Frees the history. Returns `false` when there was nothing to free.
    ///
    /// 释放历史缓冲区。没有可释放内容时返回 `false`。
    pub fn release(&mut self) -> bool {
        let was_managed = self.history.take().is_some();
        self.input = Box::default();
        self.output = Box::default();
        if self.lifecycle == Lifecycle::Managed {
            self.lifecycle = Lifecycle::Released;
        }
        was_managed
    }

    /// Books the bytes and segments acknowledged since the previous ack.
    ///
    /// 记录自上次确认以来确认的字节数和段数。
    pub fn on_ack(&mut self, snd_una: u32, mss: u32, flags: AckFlags) -> Result<AckedDelta> {
        if !self.is_managed() {
            return Err(Error::Unmanaged);
        }

        let bytes = snd_una.wrapping_sub(self.last_acked_sequence);
        let segments = if mss == 0 { 0 } else { bytes.div_ceil(mss) };
        self.last_acked_sequence = snd_una;
        self.last_ack = AckedDelta {
            bytes,
            segments,
            ecn: flags.contains(AckFlags::ECE),
        };
        Ok(self.last_ack)
    }

    /// Runs one congestion-control event and returns the rate to apply.
    ///
    /// An invalid sample leaves the flow untouched. Once the sample passed
    /// validation the cursor advances, whether or not the query succeeded.
    ///
    /// 执行一次拥塞控制事件并返回要应用的速率。
    /// 无效样本不会修改流状态；样本通过校验后，无论查询是否成功，游标都会前进。
    pub fn on_rate_sample(
        &mut self,
        rs: &RateSample,
        ctx: &SampleContext,
        service: &dyn InferenceService,
        app_id: AppId,
    ) -> Result<u64> {
        let Some(history) = self.history.as_mut() else {
            return Err(Error::Unmanaged);
        };
        sample::validate(rs).map_err(Error::InvalidSample)?;

        self.stats.observe_rtt(rs.rtt_us);
        let vector = features::extract(rs, self.stats.min_rtt_us(), ctx);
        history.write(self.cursor, vector);
        self.events += 1;

        let result = model::query_rate(
            service,
            app_id,
            &*history,
            self.cursor,
            &mut self.input,
            &mut self.output,
        );

        let next = history.advance(self.cursor);
        trace!(cursor = self.cursor, next, "history cursor advanced");
        self.cursor = next;
        result
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_managed(&self) -> bool {
        self.history.is_some()
    }

    pub fn endpoints(&self) -> Endpoints {
        self.endpoints
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn min_rtt_us(&self) -> Option<i64> {
        self.stats.min_rtt_us()
    }

    pub fn last_acked_sequence(&self) -> u32 {
        self.last_acked_sequence
    }

    pub fn last_ack(&self) -> AckedDelta {
        self.last_ack
    }

    pub fn history(&self) -> Option<&HistoryRing<FeatureVector>> {
        self.history.as_ref()
    }

    /// The input vector built by the most recent query.
    /// 最近一次查询构建的输入向量。
    pub fn model_input(&self) -> &[i64] {
        &self.input
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    /// The most recently written feature vector.
    pub fn latest_features(&self) -> Option<FeatureVector> {
        let history = self.history.as_ref()?;
        if self.events == 0 {
            return None;
        }
        let latest = (self.cursor + history.len() - 1) % history.len();
        Some(*history.get(latest))
    }
}

/// Fallback slow-start threshold: half the window, at least two segments.
/// 回退慢启动阈值：窗口的一半，至少两个段。
#[inline]
pub fn ssthresh(snd_cwnd: u32) -> u32 {
    (snd_cwnd >> 1).max(2)
}

/// Window to restore after a spurious reduction.
/// 虚假缩减后恢复的窗口。
#[inline]
pub fn undo_cwnd(snd_cwnd: u32, snd_ssthresh: u32) -> u32 {
    snd_cwnd.max(snd_ssthresh.saturating_mul(2))
}

fn zeroed(len: usize) -> Result<Box<[i64]>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Allocation { len })?;
    buf.resize(len, 0);
    Ok(buf.into_boxed_slice())
}
