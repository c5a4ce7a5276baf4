//! 学习型拥塞控制器 - 主机钩子集的实现
//! Learned congestion controller - the hook set the host invokes
//!
//! 每个钩子都在本地处理错误：无效样本、非受管的流或不可用的模型
//! 只会被记录，连接继续使用当前速率。
//!
//! Every hook handles its errors locally: an invalid sample, an unmanaged
//! flow or an unavailable model is logged and the connection keeps the rate
//! already in effect.

use crate::config::Config;
use crate::error::Error;
use crate::features::SampleContext;
use crate::flow::{self, FlowState};
use crate::host::{AckFlags, CongestionOps, TcpSock};
use crate::model::InferenceService;
use crate::pacing;
use crate::sample::RateSample;
use crate::telemetry::TelemetryChannel;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

#[cfg(test)]
mod tests;

/// Hook set that replaces the transport's rate control with model decisions.
///
/// 用模型决策替代传输层速率控制的钩子集。
pub struct LearnedController {
    config: Config,
    service: Arc<dyn InferenceService>,
    telemetry: Option<TelemetryChannel>,
}

impl LearnedController {
    pub fn new(config: Config, service: Arc<dyn InferenceService>) -> Self {
        Self {
            config,
            service,
            telemetry: None,
        }
    }

    /// Reports model inputs on `channel` every configured interval.
    /// 按配置的间隔在 `channel` 上报告模型输入。
    pub fn with_telemetry(mut self, channel: TelemetryChannel) -> Self {
        self.telemetry = Some(channel);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn telemetry(&self) -> Option<&TelemetryChannel> {
        self.telemetry.as_ref()
    }

    fn maybe_report(&self, ca: &FlowState) {
        let (Some(channel), Some(every)) = (&self.telemetry, self.config.telemetry.report_interval)
        else {
            return;
        };
        if ca.events() % every.get() == 0 {
            let reached = channel.report(self.config.model.app_id, ca.model_input());
            trace!(reached, events = ca.events(), "model input reported");
        }
    }
}

impl<S: TcpSock> CongestionOps<S> for LearnedController {
    fn name(&self) -> &'static str {
        self.config.model.algorithm_name
    }

    fn init(&self, sk: &mut S) {
        let endpoints = sk.endpoints();
        let snd_una = sk.snd_una();

        match sk.ca().init(
            endpoints,
            snd_una,
            self.config.flow.history_len,
            self.config.model.output_size,
        ) {
            Ok(()) => info!(?endpoints, "New flow handled by learned controller"),
            Err(e) => error!(?endpoints, error = %e, "Flow left unmanaged"),
        }

        if !sk.ecn_ok() {
            sk.disable_ecn_transmit();
        }
        pacing::request_pacing(sk);
    }

    fn release(&self, sk: &mut S) {
        let ca = sk.ca();
        let endpoints = ca.endpoints();
        if ca.release() {
            info!(?endpoints, "Flow released by learned controller");
        } else {
            debug!(?endpoints, "Release of an unmanaged flow ignored");
        }
    }

    fn ssthresh(&self, sk: &S) -> u32 {
        flow::ssthresh(sk.snd_cwnd())
    }

    fn undo_cwnd(&self, sk: &S) -> u32 {
        flow::undo_cwnd(sk.snd_cwnd(), sk.snd_ssthresh())
    }

    fn in_ack_event(&self, sk: &mut S, flags: AckFlags) {
        let snd_una = sk.snd_una();
        let mss = sk.mss_cache();
        match sk.ca().on_ack(snd_una, mss, flags) {
            Ok(delta) => trace!(
                bytes = delta.bytes,
                segments = delta.segments,
                ecn = delta.ecn,
                "ack booked"
            ),
            Err(e) => error!(error = %e, "Ack on a flow not managed by learned controller"),
        }
    }

    fn cong_control(&self, sk: &mut S, rs: &RateSample) {
        let ctx = SampleContext {
            now_us: sk.tcp_mstamp(),
            mss: sk.mss_cache(),
            send_duration_us: sk.lookup_send_duration(sk.first_tx_mstamp()),
        };
        let app_id = self.config.model.app_id;

        let result = {
            let ca = sk.ca();
            let result = ca.on_rate_sample(rs, &ctx, &*self.service, app_id);
            if !matches!(result, Err(Error::Unmanaged | Error::InvalidSample(_))) {
                self.maybe_report(ca);
            }
            result
        };

        match result {
            Ok(rate) => pacing::apply_rate(sk, rate),
            Err(Error::InvalidSample(flaws)) => trace!(%flaws, "rate sample skipped"),
            Err(Error::Unmanaged) => error!("Current flow is not managed by learned controller"),
            Err(e) => warn!(app_id, error = %e, "Model query failed, keeping current rate"),
        }
    }
}
