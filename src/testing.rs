//! 测试辅助工具模块
//! Test utilities module

#![cfg(test)]

use crate::error::{Error, Result};
use crate::features::send_log::SentSegmentLog;
use crate::flow::FlowState;
use crate::host::{Endpoints, TcpSock};
use crate::model::{AppId, InferenceModel, InferenceService, ModelUuid};
use crate::pacing::PacingStatus;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TEST_ENDPOINTS: Endpoints = Endpoints {
    src_addr: 0x7f00_0001,
    dst_addr: 0x7f00_0002,
    src_port: 12345,
    dst_port: 54321,
};

/// An in-memory socket the hooks can be driven against.
#[derive(Debug)]
pub struct MockSocket {
    pub ca: FlowState,
    pub endpoints: Endpoints,
    pub snd_una: u32,
    pub mss: u32,
    pub snd_cwnd: u32,
    pub snd_ssthresh: u32,
    pub now_us: u64,
    pub first_tx_mstamp: u64,
    pub sent: SentSegmentLog,
    pub ecn_ok: bool,
    pub ecn_transmit: bool,
    pub pacing_status: PacingStatus,
    pub pacing_rate: u64,
}

impl MockSocket {
    pub fn new() -> Self {
        Self {
            ca: FlowState::new(),
            endpoints: TEST_ENDPOINTS,
            snd_una: 1_000,
            mss: 1_000,
            snd_cwnd: 10,
            snd_ssthresh: u32::MAX,
            now_us: 30_000,
            first_tx_mstamp: 1,
            sent: SentSegmentLog::new(),
            ecn_ok: true,
            ecn_transmit: true,
            pacing_status: PacingStatus::None,
            pacing_rate: 0,
        }
    }
}

impl TcpSock for MockSocket {
    fn ca(&mut self) -> &mut FlowState {
        &mut self.ca
    }

    fn endpoints(&self) -> Endpoints {
        self.endpoints
    }

    fn snd_una(&self) -> u32 {
        self.snd_una
    }

    fn mss_cache(&self) -> u32 {
        self.mss
    }

    fn snd_cwnd(&self) -> u32 {
        self.snd_cwnd
    }

    fn snd_ssthresh(&self) -> u32 {
        self.snd_ssthresh
    }

    fn tcp_mstamp(&self) -> u64 {
        self.now_us
    }

    fn first_tx_mstamp(&self) -> u64 {
        self.first_tx_mstamp
    }

    fn lookup_send_duration(&self, first_tx_mstamp: u64) -> Option<u64> {
        self.sent.lookup_send_duration(first_tx_mstamp)
    }

    fn ecn_ok(&self) -> bool {
        self.ecn_ok
    }

    fn disable_ecn_transmit(&mut self) {
        self.ecn_transmit = false;
    }

    fn pacing_status(&self) -> PacingStatus {
        self.pacing_status
    }

    fn set_pacing_status(&mut self, status: PacingStatus) {
        self.pacing_status = status;
    }

    fn pacing_rate(&self) -> u64 {
        self.pacing_rate
    }

    fn set_pacing_rate(&mut self, rate: u64) {
        self.pacing_rate = rate;
    }
}

/// Answers every query with a fixed rate and remembers the last input.
#[derive(Debug, Default)]
pub struct FixedRateService {
    pub rate: i64,
    pub queries: AtomicUsize,
    pub last_input: Mutex<Vec<i64>>,
}

impl FixedRateService {
    pub fn new(rate: i64) -> Self {
        Self {
            rate,
            ..Default::default()
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Vec<i64> {
        self.last_input.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl InferenceService for FixedRateService {
    fn query(&self, _app_id: AppId, input: &[i64], output: &mut [i64]) -> Result<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_input.lock() {
            last.clear();
            last.extend_from_slice(input);
        }
        output[0] = self.rate;
        Ok(())
    }
}

/// A service with no model behind it.
#[derive(Debug, Default)]
pub struct UnavailableService;

impl InferenceService for UnavailableService {
    fn query(&self, app_id: AppId, _input: &[i64], _output: &mut [i64]) -> Result<()> {
        Err(Error::ModelUnavailable { app_id })
    }
}

/// A model that writes `base + input[0]` to every output slot.
#[derive(Debug)]
pub struct OffsetModel {
    pub uuid: ModelUuid,
    pub input_size: usize,
    pub output_size: usize,
    pub base: i64,
}

impl InferenceModel for OffsetModel {
    fn uuid(&self) -> ModelUuid {
        self.uuid
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.output_size
    }

    fn infer(&self, input: &[i64], output: &mut [i64]) {
        let first = input.first().copied().unwrap_or(0);
        output.fill(self.base + first);
    }
}
