//! 模拟主机套接字与测试辅助工具
//! Simulated host sockets and test helpers
#![allow(dead_code)]

use learned_cc::features::send_log::SentSegmentLog;
use learned_cc::host::{AlgorithmDirectory, AlgorithmTable, CongestionOps, Endpoints, TcpSock};
use learned_cc::model::{InferenceModel, ModelRegistry, ModelUuid};
use learned_cc::pacing::PacingStatus;
use learned_cc::sample::RateSample;
use learned_cc::{Config, FlowState, Subsystem};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "learned_cc=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

// Each simulated socket gets its own source port.
static NEXT_PORT: AtomicU64 = AtomicU64::new(40000);

/// A simulated host socket: the transport state a hook set sees, plus a
/// sent-segment record and a clock the test drives.
#[derive(Debug)]
pub struct SimSocket {
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

impl SimSocket {
    pub fn new() -> Self {
        Self {
            ca: FlowState::new(),
            endpoints: Endpoints {
                src_addr: 0x0a00_0001,
                dst_addr: 0x0a00_0002,
                src_port: NEXT_PORT.fetch_add(1, Ordering::SeqCst),
                dst_port: 443,
            },
            snd_una: 0,
            mss: 1_448,
            snd_cwnd: 10,
            snd_ssthresh: u32::MAX,
            now_us: 1_000_000,
            first_tx_mstamp: 0,
            sent: SentSegmentLog::new(),
            ecn_ok: true,
            ecn_transmit: true,
            pacing_status: PacingStatus::None,
            pacing_rate: 0,
        }
    }

    /// Sends a flight: records its send interval and moves the clock on.
    pub fn send_flight(&mut self, send_interval_us: u64) {
        self.first_tx_mstamp = self.now_us;
        self.sent.record(self.first_tx_mstamp, send_interval_us);
        self.now_us += send_interval_us;
    }

    /// Acknowledges `segments` full segments after `rtt_us`, returning the
    /// matching rate sample.
    pub fn ack_flight(&mut self, segments: u32, rtt_us: i64) -> RateSample {
        let prior = self.now_us;
        self.now_us += rtt_us as u64;
        self.snd_una = self.snd_una.wrapping_add(segments * self.mss);
        RateSample {
            delivered: segments as i32,
            interval_us: rtt_us,
            rtt_us,
            prior_mstamp_us: prior,
        }
    }
}

impl TcpSock for SimSocket {
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

/// A model that answers `rate` for every input.
#[derive(Debug)]
pub struct ConstantModel {
    pub uuid: ModelUuid,
    pub input_size: usize,
    pub rate: i64,
}

impl InferenceModel for ConstantModel {
    fn uuid(&self) -> ModelUuid {
        self.uuid
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        1
    }

    fn infer(&self, _input: &[i64], output: &mut [i64]) {
        output.fill(self.rate);
    }
}

/// A loaded plugin together with the host directory it registered with.
pub struct TestHost {
    pub registry: Arc<ModelRegistry>,
    pub table: Arc<AlgorithmDirectory<SimSocket>>,
    pub subsystem: Subsystem<SimSocket>,
}

impl TestHost {
    pub fn load(config: Config) -> Self {
        init_tracing();
        let registry = Arc::new(ModelRegistry::new());
        let table = Arc::new(AlgorithmDirectory::<SimSocket>::new());
        let dyn_table: Arc<dyn AlgorithmTable<SimSocket>> = table.clone();
        let subsystem = Subsystem::load(config, registry.clone(), dyn_table).unwrap();
        Self {
            registry,
            table,
            subsystem,
        }
    }

    /// The hook set as the host sees it, looked up by name.
    pub fn ops(&self) -> Arc<dyn CongestionOps<SimSocket>> {
        let name = self.subsystem.controller().config().model.algorithm_name;
        self.table.get(name).unwrap()
    }
}
