//! 主机传输栈接口
//! Host transport stack interfaces
//!
//! 职责：
//! - 定义主机为每个套接字提供的视图
//! - 定义主机调用的拥塞控制钩子集
//! - 提供按名称登记钩子集的目录
//!
//! Responsibilities:
//! - The per-socket view the host exposes
//! - The congestion-control hook set the host invokes
//! - A directory of hook sets registered by name

use crate::error::{Error, Result};
use crate::flow::FlowState;
use crate::pacing::PacingStatus;
use crate::sample::RateSample;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::info;

/// Endpoint identity of a flow. Informational only.
///
/// 流的端点标识，仅供参考。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Endpoints {
    pub src_addr: u64,
    pub dst_addr: u64,
    pub src_port: u64,
    pub dst_port: u64,
}

/// Flags the host passes to the ack hook.
///
/// 主机传给确认钩子的标志。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AckFlags(u32);

impl AckFlags {
    pub const NONE: Self = Self(0);
    /// The ack was processed on the slow path.
    pub const SLOWPATH: Self = Self(1);
    /// The ack updated the receive window.
    pub const WIN_UPDATE: Self = Self(1 << 1);
    /// The ack carried an ECN echo.
    pub const ECE: Self = Self(1 << 2);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for AckFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// The view of one connection the host hands to every hook.
///
/// `ca` is the connection's private congestion-control area; it lives exactly
/// as long as the connection slot.
///
/// 主机交给每个钩子的单个连接视图。`ca` 是连接私有的拥塞控制区域，
/// 其生命周期与连接槽位相同。
pub trait TcpSock {
    fn ca(&mut self) -> &mut FlowState;

    fn endpoints(&self) -> Endpoints;

    /// First unacknowledged sequence number.
    fn snd_una(&self) -> u32;

    /// Cached segment size in bytes.
    fn mss_cache(&self) -> u32;

    fn snd_cwnd(&self) -> u32;

    fn snd_ssthresh(&self) -> u32;

    /// Current socket clock in microseconds.
    fn tcp_mstamp(&self) -> u64;

    /// First transmit timestamp of the segment the current sample covers.
    fn first_tx_mstamp(&self) -> u64;

    /// Send-side duration recorded for the segment first sent at
    /// `first_tx_mstamp`, if the host still remembers it.
    ///
    /// 返回首次发送于 `first_tx_mstamp` 的段的发送侧持续时间（若主机仍有记录）。
    fn lookup_send_duration(&self, first_tx_mstamp: u64) -> Option<u64>;

    /// Whether ECN was negotiated for this connection.
    fn ecn_ok(&self) -> bool;

    /// Stop marking outgoing packets as ECN capable.
    fn disable_ecn_transmit(&mut self);

    fn pacing_status(&self) -> PacingStatus;

    fn set_pacing_status(&mut self, status: PacingStatus);

    /// Pacing rate in bytes per second.
    fn pacing_rate(&self) -> u64;

    fn set_pacing_rate(&mut self, rate: u64);
}

/// The hook set a congestion-control algorithm exposes to the host.
///
/// Hooks of one connection are never invoked concurrently with each other;
/// hooks of different connections may run in parallel.
///
/// 拥塞控制算法向主机暴露的钩子集。同一连接的钩子不会并发调用；
/// 不同连接的钩子可能并行执行。
pub trait CongestionOps<S: TcpSock>: Send + Sync {
    fn name(&self) -> &'static str;

    fn init(&self, sk: &mut S);

    fn release(&self, sk: &mut S);

    fn ssthresh(&self, sk: &S) -> u32;

    fn undo_cwnd(&self, sk: &S) -> u32;

    fn in_ack_event(&self, sk: &mut S, flags: AckFlags);

    fn cong_control(&self, sk: &mut S, rs: &RateSample);
}

/// Host-side registration of hook sets.
///
/// 主机侧的钩子集注册接口。
pub trait AlgorithmTable<S: TcpSock>: Send + Sync {
    fn register(&self, ops: Arc<dyn CongestionOps<S>>) -> Result<()>;

    fn unregister(&self, name: &str) -> Option<Arc<dyn CongestionOps<S>>>;
}

/// A `DashMap` backed table of hook sets keyed by name.
///
/// 以名称为键、基于 `DashMap` 的钩子集表。
pub struct AlgorithmDirectory<S: TcpSock> {
    algorithms: DashMap<&'static str, Arc<dyn CongestionOps<S>>>,
}

impl<S: TcpSock> AlgorithmDirectory<S> {
    pub fn new() -> Self {
        Self {
            algorithms: DashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CongestionOps<S>>> {
        self.algorithms.get(name).map(|ops| Arc::clone(ops.value()))
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

impl<S: TcpSock> Default for AlgorithmDirectory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TcpSock> AlgorithmTable<S> for AlgorithmDirectory<S> {
    fn register(&self, ops: Arc<dyn CongestionOps<S>>) -> Result<()> {
        let name = ops.name();
        match self.algorithms.entry(name) {
            Entry::Occupied(_) => Err(Error::AlgorithmAlreadyRegistered(name)),
            Entry::Vacant(vacant) => {
                vacant.insert(ops);
                info!(name, "Congestion control algorithm registered");
                Ok(())
            }
        }
    }

    fn unregister(&self, name: &str) -> Option<Arc<dyn CongestionOps<S>>> {
        let removed = self.algorithms.remove(name).map(|(_, ops)| ops);
        if removed.is_some() {
            info!(name, "Congestion control algorithm unregistered");
        }
        removed
    }
}
