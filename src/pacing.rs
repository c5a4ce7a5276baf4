//! 速率控制器 - 将模型给出的速率应用到连接的 pacing 上
//! Rate controller - applies model rates to the connection's pacing knob

use crate::host::TcpSock;
use tracing::trace;

/// Whether, and by whom, a socket's packets are paced.
///
/// 套接字数据包是否被 pacing，以及由谁执行。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PacingStatus {
    /// No pacing requested.
    #[default]
    None,
    /// The transport paces internally.
    Needed,
    /// A pacing queue discipline already handles it.
    Fq,
}

/// Asks the transport to pace this socket. Only moves `None` to `Needed`;
/// a socket already paced by a queue discipline is left alone.
///
/// 请求传输层对该套接字进行 pacing。仅将 `None` 变为 `Needed`。
pub fn request_pacing<S: TcpSock>(sk: &mut S) {
    if sk.pacing_status() == PacingStatus::None {
        sk.set_pacing_status(PacingStatus::Needed);
    }
}

/// Sets the pacing rate verbatim. Clamping is the model's responsibility.
///
/// 原样设置 pacing 速率。限幅由模型负责。
#[inline]
pub fn apply_rate<S: TcpSock>(sk: &mut S, rate: u64) {
    sk.set_pacing_rate(rate);
    trace!(rate, "pacing rate applied");
}
