//! 尽力而为的遥测通道，向所有监听者组播原始模型输入。
//! Best-effort telemetry channel multicasting raw model inputs to listeners.
//!
//! Payload: `input_size * 8` bytes, each value a little-endian `i64`.
//! Nothing is acknowledged and nothing applies backpressure; a report with no
//! listener, or one a slow listener never reads, is dropped silently.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::sync::broadcast;
use tracing::trace;

/// Fixed name listeners subscribe to.
pub const CHANNEL_NAME: &str = "learned_cc";

/// Version of the payload layout.
pub const CHANNEL_VERSION: u8 = 1;

/// One raw model input as sent to listeners.
///
/// 发送给监听者的一份原始模型输入。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputReport {
    pub app_id: u32,
    pub payload: Bytes,
}

impl InputReport {
    /// Decodes the payload back into fixed-point values.
    /// 将载荷解码回定点值。
    pub fn values(&self) -> Vec<i64> {
        let mut buf = self.payload.clone();
        let mut values = Vec::with_capacity(buf.remaining() / 8);
        while buf.remaining() >= 8 {
            values.push(buf.get_i64_le());
        }
        values
    }
}

/// The multicast group reports are pushed to.
///
/// 报告推送到的组播组。
#[derive(Debug, Clone)]
pub struct TelemetryChannel {
    name: &'static str,
    version: u8,
    sender: broadcast::Sender<InputReport>,
}

impl TelemetryChannel {
    pub fn open(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            name: CHANNEL_NAME,
            version: CHANNEL_VERSION,
            sender,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Joins the multicast group.
    /// 加入组播组。
    pub fn subscribe(&self) -> broadcast::Receiver<InputReport> {
        self.sender.subscribe()
    }

    pub fn listeners(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Pushes `input` to every listener. Returns how many listeners the report
    /// reached; zero means it was dropped.
    ///
    /// 将 `input` 推送给所有监听者，返回到达的监听者数量；零表示报告被丢弃。
    pub fn report(&self, app_id: u32, input: &[i64]) -> usize {
        if self.sender.receiver_count() == 0 {
            return 0;
        }
        let mut payload = BytesMut::with_capacity(input.len() * 8);
        for &value in input {
            payload.put_i64_le(value);
        }
        let report = InputReport {
            app_id,
            payload: payload.freeze(),
        };
        match self.sender.send(report) {
            Ok(n) => n,
            Err(_) => {
                trace!(channel = self.name, "telemetry report dropped");
                0
            }
        }
    }
}
