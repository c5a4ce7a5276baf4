//! Bounded record of recently transmitted segments.
//! 最近发送段的有界记录。

use super::MAX_SKB_STORED;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SentSegment {
    first_tx_mstamp: u64,
    interval_us: u64,
}

/// Round-robin record of `(first transmit timestamp, send interval)` pairs.
///
/// Hosts embed one per socket and answer `lookup_send_duration` from it. The
/// newest entry overwrites the oldest once the record is full.
///
/// 按轮转方式记录 `(首次发送时间戳, 发送区间)` 对。
/// 记录满后，最新条目覆盖最旧条目。
#[derive(Debug, Clone)]
pub struct SentSegmentLog {
    entries: [SentSegment; MAX_SKB_STORED],
    next: usize,
    filled: usize,
}

impl SentSegmentLog {
    pub fn new() -> Self {
        Self {
            entries: [SentSegment::default(); MAX_SKB_STORED],
            next: 0,
            filled: 0,
        }
    }

    pub fn record(&mut self, first_tx_mstamp: u64, interval_us: u64) {
        self.entries[self.next] = SentSegment {
            first_tx_mstamp,
            interval_us,
        };
        self.next = (self.next + 1) % MAX_SKB_STORED;
        self.filled = (self.filled + 1).min(MAX_SKB_STORED);
    }

    /// Linear scan for the send interval of the segment first transmitted at
    /// `first_tx_mstamp`. Zero intervals count as unknown.
    ///
    /// 线性扫描首次发送于 `first_tx_mstamp` 的段的发送区间。区间为零视为未知。
    pub fn lookup_send_duration(&self, first_tx_mstamp: u64) -> Option<u64> {
        self.entries[..self.filled]
            .iter()
            .find(|e| e.first_tx_mstamp == first_tx_mstamp)
            .map(|e| e.interval_us)
            .filter(|&us| us > 0)
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }
}

impl Default for SentSegmentLog {
    fn default() -> Self {
        Self::new()
    }
}
