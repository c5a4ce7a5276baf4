//! 预分配的固定容量历史环形缓冲区
//! Preallocated fixed-capacity history ring buffer
//!
//! 职责：
//! - 每条流按时间顺序保存特征向量
//! - 按游标写入，按"最新优先"顺序读出
//! - 展平为模型输入向量
//!
//! Responsibilities:
//! - Keep per-flow feature vectors in time order
//! - Write at the cursor, read back most-recent-first
//! - Flatten into the model input vector

use crate::error::{Error, Result};


/// A fixed-width vector of fixed-point slots that can be flattened into the
/// model input.
///
/// 可以展平为模型输入的定宽定点槽位向量。
pub trait FeatureSlots: Copy + Default {
    /// Number of slots in one vector.
    const WIDTH: usize;

    fn slots(&self) -> &[i64];

    fn from_slots(slots: &[i64]) -> Self;
}

impl<const N: usize> FeatureSlots for [i64; N]
where
    [i64; N]: Default,
{
    const WIDTH: usize = N;

    fn slots(&self) -> &[i64] {
        self
    }

    fn from_slots(slots: &[i64]) -> Self {
        let mut out = [0; N];
        let n = N.min(slots.len());
        out[..n].copy_from_slice(&slots[..n]);
        out
    }
}

/// Circular store of per-round feature vectors.
///
/// The storage is reserved once and never resized. Slots that have not been
/// written yet hold `T::default()`.
///
/// 每轮特征向量的循环存储。存储只预留一次，从不调整大小。
/// 尚未写入的槽位保存 `T::default()`。
#[derive(Debug, Clone)]
pub struct HistoryRing<T: FeatureSlots> {
    slots: Box<[T]>,
}

impl<T: FeatureSlots> HistoryRing<T> {
    /// Reserves `len` zero-filled slots, reporting allocation failure instead
    /// of aborting.
    ///
    /// 预留 `len` 个零填充槽位，分配失败时返回错误而不是中止。
    pub fn try_new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::Allocation { len });
        }
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|_| Error::Allocation { len })?;
        slots.resize(len, T::default());
        Ok(Self {
            slots: slots.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Width of the flattened read-out.
    /// 展平读出的宽度。
    #[inline]
    pub fn flat_len(&self) -> usize {
        self.len() * T::WIDTH
    }

    /// Overwrites the vector at `cursor`.
    /// 覆盖 `cursor` 处的向量。
    #[inline]
    pub fn write(&mut self, cursor: usize, vector: T) {
        let idx = cursor % self.len();
        self.slots[idx] = vector;
    }

    #[inline]
    pub fn get(&self, cursor: usize) -> &T {
        &self.slots[cursor % self.len()]
    }

    /// The slot after `cursor`, wrapping at the end of the ring.
    /// `cursor` 之后的槽位，在环尾回绕。
    #[inline]
    pub fn advance(&self, cursor: usize) -> usize {
        (cursor % self.len() + 1) % self.len()
    }

    /// Iterates over every slot from the one at `cursor` backwards in time.
    ///
    /// Yields exactly `len()` items: `(cursor + len - k) % len` for
    /// `k = 0..len`.
    ///
    /// 从 `cursor` 处的槽位开始按时间倒序遍历所有槽位，恰好产生 `len()` 项。
    pub fn read_chronological_reverse(&self, cursor: usize) -> ReverseChronological<'_, T> {
        ReverseChronological {
            ring: self,
            cursor: cursor % self.len(),
            step: 0,
        }
    }

    /// Writes the most-recent-first read-out into `out`, slot by slot.
    ///
    /// Returns the number of values written, which is `flat_len()` when `out`
    /// is large enough.
    ///
    /// 将"最新优先"的读出结果逐槽写入 `out`，返回写入的值数量。
    pub fn flatten_into(&self, cursor: usize, out: &mut [i64]) -> usize {
        let mut pos = 0;
        for vector in self.read_chronological_reverse(cursor) {
            let slots = vector.slots();
            let end = pos + slots.len();
            if end > out.len() {
                break;
            }
            out[pos..end].copy_from_slice(slots);
            pos = end;
        }
        pos
    }

    /// Rebuilds the ordered vectors from a flattened read-out.
    /// 从展平的读出结果重建有序向量。
    pub fn unflatten<'a>(flat: &'a [i64]) -> impl Iterator<Item = T> + 'a
    where
        T: 'a,
    {
        flat.chunks_exact(T::WIDTH).map(T::from_slots)
    }
}

/// Lazy most-recent-first iterator over a [`HistoryRing`].
///
/// [`HistoryRing`] 的惰性"最新优先"迭代器。
pub struct ReverseChronological<'a, T: FeatureSlots> {
    ring: &'a HistoryRing<T>,
    cursor: usize,
    step: usize,
}

impl<'a, T: FeatureSlots> Iterator for ReverseChronological<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.ring.len();
        if self.step >= len {
            return None;
        }
        let idx = (self.cursor + len - self.step) % len;
        self.step += 1;
        Some(&self.ring.slots[idx])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ring.len() - self.step;
        (remaining, Some(remaining))
    }
}

impl<T: FeatureSlots> ExactSizeIterator for ReverseChronological<'_, T> {}
