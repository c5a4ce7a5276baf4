//! 模型查询适配器 - 将历史缓冲区转换为速率
//! Model query adapter - turns the history buffer into a rate

use super::{AppId, InferenceService};
use crate::config::OUTPUT_RATE;
use crate::error::{Error, Result};
use crate::history::{FeatureSlots, HistoryRing};
use tracing::trace;

/// Flattens `ring` most-recent-first into `input`, queries `service` and
/// returns the rate slot of the output.
///
/// `input` and `output` are caller-owned so the per-event path does not
/// allocate. A negative rate is reported as [`Error::InvalidRate`].
///
/// 将 `ring` 按最新优先展平到 `input`，查询 `service` 并返回输出中的速率槽位。
/// `input` 与 `output` 由调用方持有，因此每事件路径不进行分配。
pub fn query_rate<T: FeatureSlots>(
    service: &dyn InferenceService,
    app_id: AppId,
    ring: &HistoryRing<T>,
    cursor: usize,
    input: &mut [i64],
    output: &mut [i64],
) -> Result<u64> {
    let written = ring.flatten_into(cursor, input);
    service.query(app_id, &input[..written], output)?;

    let rate = output
        .get(OUTPUT_RATE)
        .copied()
        .ok_or(Error::ModelUnavailable { app_id })?;
    trace!(app_id, rate, "model answered");
    u64::try_from(rate).map_err(|_| Error::InvalidRate(rate))
}
