//! 定义了插件和每条流的可配置参数。
//! Defines configurable parameters for the plugin and its flows.

use crate::error::{Error, Result};
use crate::features::NUM_INPUT_METRICS;
use std::num::NonZeroU64;

/// Default number of feature vectors kept per flow.
/// 每条流默认保留的特征向量数量。
pub const DEFAULT_HISTORY_LEN: usize = 10;

/// Default application id the plugin registers with the model registry.
/// 插件向模型注册表注册时使用的默认应用ID。
pub const DEFAULT_APP_ID: u32 = 1;

/// Number of values the model returns per query.
/// 模型每次查询返回的值数量。
pub const NUM_OUTPUT_VALUES: usize = 1;

/// Position of the sending rate in the model output.
/// 发送速率在模型输出中的位置。
pub const OUTPUT_RATE: usize = 0;

/// A structure containing all configurable parameters of the plugin.
///
/// 包含插件所有可配置参数的结构体。
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Per-flow history parameters.
    /// 每条流的历史参数。
    pub flow: FlowConfig,

    /// Model registry related parameters.
    /// 模型注册表相关参数。
    pub model: ModelConfig,

    /// Telemetry reporting parameters.
    /// 遥测上报参数。
    pub telemetry: TelemetryConfig,
}

/// Per-flow history parameters.
///
/// 每条流的历史参数。
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// The number of feature vectors retained in each flow's ring buffer.
    /// The model input is `history_len * NUM_INPUT_METRICS` values wide.
    ///
    /// 每条流环形缓冲区中保留的特征向量数量。
    /// 模型输入宽度为 `history_len * NUM_INPUT_METRICS`。
    pub history_len: usize,
}

/// Model registry related parameters.
///
/// 模型注册表相关参数。
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// The application id under which models are queried.
    /// 查询模型时使用的应用ID。
    pub app_id: u32,
    /// The number of values the model is expected to return.
    /// 期望模型返回的值数量。
    pub output_size: usize,
    /// The name under which the hook set is registered with the host.
    /// 向主机注册钩子集时使用的名称。
    pub algorithm_name: &'static str,
}

/// Telemetry reporting parameters.
///
/// 遥测上报参数。
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Report the model input every `n` validated events. `None` disables
    /// reporting and no channel is opened.
    ///
    /// 每 `n` 个有效事件上报一次模型输入。`None` 表示禁用上报，不会打开通道。
    pub report_interval: Option<NonZeroU64>,
    /// Number of reports buffered per listener before the oldest are dropped.
    /// 每个监听者在丢弃最旧报告之前缓冲的报告数量。
    pub channel_capacity: usize,
}

impl Config {
    /// The width of the flattened model input.
    /// 展平后模型输入的宽度。
    pub fn input_size(&self) -> usize {
        self.flow.history_len * NUM_INPUT_METRICS
    }

    /// Checks that the configuration can produce a working subsystem.
    /// 检查配置是否能构建出可用的子系统。
    pub fn validate(&self) -> Result<()> {
        if self.flow.history_len == 0 {
            return Err(Error::Configuration("history_len must be positive".into()));
        }
        if self.model.output_size <= OUTPUT_RATE {
            return Err(Error::Configuration(format!(
                "output_size {} has no rate slot at position {}",
                self.model.output_size, OUTPUT_RATE
            )));
        }
        if self.telemetry.report_interval.is_some() && self.telemetry.channel_capacity == 0 {
            return Err(Error::Configuration(
                "telemetry channel_capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            history_len: DEFAULT_HISTORY_LEN,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID,
            output_size: NUM_OUTPUT_VALUES,
            algorithm_name: "learned_cc",
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            report_interval: None,
            channel_capacity: 64,
        }
    }
}
