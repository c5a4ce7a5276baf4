//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use crate::sample::SampleFlaws;
use thiserror::Error;

/// The primary error type for the learned congestion-control plugin.
/// 学习型拥塞控制插件的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// A rate sample failed validation.
    /// 速率样本未通过校验。
    #[error("invalid rate sample: {0}")]
    InvalidSample(SampleFlaws),

    /// A hook was invoked on a flow without a history buffer.
    /// 在没有历史缓冲区的流上调用了钩子。
    #[error("flow is not managed by the learned controller")]
    Unmanaged,

    /// No model is registered or active for the application.
    /// 该应用没有已注册或已激活的模型。
    #[error("no active model for app {app_id}")]
    ModelUnavailable { app_id: u32 },

    /// The model returned a rate that cannot drive the pacing knob.
    /// 模型返回的速率无法用于设置 pacing。
    #[error("model returned an unusable rate: {0}")]
    InvalidRate(i64),

    /// Preallocated storage could not be reserved.
    /// 无法预留预分配的存储空间。
    #[error("failed to allocate {len} history slots")]
    Allocation { len: usize },

    /// The application id is already registered.
    /// 应用ID已注册。
    #[error("app {0} is already registered")]
    AppAlreadyRegistered(u32),

    /// The application id is unknown to the registry.
    /// 注册表中不存在该应用ID。
    #[error("app {0} is not registered")]
    AppNotRegistered(u32),

    /// A model with the same uuid is already registered for the application.
    /// 该应用已注册了相同uuid的模型。
    #[error("model {uuid} is already registered for app {app_id}")]
    ModelAlreadyRegistered { app_id: u32, uuid: u32 },

    /// The model uuid is unknown for the application.
    /// 该应用中不存在该模型uuid。
    #[error("model {uuid} is not registered for app {app_id}")]
    ModelNotRegistered { app_id: u32, uuid: u32 },

    /// A vector or model does not have the width the application declared.
    /// 向量或模型的宽度与应用声明的不一致。
    #[error("shape mismatch for app {app_id}: expected {expected_input}x{expected_output}, got {input}x{output}")]
    ShapeMismatch {
        app_id: u32,
        expected_input: usize,
        expected_output: usize,
        input: usize,
        output: usize,
    },

    /// A model descriptor's layer chain is inconsistent.
    /// 模型描述符的层链不一致。
    #[error("invalid model descriptor: {0}")]
    InvalidDescriptor(String),

    /// The host already has a congestion-control algorithm with this name.
    /// 主机中已存在同名的拥塞控制算法。
    #[error("congestion control algorithm {0:?} is already registered")]
    AlgorithmAlreadyRegistered(&'static str),

    /// The configuration cannot produce a working subsystem.
    /// 配置无法构建出可用的子系统。
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
