//! 模型推理服务接口
//! Model inference service interfaces
//!
//! 职责：
//! - 定义模型与推理服务的抽象
//! - 提供进程内的模型注册表实现
//! - 将历史缓冲区转换为模型查询
//!
//! Responsibilities:
//! - Abstractions for models and the inference service
//! - An in-process model registry implementation
//! - Turning the history buffer into a model query

use crate::error::Result;

pub mod adapter;
pub mod descriptor;
pub mod registry;


pub use adapter::query_rate;
pub use descriptor::{Layer, ModelDescriptor};
pub use registry::ModelRegistry;

/// Identifier of an application that owns a model slot.
pub type AppId = u32;

/// Identifier of one registered model version.
pub type ModelUuid = u32;

/// Declares the vector widths an application expects from its models.
///
/// 声明应用期望模型使用的向量宽度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppDescriptor {
    pub app_id: AppId,
    pub input_size: usize,
    pub output_size: usize,
}

/// An opaque fixed-width function from an input vector to an output vector.
///
/// 从输入向量到输出向量的不透明定宽函数。
pub trait InferenceModel: std::fmt::Debug + Send + Sync {
    fn uuid(&self) -> ModelUuid;

    fn input_size(&self) -> usize;

    fn output_size(&self) -> usize;

    /// Evaluates the model. `input` and `output` have exactly the declared
    /// widths.
    ///
    /// 执行模型。`input` 与 `output` 的长度恰好等于声明的宽度。
    fn infer(&self, input: &[i64], output: &mut [i64]);
}

/// The service the control loop queries.
///
/// Implementations must tolerate many concurrent queries from unrelated
/// flows; the control loop never locks it.
///
/// 控制循环查询的服务。实现必须支持来自不相关流的大量并发查询；控制循环从不对其加锁。
pub trait InferenceService: Send + Sync {
    /// Runs the active model of `app_id`, filling `output`.
    /// 运行 `app_id` 的活动模型并填充 `output`。
    fn query(&self, app_id: AppId, input: &[i64], output: &mut [i64]) -> Result<()>;
}
