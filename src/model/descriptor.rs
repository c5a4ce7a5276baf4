//! Layered fixed-point model descriptors.
//! 分层定点模型描述符。
//!
//! A descriptor is produced offline from a declarative layer list and handed
//! to [`ModelRegistry::register_model`](super::ModelRegistry::register_model).
//! How it was produced does not matter here, only that its widths match the
//! application's.

use super::{InferenceModel, ModelUuid};
use crate::error::{Error, Result};

/// One step of a layered model.
///
/// 分层模型中的一层。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    /// `out[j] = (sum_i weights[j * inputs + i] * in[i] + bias[j]) / scale`
    FullyConnected {
        inputs: usize,
        outputs: usize,
        /// Row-major `outputs x inputs`.
        weights: Vec<i64>,
        bias: Vec<i64>,
        /// Fixed-point divisor applied after accumulation. Must be positive.
        scale: i64,
    },
    /// `out[i] = max(in[i], 0)`
    Relu,
}

impl Layer {
    fn output_width(&self, input_width: usize) -> Result<usize> {
        match self {
            Layer::Relu => Ok(input_width),
            Layer::FullyConnected {
                inputs,
                outputs,
                weights,
                bias,
                scale,
            } => {
                if *inputs != input_width {
                    return Err(Error::InvalidDescriptor(format!(
                        "layer expects {inputs} inputs but receives {input_width}"
                    )));
                }
                if weights.len() != inputs * outputs || bias.len() != *outputs {
                    return Err(Error::InvalidDescriptor(format!(
                        "layer {inputs}x{outputs} has {} weights and {} biases",
                        weights.len(),
                        bias.len()
                    )));
                }
                if *scale <= 0 {
                    return Err(Error::InvalidDescriptor(format!(
                        "layer scale must be positive, got {scale}"
                    )));
                }
                Ok(*outputs)
            }
        }
    }

    fn apply(&self, input: &[i64], output: &mut Vec<i64>) {
        output.clear();
        match self {
            Layer::Relu => output.extend(input.iter().map(|&v| v.max(0))),
            Layer::FullyConnected {
                inputs,
                weights,
                bias,
                scale,
                ..
            } => {
                for (row, b) in weights.chunks_exact(*inputs).zip(bias) {
                    let acc = row
                        .iter()
                        .zip(input)
                        .fold(i128::from(*b), |acc, (&w, &x)| {
                            acc + i128::from(w) * i128::from(x)
                        });
                    let v = acc / i128::from(*scale);
                    output.push(i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX }));
                }
            }
        }
    }
}

/// A model version: uuid, declared widths and the ordered layer list.
///
/// 一个模型版本：uuid、声明的宽度以及有序的层列表。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    uuid: ModelUuid,
    input_size: usize,
    output_size: usize,
    layers: Vec<Layer>,
}

impl ModelDescriptor {
    /// Checks that the layer chain maps `input_size` values to
    /// `output_size` values.
    ///
    /// 检查层链是否将 `input_size` 个值映射为 `output_size` 个值。
    pub fn new(
        uuid: ModelUuid,
        input_size: usize,
        output_size: usize,
        layers: Vec<Layer>,
    ) -> Result<Self> {
        let width = layers
            .iter()
            .try_fold(input_size, |width, layer| layer.output_width(width))?;
        if width != output_size {
            return Err(Error::InvalidDescriptor(format!(
                "layers produce {width} outputs, declared {output_size}"
            )));
        }
        Ok(Self {
            uuid,
            input_size,
            output_size,
            layers,
        })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Widest vector the layer chain passes between layers.
    /// 层链中传递的最宽向量宽度。
    pub fn max_width(&self) -> usize {
        self.layers
            .iter()
            .filter_map(|layer| match layer {
                Layer::FullyConnected { outputs, .. } => Some(*outputs),
                Layer::Relu => None,
            })
            .fold(self.input_size, usize::max)
    }
}

impl InferenceModel for ModelDescriptor {
    fn uuid(&self) -> ModelUuid {
        self.uuid
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.output_size
    }

    /// Evaluates the layer chain in two scratch vectors reserved once per
    /// query at the widest layer's width.
    ///
    /// 在两个临时向量中逐层求值，每次查询按最宽层预留一次。
    fn infer(&self, input: &[i64], output: &mut [i64]) {
        let width = self.max_width();
        let mut current = Vec::with_capacity(width);
        current.extend_from_slice(input);
        let mut next = Vec::with_capacity(width);
        for layer in &self.layers {
            layer.apply(&current, &mut next);
            std::mem::swap(&mut current, &mut next);
        }
        let n = output.len().min(current.len());
        output[..n].copy_from_slice(&current[..n]);
    }
}
