#![deny(clippy::expect_used, clippy::unwrap_used)]

//! A congestion-control plugin that hands the sending-rate decision to a
//! learned model.
//! 将发送速率决策交给学习模型的拥塞控制插件。

pub mod config;
pub mod error;

pub mod features;
pub mod history;
pub mod sample;
pub mod stats;

pub mod controller;
pub mod flow;
pub mod host;
pub mod model;
pub mod pacing;
pub mod subsystem;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use controller::LearnedController;
pub use error::{Error, Result};
pub use flow::{FlowState, Lifecycle};
pub use subsystem::Subsystem;
