//! 集成测试共用的主机模拟
//! Host simulation shared by the integration tests

pub mod harness;
