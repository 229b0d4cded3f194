//! # Core Module / 核心模块
//!
//! This module contains the core functionality of Direct Runner:
//! dataset parsing, path normalization, environment resolution,
//! test execution and result models.
//!
//! 此模块包含 Direct Runner 的核心功能：
//! 数据集解析、路径规范化、环境解析、测试执行和结果模型。

pub mod config;
pub mod dataset;
pub mod environment;
pub mod error;
pub mod execution;
pub mod models;
pub mod paths;
pub mod planner;
pub mod preflight;

// Re-exports
pub use config::RunnerConfig;
pub use dataset::Dataset;
pub use error::RunnerError;
pub use execution::run_test_case;
pub use models::{ExecutionResult, Outcome, Report, TestCase};
