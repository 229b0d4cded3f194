//! # Error Taxonomy Module / 错误分类模块
//!
//! Errors raised by the extraction-to-execution pipeline. Batch-level
//! conditions (malformed dataset, missing toolchain, unknown identifier)
//! abort a run before any test case executes; per-test conditions
//! (I/O, environment, unsafe paths) are folded into that test case's
//! `error` outcome by the orchestrator.
//!
//! 流水线产生的错误。批量级别的条件（数据集格式错误、缺少工具链、未知标识符）
//! 会在任何测试用例执行之前中止运行；单个测试级别的条件
//! （I/O、环境、不安全路径）由编排器折叠为该测试用例的 `error` 结果。

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// A dataset line is not valid JSON or does not carry a usable identifier.
    /// 数据集中的某一行不是有效的 JSON，或缺少可用的标识符。
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// A materialized file, log, or report could not be written.
    /// 无法写入物化文件、日志或报告。
    #[error("I/O failure at {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A required executable is not on the search path.
    /// 所需的可执行文件不在搜索路径中。
    #[error("required program `{program}` was not found in PATH\n  hint: {hint}")]
    MissingDependency { program: String, hint: String },

    #[error("dataset file not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("dataset {} contains no test cases", .0.display())]
    EmptyDataset(PathBuf),

    #[error("test case '{0}' not found in dataset")]
    UnknownTestCase(String),

    /// The category filter left nothing to run.
    #[error("no test case matches the requested categories: {}", .0.join(", "))]
    NoMatchingCategory(Vec<String>),

    #[error("environment declaration `{0}` not found among the harness files")]
    MissingEnvDeclaration(String),

    #[error("refusing to write outside the test directory: {0}")]
    UnsafePath(String),

    #[error("invalid runner command `{0}`")]
    InvalidCommand(String),

    #[error("invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl RunnerError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RunnerError::IoFailure {
            path: path.into(),
            source,
        }
    }
}
