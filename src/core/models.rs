//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout the runner:
//! parsed test cases, per-test execution results and the aggregate report.
//!
//! 此模块定义了整个运行器中使用的核心数据结构：
//! 解析后的测试用例、单个测试的执行结果以及汇总报告。

use crate::infra::t;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Sentinel pass rate used when no test case was processed.
pub const NO_TESTS_RUN: &str = "N/A (no tests run)";

/// One self-contained hardware test, as decoded from a dataset record.
/// Immutable once parsed.
///
/// 从数据集记录解码得到的一个独立硬件测试。解析后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique identifier; also names the per-test directory.
    /// 唯一标识符；同时作为每个测试目录的名称。
    pub id: String,
    /// Category tags, unordered.
    /// 类别标签，无序。
    pub categories: BTreeSet<String>,
    /// Design-under-test files (`output.context`), relative path → content.
    /// 被测设计文件（`output.context`），相对路径 → 内容。
    pub solution_files: BTreeMap<String, String>,
    /// Harness files (`harness.files`), relative path → content.
    /// 测试框架文件（`harness.files`），相对路径 → 内容。
    pub harness_files: BTreeMap<String, String>,
    /// Variables parsed from the harness environment declaration, or `None`
    /// when the harness carries no declaration.
    /// 从测试框架环境声明中解析出的变量；若无声明则为 `None`。
    pub environment: Option<BTreeMap<String, String>>,
}

/// The classified result of one test case's execution.
/// 单个测试用例执行的分类结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The runner exited with code 0 before the timeout.
    Success,
    /// The runner exited with a nonzero code.
    Failure,
    /// The timeout elapsed and the process group was killed.
    Timeout,
    /// The run could not be attempted or completed (I/O, environment,
    /// missing simulator, cancellation).
    Error,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Label used in the text report.
    pub fn report_label(self) -> &'static str {
        match self {
            Outcome::Success => "PASS",
            Outcome::Failure => "FAIL",
            Outcome::Timeout => "FAIL [timeout]",
            Outcome::Error => "FAIL [error]",
        }
    }

    /// Localized label for console output.
    pub fn status_str(self, locale: &str) -> String {
        match self {
            Outcome::Success => t!("report.status_passed", locale = locale).to_string(),
            Outcome::Failure => t!("report.status_failed", locale = locale).to_string(),
            Outcome::Timeout => t!("report.status_timeout", locale = locale).to_string(),
            Outcome::Error => t!("report.status_error", locale = locale).to_string(),
        }
    }

    /// CSS class used by the HTML report.
    pub fn status_class(self) -> &'static str {
        match self {
            Outcome::Success => "status-Passed",
            Outcome::Failure => "status-Failed",
            Outcome::Timeout => "status-Timeout",
            Outcome::Error => "status-Error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Timeout => "timeout",
            Outcome::Error => "error",
        };
        f.write_str(s)
    }
}

/// Result of running (or failing to run) one test case. Immutable once built.
///
/// 运行（或未能运行）一个测试用例的结果。构建后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub outcome: Outcome,
    /// Exit code of the runner process, when it exited on its own.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock time around the invocation; zero when nothing was started.
    pub duration: Duration,
    /// Persisted combined log, when one was written.
    pub log_path: Option<PathBuf>,
    /// Human-readable reason for `Error` and `Timeout` outcomes.
    pub message: Option<String>,
}

impl ExecutionResult {
    /// An `error` outcome for a test case that never reached (or could not
    /// finish) its invocation.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Error,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
            log_path: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Stdout and stderr, separated the same way as the persisted log.
    pub fn combined_output(&self) -> String {
        format_log(&self.stdout, &self.stderr)
    }

    /// What the report points at for a non-passing entry: the log when one
    /// exists, otherwise the reason.
    pub fn pointer(&self) -> Option<String> {
        match (&self.log_path, &self.message) {
            (Some(path), _) => Some(format!("Log: {}", path.display())),
            (None, Some(msg)) => Some(format!("Reason: {msg}")),
            (None, None) => None,
        }
    }
}

/// Layout of the persisted log artifact.
pub fn format_log(stdout: &str, stderr: &str) -> String {
    format!("=== STDOUT ===\n{stdout}\n=== STDERR ===\n{stderr}")
}

/// One processed test case in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: String,
    pub categories: BTreeSet<String>,
    pub result: ExecutionResult,
}

/// Results in processing order plus running totals.
/// Built by a single writer (the orchestrator), so no locking is needed.
///
/// 按处理顺序排列的结果以及累计统计。
/// 由单一写入者（编排器）构建，因此无需加锁。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    entries: Vec<ReportEntry>,
    passed: usize,
    failed: usize,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, case: &TestCase, result: ExecutionResult) {
        if result.is_success() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.entries.push(ReportEntry {
            id: case.id.clone(),
            categories: case.categories.clone(),
            result,
        });
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn pass_rate(&self) -> String {
        calculate_pass_rate(self.passed, self.total())
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries
            .iter()
            .filter(|e| e.result.outcome == outcome)
            .count()
    }
}

/// Pass rate as a percentage with one decimal, or the sentinel when `total == 0`.
/// 以一位小数的百分比表示的通过率；当 `total == 0` 时返回哨兵值。
pub fn calculate_pass_rate(passed: usize, total: usize) -> String {
    if total == 0 {
        return NO_TESTS_RUN.to_string();
    }
    format!("{:.1}%", passed as f64 / total as f64 * 100.0)
}
