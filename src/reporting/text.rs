//! # Text Report Module / 文本报告模块
//!
//! Renders the aggregate report in its fixed, deterministic text layout.
//! The same input always produces the same bytes: no timestamps, entries in
//! processing order.
//!
//! 以固定且确定性的文本布局渲染汇总报告。
//! 相同的输入总是产生相同的字节：不含时间戳，条目按处理顺序排列。

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::core::error::RunnerError;
use crate::core::models::Report;

pub const REPORT_TITLE: &str = "Direct Test Execution Report";
const RULE_WIDTH: usize = 80;

/// Renders `report` as text.
///
/// # Output Format / 输出格式
/// ```text
/// ================================================================================
/// Direct Test Execution Report
/// ================================================================================
///
/// Total Tests: 2
/// Passed: 1
/// Failed: 1
/// Pass Rate: 50.0%
///
/// ================================================================================
/// Individual Results
/// ================================================================================
///
/// t1: PASS (1.23s)
///
/// t2: FAIL [timeout] (300.00s)
///   Log: work_direct/t2/test_output.log
///
/// ```
pub fn render_text_report(report: &Report) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{rule}\n{REPORT_TITLE}\n{rule}\n");
    let _ = writeln!(out, "Total Tests: {}", report.total());
    let _ = writeln!(out, "Passed: {}", report.passed());
    let _ = writeln!(out, "Failed: {}", report.failed());
    let _ = writeln!(out, "Pass Rate: {}\n", report.pass_rate());
    let _ = writeln!(out, "{rule}\nIndividual Results\n{rule}\n");

    for entry in report.entries() {
        let result = &entry.result;
        let _ = writeln!(
            out,
            "{}: {} ({:.2}s)",
            entry.id,
            result.outcome.report_label(),
            result.duration.as_secs_f64()
        );
        if !result.is_success() {
            if let Some(pointer) = result.pointer() {
                let _ = writeln!(out, "  {pointer}");
            }
        }
        out.push('\n');
    }
    out
}

/// Writes the text report to `path`.
pub fn write_text_report(report: &Report, path: &Path) -> Result<(), RunnerError> {
    fs::write(path, render_text_report(report)).map_err(|e| RunnerError::io(path, e))
}
