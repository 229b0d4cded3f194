//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the end-of-batch summary to the console with color
//! coding and internationalization support.
//!
//! 此模块在控制台打印批次结束时的摘要，带有颜色编码并支持国际化。

use colored::*;
use std::path::Path;

use crate::core::models::{Outcome, Report};
use crate::infra::t;

/// Prints a formatted summary of a batch run.
///
/// 在控制台打印批量运行的格式化摘要。
///
/// # Output Format / 输出格式
/// ```text
/// ================================================================================
/// SUMMARY
/// ================================================================================
/// Total Tests: 3
/// Passed: 2
/// Failed: 1
/// Pass Rate: 66.7%
///
///   - Passed           | cvdp_copilot_lfsr_0001                  |      1.23s
///   - Timeout          | cvdp_copilot_fifo_0002                  |    300.00s
///
/// Report saved to: work_direct/report.txt
/// ================================================================================
/// ```
pub fn print_summary(report: &Report, report_path: &Path, locale: &str) {
    let rule = "=".repeat(80);
    println!("{rule}");
    println!("{}", t!("summary.banner", locale = locale).bold());
    println!("{rule}");
    println!("{}", t!("summary.total", locale = locale, count = report.total()));
    println!(
        "{}",
        t!("summary.passed", locale = locale, count = report.passed()).green()
    );
    let failed = t!("summary.failed", locale = locale, count = report.failed());
    if report.failed() > 0 {
        println!("{}", failed.red());
    } else {
        println!("{failed}");
    }
    println!(
        "{}",
        t!("summary.pass_rate", locale = locale, rate = report.pass_rate())
    );
    println!();

    for entry in report.entries() {
        let outcome = entry.result.outcome;
        let status_str = outcome.status_str(locale);
        let status_colored = match outcome {
            Outcome::Success => status_str.green(),
            Outcome::Failure | Outcome::Timeout => status_str.red(),
            Outcome::Error => status_str.yellow(),
        };
        println!(
            "  - {:<18} | {:<40} | {:>9.2}s",
            status_colored,
            entry.id,
            entry.result.duration.as_secs_f64()
        );
    }

    println!();
    println!(
        "{}",
        t!("summary.report_saved", locale = locale, path = report_path.display())
    );
    println!("{rule}");
}
