//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders a styled, self-contained HTML page with the batch
//! totals and one row per test case. Non-passing rows carry a collapsible
//! block with the captured output and a pointer to the persisted log.
//!
//! 此模块渲染一个样式化的独立 HTML 页面，包含批次统计和每个测试用例一行。
//! 未通过的行带有可折叠的区块，显示捕获的输出以及持久化日志的路径。

use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::core::error::RunnerError;
use crate::core::models::{Report, ReportEntry};
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Generates the HTML report and writes it to `output_path`.
///
/// # Errors / 错误
/// `IoFailure` if the file cannot be written.
pub fn generate_html_report(
    report: &Report,
    output_path: &Path,
    locale: &str,
) -> Result<(), RunnerError> {
    let page = render_html_report(report, locale);
    fs::write(output_path, page.into_string()).map_err(|e| RunnerError::io(output_path, e))
}

pub fn render_html_report(report: &Report, locale: &str) -> Markup {
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale).to_string()) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.title", locale = locale).to_string()) }
                div class="meta" {
                    (t!("html_report.generated_at", locale = locale, time = generated).to_string())
                }
                div class="summary-container" {
                    (summary_item(report.total(), &t!("html_report.summary.total", locale = locale), ""))
                    (summary_item(report.passed(), &t!("html_report.summary.passed", locale = locale), "passed-text"))
                    (summary_item(report.failed(), &t!("html_report.summary.failed", locale = locale), "failed-text"))
                    div class="summary-item" {
                        span class="count" { (report.pass_rate()) }
                        span class="label" { (t!("html_report.summary.pass_rate", locale = locale).to_string()) }
                    }
                }
                table {
                    thead {
                        tr {
                            th { (t!("html_report.table.name", locale = locale).to_string()) }
                            th { (t!("html_report.table.categories", locale = locale).to_string()) }
                            th { (t!("html_report.table.status", locale = locale).to_string()) }
                            th class="duration-cell" { (t!("html_report.table.duration", locale = locale).to_string()) }
                        }
                    }
                    tbody {
                        @for entry in report.entries() {
                            (result_row(entry, locale))
                        }
                    }
                }
            }
        }
    }
}

fn summary_item(count: usize, label: &str, class: &str) -> Markup {
    html! {
        div class="summary-item" {
            span class={ "count " (class) } { (count) }
            span class="label" { (label) }
        }
    }
}

fn result_row(entry: &ReportEntry, locale: &str) -> Markup {
    let result = &entry.result;
    let categories = entry
        .categories
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    html! {
        tr {
            td { (entry.id) }
            td { (categories) }
            td {
                div class={ "status-cell " (result.outcome.status_class()) } {
                    (result.outcome.status_str(locale))
                }
                @if !result.is_success() {
                    details {
                        summary { (t!("html_report.toggle_output", locale = locale).to_string()) }
                        @if let Some(pointer) = result.pointer() {
                            p { code { (pointer) } }
                        }
                        pre class="output-content" { (result.combined_output()) }
                    }
                }
            }
            td class="duration-cell" { (format!("{:.2}s", result.duration.as_secs_f64())) }
        }
    }
}
