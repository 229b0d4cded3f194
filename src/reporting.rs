//! # Reporting Module / 报告模块
//!
//! This module renders the aggregate report of a batch run: the literal text
//! report written next to the test directories, an optional styled HTML page,
//! an optional JSON document, and the colored console summary.
//!
//! 此模块渲染批量运行的汇总报告：写在测试目录旁边的文本报告、
//! 可选的样式化 HTML 页面、可选的 JSON 文档，以及彩色控制台摘要。

pub mod console;
pub mod html;
pub mod json;
pub mod text;

// Re-export common reporting functions
pub use console::print_summary;
pub use html::generate_html_report;
pub use json::write_json_report;
pub use text::{render_text_report, write_text_report};
