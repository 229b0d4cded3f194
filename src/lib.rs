//! # Direct Runner Library / Direct Runner 库
//!
//! This library provides the core functionality for the Direct Runner tool,
//! which reconstitutes hardware-verification test cases from a JSONL dataset
//! and runs each one on the host without a container.
//!
//! 此库为 Direct Runner 工具提供核心功能，
//! 它从 JSONL 数据集中还原硬件验证测试用例，并在宿主机上直接运行（无需容器）。
//!
//! ## Modules / 模块
//!
//! - `core` - Data models, dataset parsing, environment resolution and test execution
//! - `infra` - Infrastructure services like process control and file system operations
//! - `reporting` - Text, HTML, JSON and console reports
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 数据模型、数据集解析、环境解析和测试执行
//! - `infra` - 基础设施服务，如进程控制和文件系统操作
//! - `reporting` - 文本、HTML、JSON 和控制台报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod commands;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::config;
pub use crate::core::error::RunnerError;
pub use crate::core::execution;
pub use crate::core::models;

/// Initializes the application's internationalization (i18n).
///
/// An explicit `preferred` language (from `--lang` or the config file) wins;
/// otherwise the system locale is used. The full locale (e.g. "zh-CN") is tried
/// first, then the bare language code (e.g. "en"), then the default "en".
pub fn init(preferred: Option<&str>) -> String {
    let locale = preferred
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    let lang = if available_locales.contains(&locale.as_str()) {
        locale.as_str()
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
    lang.to_string()
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
