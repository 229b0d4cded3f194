//! Machine-readable report for downstream tooling.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::error::RunnerError;
use crate::core::models::{Report, ReportEntry};

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    total: usize,
    passed: usize,
    failed: usize,
    pass_rate: String,
    results: &'a [ReportEntry],
}

pub fn write_json_report(report: &Report, path: &Path) -> Result<(), RunnerError> {
    let doc = JsonReport {
        generated_at: Utc::now(),
        total: report.total(),
        passed: report.passed(),
        failed: report.failed(),
        pass_rate: report.pass_rate(),
        results: report.entries(),
    };
    let body = serde_json::to_string_pretty(&doc)
        .map_err(|e| RunnerError::io(path, std::io::Error::other(e)))?;
    fs::write(path, body).map_err(|e| RunnerError::io(path, e))
}
