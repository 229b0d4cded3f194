//! # Path Normalization Module / 路径规范化模块
//!
//! Dataset records were written for a container where the design lives under
//! fixed mount points (`/code/`, `/src/`, `/rundir/`). This module rewrites
//! those container paths into real paths under a test's materialized root.
//!
//! 数据集记录是为容器环境编写的，其中设计文件位于固定挂载点
//! （`/code/`、`/src/`、`/rundir/`）之下。此模块将这些容器路径
//! 重写为测试物化根目录下的真实路径。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a matched container prefix is redirected to.
/// 匹配到的容器前缀被重定向的位置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteTarget {
    /// `abs(base_dir) + "/"`
    BaseDir,
    /// `abs(base_dir) + "/" + name + "/"`
    Subdir(String),
}

/// One row of the rewrite table: a container prefix and its replacement rule.
/// 重写表中的一行：容器前缀及其替换规则。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRule {
    pub prefix: String,
    #[serde(default = "default_target")]
    pub target: RewriteTarget,
}

fn default_target() -> RewriteTarget {
    RewriteTarget::BaseDir
}

impl PrefixRule {
    pub fn to_base_dir(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target: RewriteTarget::BaseDir,
        }
    }
}

/// The container mount points used by the dataset format, in priority order.
pub const CONTAINER_PREFIXES: [&str; 3] = ["/code/", "/src/", "/rundir/"];

/// An ordered prefix-rewrite policy. The first matching rule wins.
/// 有序的前缀重写策略。第一个匹配的规则生效。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNormalizer {
    rules: Vec<PrefixRule>,
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self {
            rules: CONTAINER_PREFIXES
                .iter()
                .map(|p| PrefixRule::to_base_dir(*p))
                .collect(),
        }
    }
}

impl PathNormalizer {
    /// Appends extra rules after the built-in container prefixes.
    pub fn with_rules(mut self, extra: impl IntoIterator<Item = PrefixRule>) -> Self {
        self.rules.extend(extra);
        self
    }

    pub fn rules(&self) -> &[PrefixRule] {
        &self.rules
    }

    /// Returns `true` if `value` starts with any recognized container prefix.
    pub fn is_container_path(&self, value: &str) -> bool {
        self.rules.iter().any(|r| value.starts_with(&r.prefix))
    }

    /// Rewrites the first matching container prefix of `path` to a real path
    /// under `base_dir`. Paths matching no rule are returned unchanged.
    ///
    /// 将 `path` 的第一个匹配容器前缀重写为 `base_dir` 下的真实路径。
    /// 不匹配任何规则的路径原样返回。
    pub fn normalize(&self, path: &str, base_dir: &Path) -> String {
        let Some(rule) = self.rules.iter().find(|r| path.starts_with(&r.prefix)) else {
            return path.to_string();
        };

        let base = absolute_base(base_dir);
        let replacement = match &rule.target {
            RewriteTarget::BaseDir => format!("{base}/"),
            RewriteTarget::Subdir(name) => format!("{base}/{}/", name.trim_matches('/')),
        };
        format!("{replacement}{}", &path[rule.prefix.len()..])
    }

    /// Normalizes every whitespace-separated path in `value`.
    /// Used for list-valued variables such as `VERILOG_SOURCES`.
    pub fn normalize_list(&self, value: &str, base_dir: &Path) -> String {
        value
            .split_whitespace()
            .map(|token| self.normalize(token, base_dir))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Normalizes a dataset path with the built-in container prefix table.
pub fn normalize_dataset_path(path: &str, base_dir: &Path) -> String {
    PathNormalizer::default().normalize(path, base_dir)
}

// `std::path::absolute` does not touch the filesystem; fall back to the input
// so normalization stays total.
fn absolute_base(base_dir: &Path) -> String {
    let abs: PathBuf = std::path::absolute(base_dir).unwrap_or_else(|_| base_dir.to_path_buf());
    let s = abs.to_string_lossy();
    let trimmed = s.trim_end_matches('/');
    trimmed.to_string()
}
