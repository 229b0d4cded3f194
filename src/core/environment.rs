//! # Environment Resolution Module / 环境解析模块
//!
//! Turns a harness `KEY=VALUE` declaration into the full process environment
//! for one test run. The invoking process's environment is captured once into
//! an immutable [`AmbientEnvironment`] and passed down explicitly; nothing in
//! here reads or mutates the global process environment.
//!
//! 将测试框架的 `KEY=VALUE` 声明转换为单次测试运行的完整进程环境。
//! 调用进程的环境只被捕获一次，存入不可变的 [`AmbientEnvironment`] 并显式向下传递；
//! 此模块不会读取或修改全局进程环境。

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::error::RunnerError;
use crate::core::models::TestCase;
use crate::core::paths::PathNormalizer;

pub const SIM: &str = "SIM";
pub const TOPLEVEL_LANG: &str = "TOPLEVEL_LANG";
pub const TOPLEVEL: &str = "TOPLEVEL";
pub const MODULE: &str = "MODULE";
pub const VERILOG_SOURCES: &str = "VERILOG_SOURCES";

/// Keys that are always present in a resolved environment, with their defaults.
/// 解析后的环境中始终存在的键及其默认值。
pub const REQUIRED_DEFAULTS: [(&str, &str); 4] = [
    (SIM, "icarus"),
    (TOPLEVEL_LANG, "verilog"),
    (TOPLEVEL, ""),
    (MODULE, ""),
];

/// Parses a `KEY=VALUE` declaration. Blank lines, `#` comments and lines
/// without `=` are ignored; only the first `=` splits key from value; keys and
/// values are trimmed. Later duplicates win.
///
/// 解析 `KEY=VALUE` 声明。忽略空行、`#` 注释以及不含 `=` 的行；
/// 只有第一个 `=` 用于分隔键和值；键和值都会去除首尾空白。后出现的重复键覆盖先前的。
pub fn parse_env_declaration(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Snapshot of the invoking process's environment.
/// 调用进程环境的快照。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientEnvironment {
    vars: BTreeMap<String, String>,
}

impl AmbientEnvironment {
    /// Captures the current process environment. Non-UTF-8 entries are dropped.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }
}

/// How declared values are rewritten and which variable receives the test's
/// source directory.
#[derive(Debug, Clone)]
pub struct EnvironmentPolicy {
    pub normalizer: PathNormalizer,
    pub search_path_var: String,
    /// Harness entry name, used in diagnostics.
    pub env_file: String,
}

impl Default for EnvironmentPolicy {
    fn default() -> Self {
        Self {
            normalizer: PathNormalizer::default(),
            search_path_var: "PYTHONPATH".to_string(),
            env_file: crate::core::dataset::DEFAULT_ENV_FILE.to_string(),
        }
    }
}

/// The complete environment handed to the external runner.
/// 交给外部运行器的完整环境。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    vars: BTreeMap<String, String>,
}

impl ResolvedEnvironment {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    pub fn sim(&self) -> &str {
        self.get(SIM).unwrap_or_default()
    }
}

/// Builds the environment for `case`, materialized at `test_root`.
///
/// 1. copy the ambient environment;
/// 2. overlay every declared variable, normalizing container paths
///    (`VERILOG_SOURCES` is treated as a list of paths);
/// 3. force the required keys to their declared value or default;
/// 4. prepend `<test_root>/src` to the search-path variable.
///
/// 为物化在 `test_root` 的 `case` 构建运行环境。
pub fn resolve_environment(
    case: &TestCase,
    test_root: &Path,
    ambient: &AmbientEnvironment,
    policy: &EnvironmentPolicy,
) -> Result<ResolvedEnvironment, RunnerError> {
    let declared = case
        .environment
        .as_ref()
        .ok_or_else(|| RunnerError::MissingEnvDeclaration(policy.env_file.clone()))?;

    let mut vars = ambient.vars().clone();

    for (key, value) in declared {
        let value = if key == VERILOG_SOURCES {
            policy.normalizer.normalize_list(value, test_root)
        } else if policy.normalizer.is_container_path(value) {
            policy.normalizer.normalize(value, test_root)
        } else {
            value.clone()
        };
        vars.insert(key.clone(), value);
    }

    // Declared required keys were already written (and normalized) above.
    for (key, default) in REQUIRED_DEFAULTS {
        if !declared.contains_key(key) {
            vars.insert(key.to_string(), default.to_string());
        }
    }

    let src_dir = std::path::absolute(test_root.join("src")).unwrap_or_else(|_| test_root.join("src"));
    let search_path = prepend_search_path(&src_dir, vars.get(&policy.search_path_var));
    vars.insert(policy.search_path_var.clone(), search_path);

    Ok(ResolvedEnvironment { vars })
}

fn prepend_search_path(dir: &Path, existing: Option<&String>) -> String {
    let Some(existing) = existing.filter(|e| !e.is_empty()) else {
        return dir.to_string_lossy().into_owned();
    };
    let mut entries: Vec<PathBuf> = vec![dir.to_path_buf()];
    entries.extend(std::env::split_paths(existing));
    std::env::join_paths(entries)
        .map(OsString::into_string)
        .ok()
        .and_then(Result::ok)
        .unwrap_or_else(|| format!("{}:{existing}", dir.display()))
}
