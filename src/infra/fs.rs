//! # File System Operations Module / 文件系统操作模块
//!
//! This module materializes a test case's embedded files into its working
//! directory and looks up executables on a search path.
//!
//! 此模块将测试用例内嵌的文件物化到其工作目录中，并在搜索路径上查找可执行文件。

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::core::config::SKELETON_DIRS;
use crate::core::error::RunnerError;
use crate::core::models::TestCase;

/// What the materializer did for one test case.
/// 物化器对一个测试用例所做的操作。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializedTestDir {
    /// Absolute root of the test directory.
    pub root: PathBuf,
    /// Entries written, relative to `root`, solution files first.
    pub written: Vec<String>,
    /// Entries skipped because their name is a container build file.
    pub skipped: Vec<String>,
}

impl MaterializedTestDir {
    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn run_dir(&self) -> PathBuf {
        self.root.join("rundir")
    }
}

/// Creates the fixed skeleton under `root` (idempotent) and writes every
/// entry of both file mappings verbatim, overwriting existing files.
/// Entries whose path equals one of `skip_files` are not written.
///
/// # Errors
/// `UnsafePath` for absolute entries or entries that climb out of `root`;
/// `IoFailure` when a directory or file cannot be written.
///
/// 在 `root` 下创建固定的目录骨架（幂等），并按原样写入两个文件映射中的每个条目，
/// 覆盖已存在的文件。路径等于 `skip_files` 中某项的条目不会被写入。
pub fn materialize(
    case: &TestCase,
    root: &Path,
    skip_files: &[String],
) -> Result<MaterializedTestDir, RunnerError> {
    let root = std::path::absolute(root).map_err(|e| RunnerError::io(root, e))?;

    for dir in SKELETON_DIRS {
        let path = root.join(dir);
        fs::create_dir_all(&path).map_err(|e| RunnerError::io(&path, e))?;
    }

    let mut out = MaterializedTestDir {
        root: root.clone(),
        ..Default::default()
    };

    let entries = case.solution_files.iter().chain(case.harness_files.iter());
    for (rel, content) in entries {
        if skip_files.iter().any(|s| s == rel) {
            out.skipped.push(rel.clone());
            continue;
        }
        let target = safe_join(&root, rel)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| RunnerError::io(parent, e))?;
        }
        fs::write(&target, content.as_bytes()).map_err(|e| RunnerError::io(&target, e))?;
        out.written.push(rel.clone());
    }

    Ok(out)
}

fn safe_join(root: &Path, rel: &str) -> Result<PathBuf, RunnerError> {
    let rel_path = Path::new(rel);
    let ok = !rel.is_empty()
        && rel_path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !ok {
        return Err(RunnerError::UnsafePath(rel.to_string()));
    }
    Ok(root.join(rel_path))
}

/// Finds `prog` on the given `PATH` value. A `prog` containing a path
/// separator is checked directly.
pub fn find_in_path(prog: &str, path_var: Option<&str>) -> Option<PathBuf> {
    if prog.contains('/') {
        let p = PathBuf::from(prog);
        return is_executable(&p).then_some(p);
    }
    let path = path_var?;
    std::env::split_paths(path)
        .map(|dir| dir.join(prog))
        .find(|cand| is_executable(cand))
}

fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        fs::metadata(path)
            .map(|meta| meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Converts a test id into a directory under `prefix`.
pub fn test_dir(prefix: &Path, id: &str) -> PathBuf {
    prefix.join(id)
}
