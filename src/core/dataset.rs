//! # Dataset Record Parser Module / 数据集记录解析模块
//!
//! Decodes newline-delimited JSON records into [`TestCase`] values.
//! Every entry point is fail-fast: the first malformed line stops the read and
//! is reported with its 1-based line number.
//!
//! 将以换行分隔的 JSON 记录解码为 [`TestCase`]。
//! 所有入口都是快速失败的：第一个格式错误的行会停止读取，并报告其行号（从 1 开始）。

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Component, Path, PathBuf};

use crate::core::environment::parse_env_declaration;
use crate::core::error::RunnerError;
use crate::core::models::TestCase;

/// Where the harness keeps its environment declaration.
pub const DEFAULT_ENV_FILE: &str = "src/.env";

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: Option<String>,
    categories: Option<Vec<String>>,
    output: Option<RawOutput>,
    harness: Option<RawHarness>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    context: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct RawHarness {
    files: Option<BTreeMap<String, String>>,
}

impl TestCase {
    /// Decodes one dataset line. `line_no` is only used for diagnostics.
    ///
    /// 解码数据集中的一行。`line_no` 仅用于诊断信息。
    pub fn from_json_line(line: &str, line_no: usize) -> Result<Self, RunnerError> {
        Self::from_json_line_with_env_file(line, line_no, DEFAULT_ENV_FILE)
    }

    pub fn from_json_line_with_env_file(
        line: &str,
        line_no: usize,
        env_file: &str,
    ) -> Result<Self, RunnerError> {
        let malformed = |reason: String| RunnerError::MalformedRecord {
            line: line_no,
            reason,
        };

        let raw: RawRecord = serde_json::from_str(line).map_err(|e| malformed(e.to_string()))?;
        let id = raw
            .id
            .ok_or_else(|| malformed("missing required field `id`".to_string()))?;
        validate_id(&id).map_err(malformed)?;

        let solution_files = raw.output.and_then(|o| o.context).unwrap_or_default();
        let harness_files = raw.harness.and_then(|h| h.files).unwrap_or_default();
        let environment = harness_files
            .get(env_file)
            .map(|text| parse_env_declaration(text));

        Ok(TestCase {
            id,
            categories: raw.categories.unwrap_or_default().into_iter().collect::<BTreeSet<_>>(),
            solution_files,
            harness_files,
            environment,
        })
    }
}

// The id names the per-test directory, so it must be one plain path component.
fn validate_id(id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err("field `id` is empty".to_string());
    }
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !id.contains(['/', '\\']) => Ok(()),
        _ => Err(format!("field `id` is not a plain directory name: {id:?}")),
    }
}

/// A dataset file on disk. Reading is lazy and restartable: every call to
/// [`Dataset::records`] re-opens the file.
///
/// 磁盘上的数据集文件。读取是惰性且可重启的：
/// 每次调用 [`Dataset::records`] 都会重新打开文件。
#[derive(Debug, Clone)]
pub struct Dataset {
    path: PathBuf,
    env_file: String,
}

impl Dataset {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RunnerError> {
        let path = path.into();
        if !path.is_file() {
            return Err(RunnerError::DatasetNotFound(path));
        }
        Ok(Self {
            path,
            env_file: DEFAULT_ENV_FILE.to_string(),
        })
    }

    /// Overrides the harness entry holding the environment declaration.
    pub fn with_env_file(mut self, env_file: impl Into<String>) -> Self {
        self.env_file = env_file.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lazily yields one `TestCase` per non-blank line.
    pub fn records(&self) -> Result<DatasetReader<BufReader<File>>, RunnerError> {
        let file = File::open(&self.path).map_err(|e| RunnerError::io(&self.path, e))?;
        Ok(DatasetReader::new(BufReader::new(file), self.env_file.clone()))
    }

    /// Reads the whole dataset, stopping at the first malformed line.
    /// Duplicate identifiers are rejected. An empty dataset is an error.
    ///
    /// 读取整个数据集，在第一个格式错误的行处停止。
    /// 拒绝重复的标识符。空数据集视为错误。
    pub fn load_all(&self) -> Result<Vec<TestCase>, RunnerError> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut cases = Vec::new();
        let mut reader = self.records()?;

        while let Some(case) = reader.next() {
            let case = case?;
            let line = reader.line_no();
            if let Some(first) = seen.insert(case.id.clone(), line) {
                return Err(RunnerError::MalformedRecord {
                    line,
                    reason: format!(
                        "duplicate identifier '{}' (first seen on line {first})",
                        case.id
                    ),
                });
            }
            cases.push(case);
        }

        if cases.is_empty() {
            return Err(RunnerError::EmptyDataset(self.path.clone()));
        }
        Ok(cases)
    }

    /// Returns the first record with the given identifier. A malformed line
    /// before the match aborts the lookup.
    pub fn find(&self, id: &str) -> Result<TestCase, RunnerError> {
        for case in self.records()? {
            let case = case?;
            if case.id == id {
                return Ok(case);
            }
        }
        Err(RunnerError::UnknownTestCase(id.to_string()))
    }
}

/// Iterator over the records of a JSONL source, skipping blank lines.
pub struct DatasetReader<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
    env_file: String,
    done: bool,
}

impl<R: BufRead> DatasetReader<R> {
    pub fn new(reader: R, env_file: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            env_file: env_file.into(),
            done: false,
        }
    }

    /// 1-based number of the last line read.
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for DatasetReader<R> {
    type Item = Result<TestCase, RunnerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    self.line_no += 1;
                    return Some(Err(RunnerError::MalformedRecord {
                        line: self.line_no,
                        reason: e.to_string(),
                    }));
                }
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let parsed =
                TestCase::from_json_line_with_env_file(&line, self.line_no, &self.env_file);
            if parsed.is_err() {
                self.done = true;
            }
            return Some(parsed);
        }
    }
}
