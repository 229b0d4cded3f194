// Shared test helpers for integration tests
#![allow(dead_code)]

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

use direct_runner::core::config::RunnerConfig;
use direct_runner::core::environment::AmbientEnvironment;

/// Stand-in for pytest. The first line of the harness `test_runner.py`
/// selects the behavior: `pass`, `fail` or `hang`.
const FAKE_RUNNER: &str = r#"#!/bin/sh
runner=""
for arg in "$@"; do
  case "$arg" in
    *.py) runner="$arg" ;;
  esac
done
mode=$(head -n 1 "$runner")
case "$mode" in
  pass)
    echo "SIM=$SIM TOPLEVEL=$TOPLEVEL MODULE=$MODULE"
    echo "VERILOG_SOURCES=$VERILOG_SOURCES"
    echo "PYTHONPATH=$PYTHONPATH"
    echo "cwd=$(pwd)"
    echo "runner warning" >&2
    exit 0
    ;;
  fail)
    echo "assertion failed"
    echo "traceback" >&2
    exit 3
    ;;
  hang)
    echo "started"
    sleep 30 &
    sleep 30
    exit 0
    ;;
esac
echo "unknown mode: $mode" >&2
exit 2
"#;

/// A temporary workspace with a fake toolchain and room for datasets.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempdir().expect("Failed to create temporary directory");
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).expect("Failed to create bin directory");
        fs::write(bin.join("fake_pytest.sh"), FAKE_RUNNER).expect("Failed to write fake runner");
        write_executable(&bin.join("iverilog"), "#!/bin/sh\nexit 0\n");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.path().join("bin")
    }

    pub fn prefix(&self) -> PathBuf {
        self.path().join("work")
    }

    /// `PATH` with the fake toolchain first, then the system directories.
    pub fn path_var(&self) -> String {
        format!("{}:/usr/local/bin:/usr/bin:/bin", self.bin_dir().display())
    }

    pub fn ambient(&self) -> AmbientEnvironment {
        AmbientEnvironment::from_vars([("PATH", self.path_var()), ("HOME", "/tmp".to_string())])
    }

    /// Runner command that executes the fake runner through `sh`, so the
    /// script itself never has to be executable.
    pub fn runner_command(&self) -> String {
        format!(
            "sh {} -s -o cache_dir={{cache_dir}} {{test_runner}} -v",
            self.bin_dir().join("fake_pytest.sh").display()
        )
    }

    pub fn config(&self) -> RunnerConfig {
        RunnerConfig {
            prefix: self.prefix().to_string_lossy().into_owned(),
            runner_command: self.runner_command(),
            timeout_secs: 20,
            ..RunnerConfig::default()
        }
    }

    /// Writes a TOML config pointing at the fake runner and returns its path.
    pub fn write_config(&self, extra: &str) -> PathBuf {
        let path = self.path().join("runner.toml");
        let content = format!(
            "language = \"en\"\nrunner_command = \"{}\"\n{extra}",
            self.runner_command()
        );
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    pub fn write_dataset(&self, records: &[serde_json::Value]) -> PathBuf {
        let path = self.path().join("dataset.jsonl");
        let body = records
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&path, body + "\n").expect("Failed to write dataset");
        path
    }
}

fn write_executable(path: &Path, content: &str) {
    fs::write(path, content).expect("Failed to write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .expect("Failed to set permissions");
    }
}

/// A dataset record whose harness runner behaves according to `mode`.
pub fn record(id: &str, categories: &[&str], mode: &str) -> serde_json::Value {
    json!({
        "id": id,
        "categories": categories,
        "output": {
            "context": {
                "rtl/dut.sv": "module dut; endmodule\n"
            }
        },
        "harness": {
            "files": {
                "src/.env": "SIM=icarus\nTOPLEVEL=dut\nMODULE=test_dut\nVERILOG_SOURCES=/code/rtl/dut.sv\n",
                "src/test_runner.py": format!("{mode}\n"),
                "Dockerfile": "FROM ubuntu\n",
                "docker-compose.yml": "services: {}\n"
            }
        }
    })
}

/// A record without any environment declaration.
pub fn record_without_env(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "categories": ["cid003"],
        "output": { "context": { "rtl/dut.sv": "module dut; endmodule\n" } },
        "harness": { "files": { "src/test_runner.py": "pass\n" } }
    })
}
