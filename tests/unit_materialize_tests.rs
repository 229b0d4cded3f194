//! # Materializer Unit Tests / 物化器单元测试
//!
//! Tests for writing a test case's files into its working directory.
//!
//! 测试将测试用例的文件写入其工作目录。

use direct_runner::core::models::TestCase;
use direct_runner::infra::fs::{find_in_path, materialize, test_dir};
use direct_runner::RunnerError;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use tempfile::tempdir;

fn skip_list() -> Vec<String> {
    vec!["Dockerfile".to_string(), "docker-compose.yml".to_string()]
}

fn case(solution: &[(&str, &str)], harness: &[(&str, &str)]) -> TestCase {
    let map = |pairs: &[(&str, &str)]| {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>()
    };
    TestCase {
        id: "t1".to_string(),
        categories: BTreeSet::new(),
        solution_files: map(solution),
        harness_files: map(harness),
        environment: None,
    }
}

#[cfg(test)]
mod materialize_tests {
    use super::*;

    #[test]
    fn test_skeleton_and_files_are_written() {
        let dir = tempdir().unwrap();
        let root = test_dir(dir.path(), "t1");
        let case = case(
            &[("rtl/deep/dut.sv", "module dut; endmodule")],
            &[("src/test_dut.py", "import cocotb"), ("src/.env", "SIM=icarus")],
        );

        let out = materialize(&case, &root, &skip_list()).unwrap();

        for sub in ["rtl", "verif", "docs", "src", "rundir"] {
            assert!(root.join(sub).is_dir(), "{sub} missing");
        }
        assert_eq!(
            fs::read_to_string(root.join("rtl/deep/dut.sv")).unwrap(),
            "module dut; endmodule"
        );
        assert_eq!(fs::read_to_string(root.join("src/.env")).unwrap(), "SIM=icarus");
        assert_eq!(out.written[0], "rtl/deep/dut.sv");
        assert_eq!(out.written.len(), 3);
        assert!(out.root.is_absolute());
        assert_eq!(out.run_dir(), out.root.join("rundir"));
    }

    #[test]
    fn test_container_build_files_are_skipped() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("t1");
        let case = case(&[], &[("Dockerfile", "FROM x"), ("docker-compose.yml", "x"), ("a.txt", "a")]);

        let out = materialize(&case, &root, &skip_list()).unwrap();

        assert!(!root.join("Dockerfile").exists());
        assert!(!root.join("docker-compose.yml").exists());
        assert_eq!(out.skipped, ["Dockerfile", "docker-compose.yml"]);
        assert_eq!(out.written, ["a.txt"]);
    }

    #[test]
    fn test_rerun_overwrites_existing_files() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("t1");
        materialize(&case(&[("rtl/a.sv", "old")], &[]), &root, &skip_list()).unwrap();
        materialize(&case(&[("rtl/a.sv", "new")], &[]), &root, &skip_list()).unwrap();
        assert_eq!(fs::read_to_string(root.join("rtl/a.sv")).unwrap(), "new");
    }

    #[test]
    fn test_paths_escaping_the_root_are_refused() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("t1");
        for bad in ["../escape.sv", "/etc/passwd", "rtl/../../x", ""] {
            let err = materialize(&case(&[(bad, "x")], &[]), &root, &skip_list()).unwrap_err();
            assert!(matches!(err, RunnerError::UnsafePath(_)), "{bad:?} was accepted");
        }
        assert!(!dir.path().join("escape.sv").exists());
    }

    #[test]
    fn test_unwritable_root_is_an_io_failure() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let err = materialize(&case(&[], &[]), &blocker.join("t1"), &skip_list()).unwrap_err();
        assert!(matches!(err, RunnerError::IoFailure { .. }));
    }
}

#[cfg(test)]
mod path_lookup_tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_find_in_path_requires_exec_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let exe = dir.path().join("tool");
        let plain = dir.path().join("plain");
        fs::write(&exe, "#!/bin/sh\n").unwrap();
        fs::write(&plain, "").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();

        let path_var = format!("/nonexistent:{}", dir.path().display());
        assert_eq!(find_in_path("tool", Some(&path_var)), Some(exe.clone()));
        assert_eq!(find_in_path("plain", Some(&path_var)), None);
        assert_eq!(find_in_path("tool", None), None);
        assert_eq!(find_in_path(exe.to_str().unwrap(), None), Some(exe));
    }
}
