//! # Environment Resolution Unit Tests / 环境解析单元测试
//!
//! Tests for parsing harness declarations and building the runner environment
//! from an explicit ambient snapshot.
//!
//! 测试测试框架声明的解析，以及基于显式环境快照构建运行器环境。

use direct_runner::core::environment::{
    parse_env_declaration, resolve_environment, AmbientEnvironment, EnvironmentPolicy,
};
use direct_runner::core::models::TestCase;
use direct_runner::RunnerError;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

fn case_with_env(env: Option<&str>) -> TestCase {
    TestCase {
        id: "t1".to_string(),
        categories: BTreeSet::new(),
        solution_files: BTreeMap::new(),
        harness_files: BTreeMap::new(),
        environment: env.map(parse_env_declaration),
    }
}

#[cfg(test)]
mod declaration_tests {
    use super::*;

    #[test]
    fn test_comments_blank_and_invalid_lines_are_ignored() {
        let env = parse_env_declaration("# comment\n\nSIM=icarus\nnot a pair\n  TOPLEVEL = dut  \n");
        assert_eq!(env.len(), 2);
        assert_eq!(env["SIM"], "icarus");
        assert_eq!(env["TOPLEVEL"], "dut");
    }

    #[test]
    fn test_only_first_equals_splits() {
        let env = parse_env_declaration("EXTRA_ARGS=-DWIDTH=8 -DDEPTH=4");
        assert_eq!(env["EXTRA_ARGS"], "-DWIDTH=8 -DDEPTH=4");
    }

    #[test]
    fn test_empty_value_and_empty_key() {
        let env = parse_env_declaration("MODULE=\n=orphan\n");
        assert_eq!(env["MODULE"], "");
        assert_eq!(env.len(), 1);
    }
}

#[cfg(test)]
mod resolve_tests {
    use super::*;

    #[test]
    fn test_defaults_fill_required_keys() {
        let ambient = AmbientEnvironment::from_vars([("PATH", "/usr/bin")]);
        let env = resolve_environment(
            &case_with_env(Some("")),
            Path::new("/w/t1"),
            &ambient,
            &EnvironmentPolicy::default(),
        )
        .unwrap();
        assert_eq!(env.get("SIM"), Some("icarus"));
        assert_eq!(env.get("TOPLEVEL_LANG"), Some("verilog"));
        assert_eq!(env.get("TOPLEVEL"), Some(""));
        assert_eq!(env.get("MODULE"), Some(""));
        assert_eq!(env.get("PATH"), Some("/usr/bin"));
        assert_eq!(env.sim(), "icarus");
    }

    #[test]
    fn test_declared_values_override_ambient() {
        let ambient = AmbientEnvironment::from_vars([("SIM", "verilator"), ("TOPLEVEL", "other")]);
        let env = resolve_environment(
            &case_with_env(Some("TOPLEVEL=dut\nMODULE=test_dut")),
            Path::new("/w/t1"),
            &ambient,
            &EnvironmentPolicy::default(),
        )
        .unwrap();
        assert_eq!(env.get("TOPLEVEL"), Some("dut"));
        assert_eq!(env.get("MODULE"), Some("test_dut"));
        // Required keys come from the declaration or the defaults only.
        assert_eq!(env.get("SIM"), Some("icarus"));
    }

    #[test]
    fn test_verilog_sources_are_normalized_per_path() {
        let env = resolve_environment(
            &case_with_env(Some("VERILOG_SOURCES=/code/rtl/a.sv /code/rtl/b.sv\nWAVES=/rundir/w.vcd")),
            Path::new("/w/t1"),
            &AmbientEnvironment::default(),
            &EnvironmentPolicy::default(),
        )
        .unwrap();
        assert_eq!(env.get("VERILOG_SOURCES"), Some("/w/t1/rtl/a.sv /w/t1/rtl/b.sv"));
        assert_eq!(env.get("WAVES"), Some("/w/t1/w.vcd"));
    }

    #[test]
    fn test_required_keys_with_container_paths_are_normalized() {
        let env = resolve_environment(
            &case_with_env(Some("TOPLEVEL=/src/top\nMODULE=/code/tests/test_top\nOTHER=/src/top")),
            Path::new("/w/t1"),
            &AmbientEnvironment::default(),
            &EnvironmentPolicy::default(),
        )
        .unwrap();
        assert_eq!(env.get("TOPLEVEL"), Some("/w/t1/top"));
        assert_eq!(env.get("MODULE"), Some("/w/t1/tests/test_top"));
        assert_eq!(env.get("OTHER"), Some("/w/t1/top"));
        assert_eq!(env.get("SIM"), Some("icarus"));
        assert_eq!(env.get("TOPLEVEL_LANG"), Some("verilog"));
    }

    #[test]
    fn test_search_path_is_prepended() {
        let ambient = AmbientEnvironment::from_vars([("PYTHONPATH", "/opt/lib")]);
        let env = resolve_environment(
            &case_with_env(Some("SIM=icarus")),
            Path::new("/w/t1"),
            &ambient,
            &EnvironmentPolicy::default(),
        )
        .unwrap();
        assert_eq!(env.get("PYTHONPATH"), Some("/w/t1/src:/opt/lib"));
    }

    #[test]
    fn test_search_path_without_existing_value() {
        let env = resolve_environment(
            &case_with_env(Some("SIM=icarus")),
            Path::new("/w/t1"),
            &AmbientEnvironment::default(),
            &EnvironmentPolicy::default(),
        )
        .unwrap();
        assert_eq!(env.get("PYTHONPATH"), Some("/w/t1/src"));
    }

    #[test]
    fn test_missing_declaration_is_an_error() {
        let err = resolve_environment(
            &case_with_env(None),
            Path::new("/w/t1"),
            &AmbientEnvironment::default(),
            &EnvironmentPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RunnerError::MissingEnvDeclaration(name) if name == "src/.env"));
    }

    #[test]
    fn test_ambient_snapshot_is_not_modified() {
        let ambient = AmbientEnvironment::from_vars([("PYTHONPATH", "/opt/lib")]);
        let before = ambient.clone();
        let _ = resolve_environment(
            &case_with_env(Some("SIM=icarus")),
            Path::new("/w/t1"),
            &ambient,
            &EnvironmentPolicy::default(),
        )
        .unwrap();
        assert_eq!(ambient, before);
    }
}
