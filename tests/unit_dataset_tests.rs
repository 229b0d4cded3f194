//! # Dataset Parser Unit Tests / 数据集解析单元测试
//!
//! Tests for decoding JSONL records and reading whole dataset files.
//!
//! 测试 JSONL 记录的解码以及整个数据集文件的读取。

use direct_runner::core::dataset::{Dataset, DatasetReader};
use direct_runner::core::models::TestCase;
use direct_runner::RunnerError;
use std::fs;
use std::io::Cursor;
use tempfile::tempdir;

const FULL_RECORD: &str = r#"{"id":"cvdp_copilot_lfsr_0001","categories":["cid003","easy"],"output":{"context":{"rtl/lfsr.sv":"module lfsr; endmodule"}},"harness":{"files":{"src/.env":"SIM=icarus\nTOPLEVEL=lfsr\nMODULE=test_lfsr\n","src/test_lfsr.py":"import cocotb\n"}}}"#;

#[cfg(test)]
mod record_tests {
    use super::*;

    #[test]
    fn test_full_record_is_decoded() {
        let case = TestCase::from_json_line(FULL_RECORD, 1).unwrap();
        assert_eq!(case.id, "cvdp_copilot_lfsr_0001");
        assert!(case.categories.contains("cid003"));
        assert!(case.categories.contains("easy"));
        assert_eq!(case.solution_files["rtl/lfsr.sv"], "module lfsr; endmodule");
        assert_eq!(case.harness_files.len(), 2);
        let env = case.environment.unwrap();
        assert_eq!(env["SIM"], "icarus");
        assert_eq!(env["TOPLEVEL"], "lfsr");
        assert_eq!(env["MODULE"], "test_lfsr");
    }

    #[test]
    fn test_optional_sections_default_to_empty() {
        let case = TestCase::from_json_line(r#"{"id":"bare"}"#, 1).unwrap();
        assert!(case.categories.is_empty());
        assert!(case.solution_files.is_empty());
        assert!(case.harness_files.is_empty());
        assert!(case.environment.is_none());
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let err = TestCase::from_json_line(r#"{"categories":[]}"#, 7).unwrap_err();
        assert!(matches!(err, RunnerError::MalformedRecord { line: 7, .. }));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = TestCase::from_json_line("{not json", 3).unwrap_err();
        assert!(matches!(err, RunnerError::MalformedRecord { line: 3, .. }));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_unsafe_ids_are_rejected() {
        for id in ["../escape", "a/b", "..", ".", "", "   "] {
            let line = serde_json::json!({ "id": id }).to_string();
            assert!(
                TestCase::from_json_line(&line, 1).is_err(),
                "id {id:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_custom_env_file_location() {
        let line = r#"{"id":"t","harness":{"files":{"env/run.env":"SIM=verilator"}}}"#;
        let case = TestCase::from_json_line_with_env_file(line, 1, "env/run.env").unwrap();
        assert_eq!(case.environment.unwrap()["SIM"], "verilator");
        let default = TestCase::from_json_line(line, 1).unwrap();
        assert!(default.environment.is_none());
    }
}

#[cfg(test)]
mod reader_tests {
    use super::*;

    #[test]
    fn test_blank_lines_are_skipped_and_counted() {
        let input = format!("\n{}\n   \n{}\n", r#"{"id":"a"}"#, r#"{"id":"b"}"#);
        let mut reader = DatasetReader::new(Cursor::new(input), "src/.env");
        assert_eq!(reader.next().unwrap().unwrap().id, "a");
        assert_eq!(reader.line_no(), 2);
        assert_eq!(reader.next().unwrap().unwrap().id, "b");
        assert_eq!(reader.line_no(), 4);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_reader_stops_after_first_malformed_line() {
        let input = "{\"id\":\"a\"}\nbroken\n{\"id\":\"c\"}\n";
        let mut reader = DatasetReader::new(Cursor::new(input), "src/.env");
        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err, RunnerError::MalformedRecord { line: 2, .. }));
        assert!(reader.next().is_none());
    }
}

#[cfg(test)]
mod dataset_file_tests {
    use super::*;

    #[test]
    fn test_load_all_preserves_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.jsonl");
        fs::write(&path, "{\"id\":\"z\"}\n{\"id\":\"a\"}\n{\"id\":\"m\"}\n").unwrap();
        let ids: Vec<_> = Dataset::open(&path)
            .unwrap()
            .load_all()
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, ["z", "a", "m"]);
    }

    #[test]
    fn test_records_can_be_read_twice() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.jsonl");
        fs::write(&path, "{\"id\":\"a\"}\n{\"id\":\"b\"}\n").unwrap();
        let dataset = Dataset::open(&path).unwrap();
        assert_eq!(dataset.records().unwrap().count(), 2);
        assert_eq!(dataset.records().unwrap().count(), 2);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let err = Dataset::open(dir.path().join("nope.jsonl")).unwrap_err();
        assert!(matches!(err, RunnerError::DatasetNotFound(_)));
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.jsonl");
        fs::write(&path, "\n\n").unwrap();
        let err = Dataset::open(&path).unwrap().load_all().unwrap_err();
        assert!(matches!(err, RunnerError::EmptyDataset(_)));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dup.jsonl");
        fs::write(&path, "{\"id\":\"a\"}\n{\"id\":\"b\"}\n{\"id\":\"a\"}\n").unwrap();
        let err = Dataset::open(&path).unwrap().load_all().unwrap_err();
        match err {
            RunnerError::MalformedRecord { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("first seen on line 1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_find_by_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.jsonl");
        fs::write(&path, format!("{{\"id\":\"a\"}}\n{FULL_RECORD}\n")).unwrap();
        let dataset = Dataset::open(&path).unwrap();
        let case = dataset.find("cvdp_copilot_lfsr_0001").unwrap();
        assert_eq!(case.solution_files.len(), 1);
        assert!(matches!(
            dataset.find("missing").unwrap_err(),
            RunnerError::UnknownTestCase(id) if id == "missing"
        ));
    }
}
