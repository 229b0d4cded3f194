//! # Test Execution Planner Module / 测试执行计划模块
//!
//! Applies the identifier and category filters to a loaded dataset.
//!
//! 对已加载的数据集应用标识符和类别过滤。

use crate::core::error::RunnerError;
use crate::core::models::TestCase;

/// Represents the set of test cases selected for a batch run.
/// 表示为一次批量运行选出的测试用例集合。
#[derive(Debug)]
pub struct ExecutionPlan {
    /// Cases to run, in dataset order.
    /// 要运行的用例，按数据集顺序排列。
    pub cases_to_run: Vec<TestCase>,
    /// Number of records in the dataset before filtering.
    pub dataset_count: usize,
    /// Cases removed by the category filter.
    pub filtered_category_count: usize,
}

/// Creates an execution plan.
///
/// # Arguments
/// * `cases` - The full dataset, in file order
/// * `id` - Optional identifier filter; zero matches is an error
/// * `categories` - Optional category filter; a case is kept when it carries
///   any of them. Empty means no filtering. A non-empty filter that keeps
///   nothing is an error.
///
/// 创建执行计划。标识符过滤或类别过滤零匹配时返回错误。
pub fn plan_execution(
    cases: Vec<TestCase>,
    id: Option<&str>,
    categories: &[String],
) -> Result<ExecutionPlan, RunnerError> {
    let dataset_count = cases.len();

    let cases: Vec<TestCase> = match id {
        Some(id) => {
            let matched: Vec<_> = cases.into_iter().filter(|c| c.id == id).collect();
            if matched.is_empty() {
                return Err(RunnerError::UnknownTestCase(id.to_string()));
            }
            matched
        }
        None => cases,
    };

    let (cases_to_run, filtered): (Vec<_>, Vec<_>) = cases.into_iter().partition(|case| {
        categories.is_empty() || categories.iter().any(|c| case.categories.contains(c))
    });

    if !categories.is_empty() && cases_to_run.is_empty() {
        return Err(RunnerError::NoMatchingCategory(categories.to_vec()));
    }

    Ok(ExecutionPlan {
        cases_to_run,
        dataset_count,
        filtered_category_count: filtered.len(),
    })
}
