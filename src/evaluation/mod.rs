pub mod aggregate;
pub mod chunker;
pub mod db;
pub mod engine;
pub mod scorer;

use serde::{Deserialize, Serialize};

// ============================================================================
// Shared data model structs
// ============================================================================

/// One labeled question loaded from a dataset. Identity is its position in
/// the source row order; the struct itself carries no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub question: String,
    pub expected_response: String,
}

/// The unit of work handed to one evaluation worker. Built once by the
/// chunker and read-only from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub evaluation_id: String,
    pub evaluation_name: String,
    pub test_cases_key: String,
    pub items: Vec<TestCase>,
}

/// Scores for one test case that made it through both endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    pub question: String,
    pub expected_response: String,
    pub actual_response: String,
    pub similarity: f64,
    pub relevance: f64,
    pub correctness: f64,
}

/// A test case whose scoring call failed. The case still counts toward the
/// attempted total but contributes nothing to the sums or detail list.
#[derive(Debug, Clone)]
pub struct ScoringFailure {
    pub question: String,
    pub reason: String,
}

/// One worker's output for one chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialResult {
    pub detailed_results: Vec<ScoredResult>,
    pub total_similarity: f64,
    pub total_relevance: f64,
    pub total_correctness: f64,
    /// Attempted test cases, successes and scoring failures alike.
    pub num_test_cases: usize,
}

impl PartialResult {
    /// Fold a chunk's per-case outcomes into one partial. Every outcome
    /// counts toward num_test_cases; only successes reach the sums.
    pub fn from_outcomes(outcomes: Vec<Result<ScoredResult, ScoringFailure>>) -> Self {
        let mut partial = PartialResult {
            num_test_cases: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(result) => {
                    partial.total_similarity += result.similarity;
                    partial.total_relevance += result.relevance;
                    partial.total_correctness += result.correctness;
                    partial.detailed_results.push(result);
                }
                Err(failure) => {
                    tracing::warn!(
                        "Scoring failed for '{}', dropping from details: {}",
                        failure.question,
                        failure.reason
                    );
                }
            }
        }
        partial
    }

    /// Stand-in for a worker that died before reporting. Keeps the
    /// dispatched cases in the attempted total.
    pub fn skipped(num_test_cases: usize) -> Self {
        PartialResult {
            num_test_cases,
            ..Default::default()
        }
    }
}

/// The persisted roll-up for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub evaluation_id: String,
    pub evaluation_name: String,
    pub timestamp: String,
    pub average_similarity: f64,
    pub average_relevance: f64,
    pub average_correctness: f64,
    pub total_questions: i64,
    pub test_cases_key: String,
}

/// Scores returned by the scoring endpoint for one answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricScores {
    pub similarity: f64,
    pub relevance: f64,
    pub correctness: f64,
}

/// One persisted detail row. question_id is the zero-based position in the
/// aggregated detail list at persistence time, not the source row index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub evaluation_id: String,
    pub question_id: i64,
    pub question: String,
    pub expected_response: String,
    pub actual_response: String,
    pub similarity: f64,
    pub relevance: f64,
    pub correctness: f64,
    pub test_cases_key: String,
}
