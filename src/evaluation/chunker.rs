use chrono::Utc;
use uuid::Uuid;

use super::{Chunk, TestCase};

/// Planned fan-out for one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationPlan {
    pub evaluation_id: String,
    pub evaluation_name: String,
    pub chunks: Vec<Chunk>,
}

/// Partition test cases into worker-sized chunks.
///
/// Produces ceil(N / chunk_size) chunks; every chunk except possibly the
/// last holds exactly chunk_size cases. No case is dropped or reordered.
/// A zero chunk size is treated as one. A blank or missing name falls back
/// to one derived from the current time.
pub fn plan_evaluation(
    test_cases: &[TestCase],
    chunk_size: usize,
    evaluation_name: Option<String>,
    test_cases_key: &str,
) -> EvaluationPlan {
    let chunk_size = chunk_size.max(1);
    let evaluation_id = Uuid::new_v4().to_string();
    let evaluation_name = evaluation_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| format!("Evaluation on {}", Utc::now().to_rfc3339()));

    let chunks = test_cases
        .chunks(chunk_size)
        .map(|items| Chunk {
            evaluation_id: evaluation_id.clone(),
            evaluation_name: evaluation_name.clone(),
            test_cases_key: test_cases_key.to_string(),
            items: items.to_vec(),
        })
        .collect();

    EvaluationPlan {
        evaluation_id,
        evaluation_name,
        chunks,
    }
}
