use chrono::Utc;
use futures::future::join_all;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use super::aggregate::aggregate;
use super::chunker::plan_evaluation;
use super::{scorer, Chunk, EvaluationSummary, PartialResult, ScoredResult, ScoringFailure};
use crate::config::{AppConfig, GENERATION_TIMEOUT_SECS};
use crate::dataset;
use crate::error::EvaluationError;
use crate::state::{RunProgress, SharedState};

/// Fetch the live answer for one question. Every question is asked with an
/// empty chat history so prior cases cannot leak into the answer.
async fn fetch_answer(
    http_client: &reqwest::Client,
    generate_url: &str,
    question: &str,
) -> anyhow::Result<String> {
    let resp = http_client
        .post(format!("{}/generate", generate_url))
        .json(&serde_json::json!({
            "userMessage": question,
            "chatHistory": [],
        }))
        .timeout(std::time::Duration::from_secs(GENERATION_TIMEOUT_SECS))
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("generate returned {}: {}", status, body);
    }

    let gen_resp: serde_json::Value = resp.json().await?;
    gen_resp["modelResponse"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("No modelResponse in generate response"))
}

/// Evaluate one chunk, case by case in order. A failed generation degrades
/// to scoring the empty string; a failed scoring keeps the case in the
/// attempted count but out of the details. The chunk itself never fails.
pub async fn evaluate_chunk(
    http_client: &reqwest::Client,
    config: &AppConfig,
    chunk: &Chunk,
) -> PartialResult {
    let mut outcomes = Vec::with_capacity(chunk.items.len());

    for case in &chunk.items {
        let actual_response =
            match fetch_answer(http_client, &config.generate_url, &case.question).await {
                Ok(answer) => answer,
                Err(e) => {
                    warn!("Generation failed for '{}': {}", case.question, e);
                    String::new()
                }
            };

        let outcome = match scorer::score_answer(
            http_client,
            &config.score_url,
            &case.question,
            &case.expected_response,
            &actual_response,
        )
        .await
        {
            Ok(scores) => Ok(ScoredResult {
                question: case.question.clone(),
                expected_response: case.expected_response.clone(),
                actual_response,
                similarity: scores.similarity,
                relevance: scores.relevance,
                correctness: scores.correctness,
            }),
            Err(e) => Err(ScoringFailure {
                question: case.question.clone(),
                reason: e.to_string(),
            }),
        };
        outcomes.push(outcome);
    }

    PartialResult::from_outcomes(outcomes)
}

/// Fold one worker's join outcome. A dead worker still counts its
/// dispatched cases.
fn settle_worker(
    index: usize,
    outcome: Result<PartialResult, JoinError>,
    chunk_len: usize,
) -> PartialResult {
    match outcome {
        Ok(partial) => partial,
        Err(e) => {
            error!("Worker for chunk {} died: {}", index, e);
            PartialResult::skipped(chunk_len)
        }
    }
}

/// Run one evaluation end to end: load the dataset, fan chunks out to
/// parallel workers, wait for every worker, aggregate, persist.
///
/// The pipeline itself executes on a detached task. A caller that goes away
/// mid-run (a dropped request future) cannot abort it: the run still
/// persists its outcome and clears its active-map entry.
pub async fn run_evaluation(
    state: SharedState,
    test_cases_key: String,
    evaluation_name: Option<String>,
) -> Result<EvaluationSummary, EvaluationError> {
    let run = tokio::spawn(execute_run(state, test_cases_key, evaluation_name));
    match run.await {
        Ok(outcome) => outcome,
        Err(e) => Err(EvaluationError::Other(format!(
            "evaluation task did not complete: {}",
            e
        ))),
    }
}

async fn execute_run(
    state: SharedState,
    test_cases_key: String,
    evaluation_name: Option<String>,
) -> Result<EvaluationSummary, EvaluationError> {
    let bytes = state.datasets.read(&test_cases_key).await?;
    let test_cases = dataset::parse_test_cases(&bytes)?;
    let plan = plan_evaluation(
        &test_cases,
        state.config.chunk_size,
        evaluation_name,
        &test_cases_key,
    );
    let evaluation_id = plan.evaluation_id.clone();
    let evaluation_name = plan.evaluation_name.clone();

    info!(
        "Evaluation {} started: {} test cases in {} chunks",
        evaluation_id,
        test_cases.len(),
        plan.chunks.len()
    );

    {
        let mut active = state.active.write().await;
        active.insert(
            evaluation_id.clone(),
            RunProgress {
                evaluation_id: evaluation_id.clone(),
                evaluation_name: evaluation_name.clone(),
                test_cases_key: test_cases_key.clone(),
                chunks_total: plan.chunks.len(),
                chunks_completed: 0,
                started_at: Utc::now().to_rfc3339(),
            },
        );
    }

    let chunk_sizes: Vec<usize> = plan.chunks.iter().map(|c| c.items.len()).collect();
    let mut handles = Vec::with_capacity(plan.chunks.len());
    for (index, chunk) in plan.chunks.into_iter().enumerate() {
        let worker_state = state.clone();
        let run_id = evaluation_id.clone();
        handles.push(tokio::spawn(async move {
            let partial =
                evaluate_chunk(&worker_state.http_client, &worker_state.config, &chunk).await;
            info!(
                "Chunk {} of evaluation {} complete: {} of {} attempted cases scored",
                index,
                run_id,
                partial.detailed_results.len(),
                partial.num_test_cases
            );
            if let Some(progress) = worker_state.active.write().await.get_mut(&run_id) {
                progress.chunks_completed += 1;
            }
            partial
        }));
    }

    // Barrier: aggregation must not start before every chunk has reported.
    let joined = join_all(handles).await;
    let partials: Vec<PartialResult> = joined
        .into_iter()
        .enumerate()
        .map(|(index, outcome)| settle_worker(index, outcome, chunk_sizes[index]))
        .collect();

    let aggregated = aggregate(
        &evaluation_id,
        &evaluation_name,
        &test_cases_key,
        Utc::now().to_rfc3339(),
        partials,
    );

    let persisted = state.db.put_summary(&aggregated.summary).and_then(|_| {
        state
            .db
            .put_details(&evaluation_id, &test_cases_key, &aggregated.detailed_results)
    });

    state.active.write().await.remove(&evaluation_id);
    persisted?;

    info!(
        "Evaluation {} completed: {} questions, {} details persisted",
        evaluation_id,
        aggregated.summary.total_questions,
        aggregated.detailed_results.len()
    );

    Ok(aggregated.summary)
}
