use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::error::EvaluationError;
use crate::evaluation::{engine, EvaluationRecord, EvaluationSummary};
use crate::state::{RunProgress, SharedState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartEvaluationRequest {
    pub test_cases_key: String,
    /// Display name for the run; derived from the timestamp when omitted.
    #[serde(default, alias = "evalName", alias = "evaluation_name")]
    pub evaluation_name: Option<String>,
}

/// POST /evaluations — run one evaluation to completion and return its
/// persisted summary.
pub async fn start_evaluation(
    State(state): State<SharedState>,
    Json(body): Json<StartEvaluationRequest>,
) -> Result<Json<EvaluationSummary>, EvaluationError> {
    let summary =
        engine::run_evaluation(state, body.test_cases_key, body.evaluation_name).await?;
    Ok(Json(summary))
}

/// GET /evaluations — all run summaries, newest first.
pub async fn list_evaluations(
    State(state): State<SharedState>,
) -> Result<Json<Vec<EvaluationSummary>>, EvaluationError> {
    Ok(Json(state.db.list_summaries()?))
}

/// GET /evaluations/{id} — one run's summary.
pub async fn evaluation_summary(
    State(state): State<SharedState>,
    Path(evaluation_id): Path<String>,
) -> Result<Json<EvaluationSummary>, EvaluationError> {
    state
        .db
        .get_summary(&evaluation_id)?
        .map(Json)
        .ok_or(EvaluationError::EvaluationNotFound(evaluation_id))
}

/// GET /evaluations/{id}/results — detail rows for one run, by question id.
pub async fn evaluation_results(
    State(state): State<SharedState>,
    Path(evaluation_id): Path<String>,
) -> Result<Json<Vec<EvaluationRecord>>, EvaluationError> {
    Ok(Json(state.db.get_details(&evaluation_id)?))
}

/// GET /evaluations/active — in-flight runs with chunk progress.
pub async fn active_evaluations(State(state): State<SharedState>) -> Json<Vec<RunProgress>> {
    let active = state.active.read().await;
    let mut runs: Vec<RunProgress> = active.values().cloned().collect();
    runs.sort_by(|a, b| a.started_at.cmp(&b.started_at));
    Json(runs)
}
