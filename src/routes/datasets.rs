use axum::extract::State;
use axum::Json;

use crate::error::EvaluationError;
use crate::state::SharedState;

/// GET /datasets — dataset keys available for evaluation.
pub async fn list_datasets(
    State(state): State<SharedState>,
) -> Result<Json<Vec<String>>, EvaluationError> {
    Ok(Json(state.datasets.list().await?))
}
