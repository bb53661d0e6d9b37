use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Test case dataset is malformed: {0}")]
    MalformedInput(String),

    #[error("Test case dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Evaluation not found: {0}")]
    EvaluationNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Persistence failed for evaluation {evaluation_id}: {message}")]
    Persistence {
        evaluation_id: String,
        /// Question ids of detail records that were never written.
        missing_question_ids: Vec<i64>,
        message: String,
    },

    #[error("{0}")]
    Other(String),
}

impl EvaluationError {
    pub fn persistence(
        evaluation_id: impl Into<String>,
        missing_question_ids: Vec<i64>,
        message: impl Into<String>,
    ) -> Self {
        EvaluationError::Persistence {
            evaluation_id: evaluation_id.into(),
            missing_question_ids,
            message: message.into(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            EvaluationError::MalformedInput(_) => "malformed_input",
            EvaluationError::DatasetNotFound(_) => "dataset_not_found",
            EvaluationError::EvaluationNotFound(_) => "evaluation_not_found",
            EvaluationError::Io(_) => "io",
            EvaluationError::Database(_) => "database",
            EvaluationError::Persistence { .. } => "persistence",
            EvaluationError::Other(_) => "internal",
        }
    }
}

impl IntoResponse for EvaluationError {
    fn into_response(self) -> Response {
        let status = match &self {
            EvaluationError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            EvaluationError::DatasetNotFound(_) => StatusCode::NOT_FOUND,
            EvaluationError::EvaluationNotFound(_) => StatusCode::NOT_FOUND,
            EvaluationError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EvaluationError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EvaluationError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EvaluationError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        if let EvaluationError::Persistence {
            missing_question_ids,
            ..
        } = &self
        {
            body["missingQuestionIds"] = serde_json::json!(missing_question_ids);
        }

        (status, axum::Json(body)).into_response()
    }
}
