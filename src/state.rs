use crate::config::AppConfig;
use crate::dataset::DatasetStore;
use crate::error::EvaluationError;
use crate::evaluation::db::ResultsDb;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: AppConfig,
    pub db: Arc<ResultsDb>,
    pub datasets: DatasetStore,
    /// In-flight runs keyed by evaluation id. Runs never conflict; each
    /// owns its own entry.
    pub active: RwLock<HashMap<String, RunProgress>>,
    pub http_client: reqwest::Client,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunProgress {
    pub evaluation_id: String,
    pub evaluation_name: String,
    pub test_cases_key: String,
    pub chunks_total: usize,
    pub chunks_completed: usize,
    pub started_at: String,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, EvaluationError> {
        let db = Arc::new(ResultsDb::new(&config.db_path)?);
        let datasets = DatasetStore::new(config.datasets_dir.clone());
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()
            .expect("Failed to create HTTP client");
        Ok(Self {
            config,
            db,
            datasets,
            active: RwLock::new(HashMap::new()),
            http_client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CHUNK_SIZE, DEFAULT_PORT};

    fn make_test_config(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            datasets_dir: dir.to_path_buf(),
            generate_url: "http://localhost:8000".to_string(),
            score_url: "http://localhost:8001".to_string(),
            db_path: dir.join("test.db"),
            port: DEFAULT_PORT,
            chunk_size: CHUNK_SIZE,
        }
    }

    #[test]
    fn test_app_state_construction() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(make_test_config(dir.path())).unwrap();
        assert_eq!(state.config.port, DEFAULT_PORT);
        assert_eq!(state.config.chunk_size, CHUNK_SIZE);
    }

    #[test]
    fn test_app_state_starts_with_no_active_runs() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(make_test_config(dir.path())).unwrap();
        let active = state.active.try_read().unwrap();
        assert!(active.is_empty());
    }

    #[test]
    fn test_app_state_opens_results_db() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(make_test_config(dir.path())).unwrap();
        assert!(state.db.list_summaries().unwrap().is_empty());
        assert!(dir.path().join("test.db").exists());
    }
}
