use clap::Parser;
use std::path::PathBuf;

/// Answerbench — evaluates chatbot answer quality against labeled test sets.
#[derive(Parser, Debug, Clone)]
#[command(name = "answerbench")]
pub struct CliArgs {
    /// Directory containing test case CSV files
    #[arg(short = 'd', long = "datasets-dir")]
    pub datasets_dir: PathBuf,

    /// Base URL of the answer generation service
    #[arg(long = "generate-url")]
    pub generate_url: String,

    /// Base URL of the scoring service
    #[arg(long = "score-url")]
    pub score_url: String,

    /// SQLite database file for evaluation results (defaults to
    /// <datasets-dir>/answerbench.db)
    #[arg(long = "db-path")]
    pub db_path: Option<PathBuf>,

    /// HTTP port
    #[arg(long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub datasets_dir: PathBuf,
    pub generate_url: String,
    pub score_url: String,
    pub db_path: PathBuf,
    pub port: u16,
    /// Test cases dispatched to each worker. Fixed at CHUNK_SIZE in
    /// production; integration tests shrink it to exercise multi-chunk runs.
    pub chunk_size: usize,
}

// Port constants
pub const DEFAULT_PORT: u16 = 9880;

// Pipeline constants
pub const CHUNK_SIZE: usize = 50;
pub const GENERATION_TIMEOUT_SECS: u64 = 30;
pub const SCORING_TIMEOUT_SECS: u64 = 60;

impl AppConfig {
    pub fn from_args(args: CliArgs) -> Self {
        let db_path = args
            .db_path
            .unwrap_or_else(|| args.datasets_dir.join("answerbench.db"));

        AppConfig {
            datasets_dir: args.datasets_dir,
            generate_url: trim_base_url(args.generate_url),
            score_url: trim_base_url(args.score_url),
            db_path,
            port: args.port,
            chunk_size: CHUNK_SIZE,
        }
    }
}

/// Endpoint URLs are joined with fixed paths, so a trailing slash would
/// produce a double slash.
fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(db_path: Option<PathBuf>) -> CliArgs {
        CliArgs {
            datasets_dir: PathBuf::from("/tmp/datasets"),
            generate_url: "http://localhost:8000/".to_string(),
            score_url: "http://localhost:8001".to_string(),
            db_path,
            port: DEFAULT_PORT,
        }
    }

    #[test]
    fn test_from_args_trims_trailing_slash() {
        let config = AppConfig::from_args(make_args(None));
        assert_eq!(config.generate_url, "http://localhost:8000");
        assert_eq!(config.score_url, "http://localhost:8001");
    }

    #[test]
    fn test_from_args_defaults_db_path_under_datasets_dir() {
        let config = AppConfig::from_args(make_args(None));
        assert_eq!(config.db_path, PathBuf::from("/tmp/datasets/answerbench.db"));
    }

    #[test]
    fn test_from_args_keeps_explicit_db_path() {
        let config = AppConfig::from_args(make_args(Some(PathBuf::from("/var/db/eval.db"))));
        assert_eq!(config.db_path, PathBuf::from("/var/db/eval.db"));
    }

    #[test]
    fn test_from_args_uses_production_chunk_size() {
        let config = AppConfig::from_args(make_args(None));
        assert_eq!(config.chunk_size, CHUNK_SIZE);
    }
}
