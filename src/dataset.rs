use std::path::{Component, Path, PathBuf};

use crate::error::EvaluationError;
use crate::evaluation::TestCase;

// Required CSV columns. Extra columns are ignored.
const QUESTION_COLUMN: &str = "question";
const EXPECTED_COLUMN: &str = "expectedResponse";

/// Parse a CSV dataset into test cases, preserving source row order.
///
/// The header row must name both required columns; a header-only file is a
/// valid empty dataset.
pub fn parse_test_cases(bytes: &[u8]) -> Result<Vec<TestCase>, EvaluationError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| EvaluationError::MalformedInput(e.to_string()))?
        .clone();
    let question_col = column_index(&headers, QUESTION_COLUMN)?;
    let expected_col = column_index(&headers, EXPECTED_COLUMN)?;

    let mut cases = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| EvaluationError::MalformedInput(e.to_string()))?;
        cases.push(TestCase {
            question: record.get(question_col).unwrap_or("").to_string(),
            expected_response: record.get(expected_col).unwrap_or("").to_string(),
        });
    }
    Ok(cases)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, EvaluationError> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        EvaluationError::MalformedInput(format!("missing required column '{}'", name))
    })
}

/// Flat directory of CSV datasets addressed by file name.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    dir: PathBuf,
}

impl DatasetStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Read the raw bytes of a dataset by key.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, EvaluationError> {
        let path = self.dataset_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EvaluationError::DatasetNotFound(key.to_string()))
            }
            Err(e) => Err(EvaluationError::Io(e)),
        }
    }

    /// List available dataset keys (CSV files directly under the dir).
    pub async fn list(&self) -> Result<Vec<String>, EvaluationError> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    // Keys come from HTTP clients; anything that could escape the dataset
    // dir is treated as unknown rather than resolved.
    fn dataset_path(&self, key: &str) -> Result<PathBuf, EvaluationError> {
        let relative = Path::new(key);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir));
        if escapes {
            return Err(EvaluationError::DatasetNotFound(key.to_string()));
        }
        Ok(self.dir.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- parse_test_cases tests ---

    #[test]
    fn test_parse_preserves_row_order() {
        let csv = "question,expectedResponse\nq1,a1\nq2,a2\nq3,a3\n";
        let cases = parse_test_cases(csv.as_bytes()).unwrap();
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0].question, "q1");
        assert_eq!(cases[1].question, "q2");
        assert_eq!(cases[2].expected_response, "a3");
    }

    #[test]
    fn test_parse_header_only_yields_empty() {
        let csv = "question,expectedResponse\n";
        let cases = parse_test_cases(csv.as_bytes()).unwrap();
        assert!(cases.is_empty());
    }

    #[test]
    fn test_parse_missing_question_column_fails() {
        let csv = "prompt,expectedResponse\nq1,a1\n";
        let err = parse_test_cases(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedInput(_)));
        assert!(err.to_string().contains("question"));
    }

    #[test]
    fn test_parse_missing_expected_column_fails() {
        let csv = "question,answer\nq1,a1\n";
        let err = parse_test_cases(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("expectedResponse"));
    }

    #[test]
    fn test_parse_ignores_extra_columns() {
        let csv = "id,question,category,expectedResponse\n7,q1,billing,a1\n";
        let cases = parse_test_cases(csv.as_bytes()).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].question, "q1");
        assert_eq!(cases[0].expected_response, "a1");
    }

    #[test]
    fn test_parse_handles_quoted_multiline_fields() {
        let csv = "question,expectedResponse\n\"line one\nline two\",\"a, with comma\"\n";
        let cases = parse_test_cases(csv.as_bytes()).unwrap();
        assert_eq!(cases[0].question, "line one\nline two");
        assert_eq!(cases[0].expected_response, "a, with comma");
    }

    #[test]
    fn test_parse_empty_input_fails_missing_columns() {
        let err = parse_test_cases(b"").unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedInput(_)));
    }

    // --- DatasetStore tests ---

    #[tokio::test]
    async fn test_read_unknown_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path().to_path_buf());
        let err = store.read("missing.csv").await.unwrap_err();
        assert!(matches!(err, EvaluationError::DatasetNotFound(_)));
    }

    #[tokio::test]
    async fn test_read_rejects_parent_dir_components() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path().to_path_buf());
        let err = store.read("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, EvaluationError::DatasetNotFound(_)));
    }

    #[tokio::test]
    async fn test_read_returns_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("set.csv"), "question,expectedResponse\n").unwrap();
        let store = DatasetStore::new(dir.path().to_path_buf());
        let bytes = store.read("set.csv").await.unwrap();
        assert_eq!(bytes, b"question,expectedResponse\n");
    }

    #[tokio::test]
    async fn test_list_returns_only_csv_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.csv"), "x").unwrap();
        std::fs::write(dir.path().join("a.csv"), "x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let store = DatasetStore::new(dir.path().to_path_buf());
        let keys = store.list().await.unwrap();
        assert_eq!(keys, vec!["a.csv".to_string(), "b.csv".to_string()]);
    }
}
