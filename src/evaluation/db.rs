use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::{EvaluationRecord, EvaluationSummary, ScoredResult};
use crate::error::EvaluationError;

pub struct ResultsDb {
    conn: Mutex<Connection>,
}

impl ResultsDb {
    pub fn new(db_path: &Path) -> Result<Self, EvaluationError> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), EvaluationError> {
        let conn = self.conn();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS evaluation_summaries (
                evaluation_id TEXT PRIMARY KEY,
                evaluation_name TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                average_similarity REAL NOT NULL,
                average_relevance REAL NOT NULL,
                average_correctness REAL NOT NULL,
                total_questions INTEGER NOT NULL,
                test_cases_key TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS evaluation_results (
                evaluation_id TEXT NOT NULL REFERENCES evaluation_summaries(evaluation_id) ON DELETE CASCADE,
                question_id INTEGER NOT NULL,
                question TEXT NOT NULL,
                expected_response TEXT NOT NULL,
                actual_response TEXT NOT NULL,
                similarity REAL NOT NULL,
                relevance REAL NOT NULL,
                correctness REAL NOT NULL,
                test_cases_key TEXT NOT NULL,
                PRIMARY KEY (evaluation_id, question_id)
            );

            CREATE INDEX IF NOT EXISTS idx_summaries_timestamp ON evaluation_summaries(timestamp);
        ",
        )?;
        Ok(())
    }

    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ========================================================================
    // Write side
    // ========================================================================

    /// Persist the run summary. evaluation_id is freshly generated per run,
    /// so an overwrite only ever replaces the same run's record.
    pub fn put_summary(&self, summary: &EvaluationSummary) -> Result<(), EvaluationError> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO evaluation_summaries
                (evaluation_id, evaluation_name, timestamp,
                 average_similarity, average_relevance, average_correctness,
                 total_questions, test_cases_key)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                summary.evaluation_id,
                summary.evaluation_name,
                summary.timestamp,
                summary.average_similarity,
                summary.average_relevance,
                summary.average_correctness,
                summary.total_questions,
                summary.test_cases_key,
            ],
        )
        .map_err(|e| {
            EvaluationError::persistence(
                &summary.evaluation_id,
                vec![],
                format!("summary record not written: {}", e),
            )
        })?;
        Ok(())
    }

    /// Persist one detail row per entry, assigning question_id from the
    /// zero-based position in the list. A failure partway through surfaces
    /// the question ids that were never written.
    pub fn put_details(
        &self,
        evaluation_id: &str,
        test_cases_key: &str,
        details: &[ScoredResult],
    ) -> Result<(), EvaluationError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "INSERT OR REPLACE INTO evaluation_results
                    (evaluation_id, question_id, question, expected_response, actual_response,
                     similarity, relevance, correctness, test_cases_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .map_err(|e| {
                EvaluationError::persistence(
                    evaluation_id,
                    (0..details.len() as i64).collect(),
                    format!("detail batch not started: {}", e),
                )
            })?;

        for (idx, detail) in details.iter().enumerate() {
            let question_id = idx as i64;
            if let Err(e) = stmt.execute(params![
                evaluation_id,
                question_id,
                detail.question,
                detail.expected_response,
                detail.actual_response,
                detail.similarity,
                detail.relevance,
                detail.correctness,
                test_cases_key,
            ]) {
                let missing: Vec<i64> = (question_id..details.len() as i64).collect();
                return Err(EvaluationError::persistence(
                    evaluation_id,
                    missing,
                    format!("detail batch failed at question {}: {}", question_id, e),
                ));
            }
        }
        Ok(())
    }

    // ========================================================================
    // Read side
    // ========================================================================

    /// All run summaries, newest first.
    pub fn list_summaries(&self) -> Result<Vec<EvaluationSummary>, EvaluationError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT evaluation_id, evaluation_name, timestamp,
                    average_similarity, average_relevance, average_correctness,
                    total_questions, test_cases_key
             FROM evaluation_summaries ORDER BY timestamp DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EvaluationSummary {
                evaluation_id: row.get(0)?,
                evaluation_name: row.get(1)?,
                timestamp: row.get(2)?,
                average_similarity: row.get(3)?,
                average_relevance: row.get(4)?,
                average_correctness: row.get(5)?,
                total_questions: row.get(6)?,
                test_cases_key: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn get_summary(
        &self,
        evaluation_id: &str,
    ) -> Result<Option<EvaluationSummary>, EvaluationError> {
        let conn = self.conn();
        let result = conn
            .query_row(
                "SELECT evaluation_id, evaluation_name, timestamp,
                        average_similarity, average_relevance, average_correctness,
                        total_questions, test_cases_key
                 FROM evaluation_summaries WHERE evaluation_id=?1",
                params![evaluation_id],
                |row| {
                    Ok(EvaluationSummary {
                        evaluation_id: row.get(0)?,
                        evaluation_name: row.get(1)?,
                        timestamp: row.get(2)?,
                        average_similarity: row.get(3)?,
                        average_relevance: row.get(4)?,
                        average_correctness: row.get(5)?,
                        total_questions: row.get(6)?,
                        test_cases_key: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    /// Detail rows for one run, ordered by question_id ascending. Unknown
    /// ids yield an empty list.
    pub fn get_details(
        &self,
        evaluation_id: &str,
    ) -> Result<Vec<EvaluationRecord>, EvaluationError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT evaluation_id, question_id, question, expected_response, actual_response,
                    similarity, relevance, correctness, test_cases_key
             FROM evaluation_results WHERE evaluation_id=?1 ORDER BY question_id ASC",
        )?;
        let rows = stmt.query_map(params![evaluation_id], |row| {
            Ok(EvaluationRecord {
                evaluation_id: row.get(0)?,
                question_id: row.get(1)?,
                question: row.get(2)?,
                expected_response: row.get(3)?,
                actual_response: row.get(4)?,
                similarity: row.get(5)?,
                relevance: row.get(6)?,
                correctness: row.get(7)?,
                test_cases_key: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
