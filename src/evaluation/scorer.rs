use serde::Deserialize;
use tracing::warn;

use super::MetricScores;
use crate::config::SCORING_TIMEOUT_SECS;

/// Wrapper shape some scoring deployments return instead of bare scores.
#[derive(Debug, Deserialize)]
struct ScoreEnvelope {
    status: Option<String>,
    error: Option<String>,
    scores: Option<MetricScores>,
}

/// Score one (question, expected, actual) triple against the scoring
/// endpoint. Any transport failure, non-success status, reported error, or
/// unparseable body surfaces as an error; the caller decides what a failed
/// scoring means for the run.
pub async fn score_answer(
    http_client: &reqwest::Client,
    score_url: &str,
    question: &str,
    expected_response: &str,
    actual_response: &str,
) -> anyhow::Result<MetricScores> {
    let response = http_client
        .post(format!("{}/score", score_url))
        .json(&serde_json::json!({
            "question": question,
            "expectedResponse": expected_response,
            "actualResponse": actual_response,
        }))
        .timeout(std::time::Duration::from_secs(SCORING_TIMEOUT_SECS))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Scoring endpoint returned {}: {}", status, preview(&body, 200));
    }

    let body = response.text().await?;
    parse_score_response(&body)
}

/// Parse the scoring endpoint's JSON response into MetricScores.
pub fn parse_score_response(raw: &str) -> anyhow::Result<MetricScores> {
    let trimmed = raw.trim();

    // Try the bare scores object first
    if let Ok(scores) = serde_json::from_str::<MetricScores>(trimmed) {
        return Ok(scores);
    }

    // Fall back to the status envelope
    if let Ok(envelope) = serde_json::from_str::<ScoreEnvelope>(trimmed) {
        if envelope.status.as_deref() == Some("error") {
            anyhow::bail!(
                "Scoring endpoint reported an error: {}",
                envelope.error.unwrap_or_else(|| "unknown".to_string())
            );
        }
        if let Some(scores) = envelope.scores {
            return Ok(scores);
        }
    }

    warn!("Failed to parse score response: {}", preview(trimmed, 200));
    anyhow::bail!(
        "Failed to parse scoring response as valid JSON. Response starts with: {}",
        preview(trimmed, 100)
    )
}

// Truncate on a char boundary for log/error output.
fn preview(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
