use super::{EvaluationSummary, PartialResult, ScoredResult};

/// Everything one evaluation run produces, ready to persist.
#[derive(Debug, Clone)]
pub struct AggregatedRun {
    pub summary: EvaluationSummary,
    pub detailed_results: Vec<ScoredResult>,
}

/// Fold the per-chunk partials into one summary plus the concatenated
/// detail list. Pure; the caller supplies the timestamp.
///
/// total_questions counts every attempted case, so the averages divide the
/// success-only sums by the attempted count: a chunk with scoring failures
/// depresses the averages rather than shrinking the denominator. Detail
/// order follows the partial order given here, which is chunk completion
/// order, not source row order.
pub fn aggregate(
    evaluation_id: &str,
    evaluation_name: &str,
    test_cases_key: &str,
    timestamp: String,
    partials: Vec<PartialResult>,
) -> AggregatedRun {
    let mut total_similarity = 0.0;
    let mut total_relevance = 0.0;
    let mut total_correctness = 0.0;
    let mut total_questions: i64 = 0;
    let mut detailed_results = Vec::new();

    for partial in partials {
        total_similarity += partial.total_similarity;
        total_relevance += partial.total_relevance;
        total_correctness += partial.total_correctness;
        total_questions += partial.num_test_cases as i64;
        detailed_results.extend(partial.detailed_results);
    }

    let (average_similarity, average_relevance, average_correctness) = if total_questions > 0 {
        let denominator = total_questions as f64;
        (
            total_similarity / denominator,
            total_relevance / denominator,
            total_correctness / denominator,
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    AggregatedRun {
        summary: EvaluationSummary {
            evaluation_id: evaluation_id.to_string(),
            evaluation_name: evaluation_name.to_string(),
            timestamp,
            average_similarity,
            average_relevance,
            average_correctness,
            total_questions,
            test_cases_key: test_cases_key.to_string(),
        },
        detailed_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::ScoringFailure;

    fn scored(question: &str, s: f64, r: f64, c: f64) -> ScoredResult {
        ScoredResult {
            question: question.to_string(),
            expected_response: "expected".to_string(),
            actual_response: "actual".to_string(),
            similarity: s,
            relevance: r,
            correctness: c,
        }
    }

    fn partial(results: Vec<ScoredResult>, failures: usize) -> PartialResult {
        let mut outcomes: Vec<Result<ScoredResult, ScoringFailure>> =
            results.into_iter().map(Ok).collect();
        for i in 0..failures {
            outcomes.push(Err(ScoringFailure {
                question: format!("failed{}", i),
                reason: "scoring error".to_string(),
            }));
        }
        PartialResult::from_outcomes(outcomes)
    }

    fn run(partials: Vec<PartialResult>) -> AggregatedRun {
        aggregate("id-1", "run", "set.csv", "2026-01-01T00:00:00Z".to_string(), partials)
    }

    #[test]
    fn test_totals_sum_across_partials() {
        let a = partial(vec![scored("q1", 0.5, 0.5, 0.5), scored("q2", 0.7, 0.7, 0.7)], 0);
        let b = partial(vec![scored("q3", 0.9, 0.9, 0.9)], 0);
        let out = run(vec![a, b]);
        assert_eq!(out.summary.total_questions, 3);
        assert_eq!(out.detailed_results.len(), 3);
        assert!((out.summary.average_similarity - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_order_of_partials_does_not_change_summary() {
        let a = partial(vec![scored("q1", 0.2, 0.4, 0.6)], 1);
        let b = partial(vec![scored("q2", 0.8, 0.6, 0.4), scored("q3", 0.5, 0.5, 0.5)], 0);
        let c = partial(vec![], 2);

        let forward = run(vec![a.clone(), b.clone(), c.clone()]);
        let reversed = run(vec![c, b, a]);

        assert_eq!(forward.summary.total_questions, reversed.summary.total_questions);
        assert!(
            (forward.summary.average_similarity - reversed.summary.average_similarity).abs()
                < 1e-9
        );
        assert!(
            (forward.summary.average_relevance - reversed.summary.average_relevance).abs() < 1e-9
        );
        assert!(
            (forward.summary.average_correctness - reversed.summary.average_correctness).abs()
                < 1e-9
        );

        // Same detail multiset, possibly different order
        let mut fwd: Vec<String> = forward.detailed_results.iter().map(|d| d.question.clone()).collect();
        let mut rev: Vec<String> = reversed.detailed_results.iter().map(|d| d.question.clone()).collect();
        fwd.sort();
        rev.sort();
        assert_eq!(fwd, rev);
    }

    #[test]
    fn test_zero_questions_yields_zero_averages() {
        let out = run(vec![]);
        assert_eq!(out.summary.total_questions, 0);
        assert_eq!(out.summary.average_similarity, 0.0);
        assert_eq!(out.summary.average_relevance, 0.0);
        assert_eq!(out.summary.average_correctness, 0.0);
        assert!(out.detailed_results.is_empty());

        let all_empty = run(vec![PartialResult::default(), PartialResult::default()]);
        assert_eq!(all_empty.summary.total_questions, 0);
        assert_eq!(all_empty.summary.average_correctness, 0.0);
    }

    // Known property: scoring failures stay in the denominator even though
    // their scores never reach the sums.
    #[test]
    fn test_averages_divide_by_attempted_not_scored_count() {
        let a = partial(vec![scored("q1", 1.0, 1.0, 1.0), scored("q2", 0.8, 0.8, 0.8)], 0);
        let b = partial(vec![], 1); // one attempted, scoring failed
        let out = run(vec![a, b]);

        assert_eq!(out.summary.total_questions, 3);
        assert_eq!(out.detailed_results.len(), 2);
        // (1.0 + 0.8) / 3, not / 2
        assert!((out.summary.average_similarity - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_summary_carries_run_identity() {
        let out = run(vec![partial(vec![scored("q1", 0.5, 0.5, 0.5)], 0)]);
        assert_eq!(out.summary.evaluation_id, "id-1");
        assert_eq!(out.summary.evaluation_name, "run");
        assert_eq!(out.summary.test_cases_key, "set.csv");
        assert_eq!(out.summary.timestamp, "2026-01-01T00:00:00Z");
    }
}
