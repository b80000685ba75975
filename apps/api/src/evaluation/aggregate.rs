//! Aggregation of reviewer evaluations into a per-application summary.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use uuid::Uuid;

use crate::models::evaluation::EvaluationRow;
use crate::models::scorecard::Criterion;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CriterionSummary {
    pub key: String,
    pub label: Option<String>,
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EvaluationSummary {
    pub evaluation_count: usize,
    pub average_rating: Option<f64>,
    pub criteria: Vec<CriterionSummary>,
    pub weighted_score: Option<f64>,
    pub recommendations: BTreeMap<String, usize>,
}

/// Summarizes evaluations. When `criteria` is given, criterion rows follow its
/// order (unknown keys come after, alphabetically) and a weighted score is computed.
pub fn summarize(evaluations: &[EvaluationRow], criteria: Option<&[Criterion]>) -> EvaluationSummary {
    let average_rating = mean(evaluations.iter().map(|e| f64::from(e.rating)));

    // key -> (sum, count)
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for evaluation in evaluations {
        for (key, score) in evaluation.scores.0.iter() {
            let entry = totals.entry(key.as_str()).or_insert((0.0, 0));
            entry.0 += f64::from(*score);
            entry.1 += 1;
        }
    }

    let known = criteria.unwrap_or_default();
    let mut ordered_keys: Vec<&str> = known
        .iter()
        .map(|c| c.key.as_str())
        .filter(|k| totals.contains_key(k))
        .collect();
    let mut extra: Vec<&str> = totals
        .keys()
        .copied()
        .filter(|k| !known.iter().any(|c| c.key == *k))
        .collect();
    extra.sort_unstable();
    ordered_keys.extend(extra);

    let criteria_summaries = ordered_keys
        .into_iter()
        .map(|key| {
            let (sum, count) = totals[key];
            CriterionSummary {
                key: key.to_string(),
                label: known.iter().find(|c| c.key == key).map(|c| c.label.clone()),
                average: round2(sum / count as f64),
                count,
            }
        })
        .collect();

    let weighted_score = criteria.and_then(|criteria| weighted_average(criteria, &totals));

    let mut recommendations = BTreeMap::new();
    for rec in evaluations.iter().filter_map(|e| e.recommendation.as_deref()) {
        *recommendations.entry(rec.to_string()).or_insert(0) += 1;
    }

    EvaluationSummary {
        evaluation_count: evaluations.len(),
        average_rating: average_rating.map(round2),
        criteria: criteria_summaries,
        weighted_score,
        recommendations,
    }
}

/// Σ(weight·avg)/Σ(weight) over the criteria that received at least one score.
fn weighted_average(criteria: &[Criterion], totals: &HashMap<&str, (f64, usize)>) -> Option<f64> {
    let (weighted_sum, weight_sum) = criteria
        .iter()
        .filter_map(|c| {
            totals
                .get(c.key.as_str())
                .map(|(sum, count)| (c.weight * sum / *count as f64, c.weight))
        })
        .fold((0.0, 0.0), |(ws, w), (x, y)| (ws + x, w + y));

    (weight_sum > 0.0).then(|| round2(weighted_sum / weight_sum))
}

/// Scorecard that weights the summary of a set of evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryScorecard {
    /// Every evaluation was scored against this scorecard.
    Shared(Uuid),
    /// No single scorecard is shared; use the company default.
    CompanyDefault,
}

pub fn summary_scorecard(evaluations: &[EvaluationRow]) -> SummaryScorecard {
    match evaluations.first().and_then(|e| e.scorecard_id) {
        Some(first) if evaluations.iter().all(|e| e.scorecard_id == Some(first)) => {
            SummaryScorecard::Shared(first)
        }
        _ => SummaryScorecard::CompanyDefault,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    fn evaluation(rating: i16, scores: &[(&str, i16)], rec: Option<&str>) -> EvaluationRow {
        EvaluationRow {
            id: Uuid::new_v4(),
            application_id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            scorecard_id: None,
            rating,
            scores: Json(scores.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
            recommendation: rec.map(str::to_string),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn criterion(key: &str, weight: f64) -> Criterion {
        Criterion {
            key: key.to_string(),
            label: key.to_uppercase(),
            weight,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[], None);
        assert_eq!(summary.evaluation_count, 0);
        assert_eq!(summary.average_rating, None);
        assert!(summary.criteria.is_empty());
        assert_eq!(summary.weighted_score, None);
    }

    #[test]
    fn test_average_rating_and_criteria() {
        let evals = vec![
            evaluation(4, &[("technical", 5), ("communication", 3)], Some("yes")),
            evaluation(3, &[("technical", 4)], Some("maybe")),
            evaluation(5, &[("technical", 3), ("communication", 4)], Some("yes")),
        ];
        let summary = summarize(&evals, None);
        assert_eq!(summary.evaluation_count, 3);
        assert_eq!(summary.average_rating, Some(4.0));

        // No scorecard: alphabetical
        assert_eq!(summary.criteria[0].key, "communication");
        assert_eq!(summary.criteria[0].average, 3.5);
        assert_eq!(summary.criteria[0].count, 2);
        assert_eq!(summary.criteria[1].key, "technical");
        assert_eq!(summary.criteria[1].average, 4.0);
        assert_eq!(summary.criteria[1].count, 3);

        assert_eq!(summary.recommendations.get("yes"), Some(&2));
        assert_eq!(summary.recommendations.get("maybe"), Some(&1));
    }

    #[test]
    fn test_rating_rounded_to_two_decimals() {
        let evals = vec![evaluation(4, &[], None), evaluation(4, &[], None), evaluation(5, &[], None)];
        assert_eq!(summarize(&evals, None).average_rating, Some(4.33));
    }

    #[test]
    fn test_scorecard_order_and_labels() {
        let evals = vec![evaluation(4, &[("zeta", 2), ("culture", 4), ("alpha", 5)], None)];
        let criteria = vec![criterion("culture", 1.0), criterion("zeta", 1.0)];
        let summary = summarize(&evals, Some(&criteria));
        let keys: Vec<_> = summary.criteria.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["culture", "zeta", "alpha"]);
        assert_eq!(summary.criteria[0].label.as_deref(), Some("CULTURE"));
        assert_eq!(summary.criteria[2].label, None);
    }

    #[test]
    fn test_weighted_score() {
        let evals = vec![
            evaluation(4, &[("technical", 5), ("culture", 2)], None),
            evaluation(4, &[("technical", 3), ("culture", 4)], None),
        ];
        // technical avg 4.0 weight 3, culture avg 3.0 weight 1 -> (12 + 3) / 4 = 3.75
        let criteria = vec![criterion("technical", 3.0), criterion("culture", 1.0)];
        assert_eq!(summarize(&evals, Some(&criteria)).weighted_score, Some(3.75));
    }

    #[test]
    fn test_weighted_score_skips_unscored_criteria() {
        let evals = vec![evaluation(4, &[("technical", 4)], None)];
        let criteria = vec![criterion("technical", 1.0), criterion("culture", 5.0)];
        assert_eq!(summarize(&evals, Some(&criteria)).weighted_score, Some(4.0));
    }

    #[test]
    fn test_weighted_score_none_without_matching_scores() {
        let evals = vec![evaluation(4, &[("other", 4)], None)];
        let criteria = vec![criterion("technical", 1.0)];
        assert_eq!(summarize(&evals, Some(&criteria)).weighted_score, None);
    }

    fn with_scorecard(scorecard_id: Option<Uuid>) -> EvaluationRow {
        EvaluationRow {
            scorecard_id,
            ..evaluation(4, &[], None)
        }
    }

    #[test]
    fn test_summary_scorecard_shared() {
        let id = Uuid::new_v4();
        let evals = vec![with_scorecard(Some(id)), with_scorecard(Some(id))];
        assert_eq!(summary_scorecard(&evals), SummaryScorecard::Shared(id));
    }

    #[test]
    fn test_summary_scorecard_mixed_falls_back_to_default() {
        let evals = vec![
            with_scorecard(Some(Uuid::new_v4())),
            with_scorecard(Some(Uuid::new_v4())),
        ];
        assert_eq!(summary_scorecard(&evals), SummaryScorecard::CompanyDefault);

        let id = Uuid::new_v4();
        let evals = vec![with_scorecard(Some(id)), with_scorecard(None)];
        assert_eq!(summary_scorecard(&evals), SummaryScorecard::CompanyDefault);
    }

    #[test]
    fn test_summary_scorecard_none() {
        assert_eq!(summary_scorecard(&[]), SummaryScorecard::CompanyDefault);
        assert_eq!(
            summary_scorecard(&[with_scorecard(None)]),
            SummaryScorecard::CompanyDefault
        );
    }

    #[test]
    fn test_no_scorecard_means_no_weighted_score() {
        let evals = vec![evaluation(4, &[("technical", 4)], None)];
        assert_eq!(summarize(&evals, None).weighted_score, None);
    }
}
