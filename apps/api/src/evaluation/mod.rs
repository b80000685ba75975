pub mod aggregate;
pub mod handlers;

use std::collections::BTreeMap;

use crate::errors::AppError;
use crate::models::scorecard::Criterion;

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 5;

pub fn validate_rating(rating: i16) -> Result<(), AppError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&rating) {
        return Err(AppError::Validation(format!(
            "rating must be between {MIN_SCORE} and {MAX_SCORE}, got {rating}"
        )));
    }
    Ok(())
}

/// Every score must be in range; with a scorecard, every key must be one of its criteria.
pub fn validate_scores(
    scores: &BTreeMap<String, i16>,
    criteria: Option<&[Criterion]>,
) -> Result<(), AppError> {
    for (key, score) in scores {
        if !(MIN_SCORE..=MAX_SCORE).contains(score) {
            return Err(AppError::Validation(format!(
                "score for '{key}' must be between {MIN_SCORE} and {MAX_SCORE}, got {score}"
            )));
        }
        if let Some(criteria) = criteria {
            if !criteria.iter().any(|c| &c.key == key) {
                return Err(AppError::Validation(format!(
                    "'{key}' is not a criterion of the selected scorecard"
                )));
            }
        }
    }
    Ok(())
}
