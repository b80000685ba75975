pub mod handlers;

use std::collections::HashSet;

use crate::errors::AppError;
use crate::models::scorecard::Criterion;

/// Checks a scorecard definition and returns its criteria with trimmed keys and labels.
pub fn validate_criteria(criteria: &[Criterion]) -> Result<Vec<Criterion>, AppError> {
    if criteria.is_empty() {
        return Err(AppError::Validation(
            "A scorecard needs at least one criterion".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(criteria.len());
    for criterion in criteria {
        let key = criterion.key.trim();
        if key.is_empty() {
            return Err(AppError::Validation("criterion key cannot be empty".to_string()));
        }
        if !seen.insert(key.to_string()) {
            return Err(AppError::Validation(format!("duplicate criterion key '{key}'")));
        }
        if !criterion.weight.is_finite() || criterion.weight <= 0.0 {
            return Err(AppError::Validation(format!(
                "weight for '{key}' must be a positive number"
            )));
        }
        let label = match criterion.label.trim() {
            "" => key.to_string(),
            label => label.to_string(),
        };
        cleaned.push(Criterion {
            key: key.to_string(),
            label,
            weight: criterion.weight,
        });
    }
    Ok(cleaned)
}
