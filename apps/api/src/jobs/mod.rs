pub mod handlers;

use crate::errors::AppError;
use crate::models::job::{JobStatus, JobType};

/// Checks salary bounds: both non-negative, and `min <= max` when both are set.
pub fn validate_salary(min: Option<i32>, max: Option<i32>) -> Result<(), AppError> {
    if min.is_some_and(|m| m < 0) || max.is_some_and(|m| m < 0) {
        return Err(AppError::Validation(
            "salary cannot be negative".to_string(),
        ));
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(AppError::Validation(format!(
                "salary_min ({min}) cannot exceed salary_max ({max})"
            )));
        }
    }
    Ok(())
}

pub fn parse_job_type(value: &str) -> Result<JobType, AppError> {
    JobType::parse(value).ok_or_else(|| AppError::Validation(format!("Unknown job_type '{value}'")))
}

pub fn parse_job_status(value: &str) -> Result<JobStatus, AppError> {
    JobStatus::parse(value).ok_or_else(|| AppError::Validation(format!("Unknown job status '{value}'")))
}
