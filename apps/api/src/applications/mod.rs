pub mod export;
pub mod handlers;

use crate::errors::AppError;
use crate::models::application::ApplicationStatus;

pub fn parse_status(value: &str) -> Result<ApplicationStatus, AppError> {
    ApplicationStatus::parse(value).ok_or_else(|| {
        let allowed: Vec<&str> = ApplicationStatus::ALL.iter().map(|s| s.as_str()).collect();
        AppError::Validation(format!(
            "Invalid status '{value}'; expected one of {}",
            allowed.join(", ")
        ))
    })
}
