//! Public careers surface: job listings, widget config, XML feed and the apply endpoint.

pub mod feed;
pub mod handlers;

use crate::errors::AppError;

pub const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

const RESUME_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];
const RESUME_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Accepts a resume when either its content type or its file extension is a known document type.
pub fn validate_resume(
    filename: &str,
    content_type: Option<&str>,
    size: usize,
) -> Result<(), AppError> {
    if size == 0 {
        return Err(AppError::Validation("resume file is empty".to_string()));
    }
    if size > MAX_RESUME_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "resume exceeds {} MiB",
            MAX_RESUME_BYTES / (1024 * 1024)
        )));
    }

    let type_ok = content_type
        .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .is_some_and(|ct| RESUME_CONTENT_TYPES.contains(&ct.as_str()));
    let extension_ok = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| RESUME_EXTENSIONS.contains(&ext.as_str()));

    if !type_ok && !extension_ok {
        return Err(AppError::Validation(
            "resume must be a PDF or Word document".to_string(),
        ));
    }
    Ok(())
}

/// Reduces a client-supplied filename to a safe object-key segment.
pub fn sanitize_filename(filename: Option<&str>) -> String {
    let base = filename
        .unwrap_or_default()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Interprets checkbox-style form values.
pub fn parse_consent(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().to_ascii_lowercase())
        .is_some_and(|v| matches!(v.as_str(), "true" | "on" | "1" | "yes"))
}

pub fn resume_key(company_id: uuid::Uuid, application_id: uuid::Uuid, filename: &str) -> String {
    format!("resumes/{company_id}/{application_id}/{filename}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_resume_accepted_by_content_type() {
        assert!(validate_resume("cv", Some("application/pdf"), 1024).is_ok());
    }

    #[test]
    fn test_resume_accepted_by_extension() {
        assert!(validate_resume("CV.DOCX", Some("application/octet-stream"), 1024).is_ok());
    }

    #[test]
    fn test_resume_rejects_images() {
        assert!(matches!(
            validate_resume("photo.png", Some("image/png"), 1024),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_resume_size_limits() {
        assert!(validate_resume("cv.pdf", None, 0).is_err());
        assert!(matches!(
            validate_resume("cv.pdf", None, MAX_RESUME_BYTES + 1),
            Err(AppError::PayloadTooLarge(_))
        ));
        assert!(validate_resume("cv.pdf", None, MAX_RESUME_BYTES).is_ok());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename(Some("../../etc/passwd")), "passwd");
        assert_eq!(sanitize_filename(Some("C:\\Users\\ada\\My CV (1).pdf")), "My_CV__1_.pdf");
        assert_eq!(sanitize_filename(Some("..")), "resume");
        assert_eq!(sanitize_filename(None), "resume");
    }

    #[test]
    fn test_parse_consent() {
        assert!(parse_consent(Some("on")));
        assert!(parse_consent(Some("TRUE")));
        assert!(!parse_consent(Some("false")));
        assert!(!parse_consent(None));
    }

    #[test]
    fn test_resume_key_layout() {
        let company = Uuid::nil();
        let application = Uuid::nil();
        assert_eq!(
            resume_key(company, application, "cv.pdf"),
            "resumes/00000000-0000-0000-0000-000000000000/00000000-0000-0000-0000-000000000000/cv.pdf"
        );
    }
}
