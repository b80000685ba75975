pub mod handlers;
pub mod html;

use crate::errors::AppError;

pub const DEFAULT_PRIMARY_COLOR: &str = "#1f2937";
pub const DEFAULT_SECONDARY_COLOR: &str = "#3b82f6";
pub const DEFAULT_FONT_FAMILY: &str = "Inter";
pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_RETENTION_DAYS: i32 = 365;
pub const DEFAULT_CONSENT_TEXT: &str =
    "I agree that my personal data is processed for this application and stored for the retention period stated in the privacy policy.";

pub const CV_TEMPLATE_KEYS: &[&str] = &["classic", "modern", "minimal", "creative"];
pub const CV_SECTION_KEYS: &[&str] = &[
    "personal",
    "summary",
    "experience",
    "education",
    "skills",
    "languages",
    "certifications",
    "references",
];
pub const DEFAULT_CV_SECTIONS: &[&str] = &["personal", "summary", "experience", "education", "skills"];

/// Accepts `#rgb` and `#rrggbb`.
pub fn validate_color(field: &str, value: &str) -> Result<(), AppError> {
    let valid = value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(AppError::Validation(format!(
            "{field} must be a hex color like #1f2937, got '{value}'"
        )));
    }
    Ok(())
}

/// Accepts `ll` or `ll-CC` in any case and returns it normalized (`nl`, `nl-BE`).
pub fn normalize_locale(value: &str) -> Result<String, AppError> {
    let invalid = || AppError::Validation(format!("locale must look like 'en' or 'en-GB', got '{value}'"));
    let value = value.trim();
    let (lang, region) = match value.split_once(['-', '_']) {
        Some((lang, region)) => (lang, Some(region)),
        None => (value, None),
    };
    if lang.len() != 2 || !lang.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }
    match region {
        None => Ok(lang.to_ascii_lowercase()),
        Some(region) if region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()) => Ok(
            format!("{}-{}", lang.to_ascii_lowercase(), region.to_ascii_uppercase()),
        ),
        Some(_) => Err(invalid()),
    }
}

pub fn validate_http_url(field: &str, value: &str) -> Result<(), AppError> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => Ok(()),
        _ => Err(AppError::Validation(format!(
            "{field} must be an http(s) URL, got '{value}'"
        ))),
    }
}

pub fn validate_template_key(value: &str) -> Result<(), AppError> {
    if !CV_TEMPLATE_KEYS.contains(&value) {
        return Err(AppError::Validation(format!(
            "template_key must be one of {}",
            CV_TEMPLATE_KEYS.join(", ")
        )));
    }
    Ok(())
}

pub fn validate_sections(sections: &[String]) -> Result<(), AppError> {
    for (i, section) in sections.iter().enumerate() {
        if !CV_SECTION_KEYS.contains(&section.as_str()) {
            return Err(AppError::Validation(format!("Unknown CV section '{section}'")));
        }
        if sections[..i].contains(section) {
            return Err(AppError::Validation(format!("Duplicate CV section '{section}'")));
        }
    }
    Ok(())
}

pub fn validate_retention_days(days: i32) -> Result<(), AppError> {
    if !(1..=3650).contains(&days) {
        return Err(AppError::Validation(format!(
            "retention_days must be between 1 and 3650, got {days}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors() {
        assert!(validate_color("primary_color", "#fff").is_ok());
        assert!(validate_color("primary_color", "#1F2937").is_ok());
        assert!(validate_color("primary_color", "1f2937").is_err());
        assert!(validate_color("primary_color", "#12345").is_err());
        assert!(validate_color("primary_color", "#ggg").is_err());
    }

    #[test]
    fn test_locales() {
        assert_eq!(normalize_locale("NL").unwrap(), "nl");
        assert_eq!(normalize_locale("nl_be").unwrap(), "nl-BE");
        assert_eq!(normalize_locale("en-GB").unwrap(), "en-GB");
        assert!(normalize_locale("eng").is_err());
        assert!(normalize_locale("en-").is_err());
        assert!(normalize_locale("").is_err());
    }

    #[test]
    fn test_urls() {
        assert!(validate_http_url("privacy_policy_url", "https://acme.test/privacy").is_ok());
        assert!(validate_http_url("privacy_policy_url", "http://acme.test").is_ok());
        assert!(validate_http_url("privacy_policy_url", "ftp://acme.test").is_err());
        assert!(validate_http_url("privacy_policy_url", "https://").is_err());
    }

    #[test]
    fn test_sections() {
        let ok = vec!["personal".to_string(), "skills".to_string()];
        assert!(validate_sections(&ok).is_ok());
        let dup = vec!["skills".to_string(), "skills".to_string()];
        assert!(validate_sections(&dup).is_err());
        let unknown = vec!["hobbies".to_string()];
        assert!(validate_sections(&unknown).is_err());
    }

    #[test]
    fn test_template_keys_and_retention() {
        assert!(validate_template_key("modern").is_ok());
        assert!(validate_template_key("fancy").is_err());
        assert!(validate_retention_days(365).is_ok());
        assert!(validate_retention_days(0).is_err());
        assert!(validate_retention_days(4000).is_err());
    }
}
