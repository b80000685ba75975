use anyhow::Result;

use crate::models::application::ApplicationListRow;

const HEADER: [&str; 8] = [
    "Application ID",
    "Job Title",
    "Candidate Name",
    "Candidate Email",
    "Phone",
    "Status",
    "Source",
    "Applied At",
];

/// Renders applications as RFC 4180 CSV.
pub fn applications_to_csv(rows: &[ApplicationListRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(HEADER)?;

    for row in rows {
        writer.write_record([
            row.id.to_string(),
            defuse_formula(&row.job_title),
            defuse_formula(&row.candidate_name),
            defuse_formula(&row.candidate_email),
            defuse_formula(row.phone.as_deref().unwrap_or_default()),
            row.status.clone(),
            defuse_formula(row.source.as_deref().unwrap_or_default()),
            row.created_at.to_rfc3339(),
        ])?;
    }

    Ok(writer.into_inner()?)
}

/// Spreadsheet apps evaluate cells starting with `=`, `+`, `-` or `@`; prefix those with `'`.
pub fn defuse_formula(value: &str) -> String {
    match value.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{value}"),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn row(name: &str, email: &str) -> ApplicationListRow {
        ApplicationListRow {
            id: Uuid::nil(),
            job_id: Uuid::nil(),
            job_title: "Backend Engineer".to_string(),
            candidate_name: name.to_string(),
            candidate_email: email.to_string(),
            phone: None,
            source: Some("careers_page".to_string()),
            status: "new".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    fn render(rows: &[ApplicationListRow]) -> String {
        String::from_utf8(applications_to_csv(rows).unwrap()).unwrap()
    }

    #[test]
    fn test_header_only_when_empty() {
        assert_eq!(
            render(&[]),
            "Application ID,Job Title,Candidate Name,Candidate Email,Phone,Status,Source,Applied At\n"
        );
    }

    #[test]
    fn test_plain_row() {
        let csv = render(&[row("Ada Lovelace", "ada@example.com")]);
        let line = csv.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "00000000-0000-0000-0000-000000000000,Backend Engineer,Ada Lovelace,ada@example.com,,new,careers_page,2024-03-01T09:30:00+00:00"
        );
    }

    #[test]
    fn test_comma_and_quote_are_escaped() {
        let csv = render(&[row("Doe, \"Johnny\" John", "j@example.com")]);
        assert!(csv.contains("\"Doe, \"\"Johnny\"\" John\""));
    }

    #[test]
    fn test_newline_is_quoted() {
        let csv = render(&[row("Line\nBreak", "l@example.com")]);
        assert!(csv.contains("\"Line\nBreak\""));
    }

    #[test]
    fn test_formula_is_defused() {
        let csv = render(&[row("=HYPERLINK(\"http://evil\")", "x@example.com")]);
        assert!(csv.contains("\"'=HYPERLINK(\"\"http://evil\"\")\""));
    }

    #[test]
    fn test_defuse_leaves_plain_text() {
        assert_eq!(defuse_formula("Ada"), "Ada");
        assert_eq!(defuse_formula("+31 6 1234"), "'+31 6 1234");
        assert_eq!(defuse_formula(""), "");
    }
}
