//! Indeed-compatible XML job feed.

use anyhow::Result;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;

use crate::models::job::{JobRow, JobType};

/// Company-level fields of the feed header.
pub struct FeedPublisher<'a> {
    pub name: &'a str,
    pub url: &'a str,
}

/// Maps our job types onto the Indeed `<jobtype>` vocabulary.
pub fn indeed_job_type(job_type: &str) -> Option<&'static str> {
    JobType::parse(job_type).map(|jt| match jt {
        JobType::FullTime => "fulltime",
        JobType::PartTime => "parttime",
        JobType::Contract | JobType::Freelance => "contract",
        JobType::Temporary => "temporary",
        JobType::Internship => "internship",
    })
}

/// Human-readable salary range, e.g. `EUR 50000 - 70000`.
pub fn format_salary(min: Option<i32>, max: Option<i32>, currency: Option<&str>) -> Option<String> {
    let range = match (min, max) {
        (Some(min), Some(max)) if min == max => min.to_string(),
        (Some(min), Some(max)) => format!("{min} - {max}"),
        (Some(min), None) => format!("from {min}"),
        (None, Some(max)) => format!("up to {max}"),
        (None, None) => return None,
    };
    Some(match currency.map(str::trim).filter(|c| !c.is_empty()) {
        Some(currency) => format!("{} {range}", currency.to_ascii_uppercase()),
        None => range,
    })
}

/// Renders the feed. `apply_url` builds the candidate-facing URL for a job.
pub fn render_indeed_feed(
    publisher: &FeedPublisher<'_>,
    jobs: &[JobRow],
    apply_url: impl Fn(&JobRow) -> String,
    built_at: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    writer.create_element("source").write_inner_content(|w| {
        w.create_element("publisher")
            .write_text_content(BytesText::new(publisher.name))?;
        w.create_element("publisherurl")
            .write_text_content(BytesText::new(publisher.url))?;
        w.create_element("lastBuildDate")
            .write_text_content(BytesText::new(&built_at.to_rfc2822()))?;

        for job in jobs {
            let url = apply_url(job);
            w.create_element("job").write_inner_content(|w| {
                text_element(w, "title", &job.title)?;
                text_element(w, "date", &job.created_at.to_rfc2822())?;
                text_element(w, "referencenumber", &job.id.to_string())?;
                text_element(w, "url", &url)?;
                text_element(w, "company", publisher.name)?;
                text_element(w, "city", job.location.as_deref().unwrap_or_default())?;
                text_element(w, "country", job.country.as_deref().unwrap_or_default())?;
                text_element(w, "description", &job.description)?;
                if let Some(salary) =
                    format_salary(job.salary_min, job.salary_max, job.salary_currency.as_deref())
                {
                    text_element(w, "salary", &salary)?;
                }
                if let Some(job_type) = indeed_job_type(&job.job_type) {
                    text_element(w, "jobtype", job_type)?;
                }
                Ok::<(), quick_xml::Error>(())
            })?;
        }
        Ok::<(), quick_xml::Error>(())
    })?;

    Ok(writer.into_inner())
}

fn text_element(w: &mut Writer<Vec<u8>>, name: &str, text: &str) -> quick_xml::Result<()> {
    w.create_element(name).write_text_content(BytesText::new(text))?;
    Ok(())
}
