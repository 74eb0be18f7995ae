//! Push message bodies.
//!
//! Every renderer here is pure: it takes result lists and a timestamp and
//! returns HTML. Only image-type successes make it into a body, as `<img>`
//! tags; other successful files are counted but not shown.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use deskdrop_core::traits::LifecycleNotice;
use deskdrop_core::types::{ScheduleMode, UploadResult, image_urls};

const WRAPPER_OPEN: &str =
    r#"<div style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">"#;
const WRAPPER_CLOSE: &str = "</div>";

/// Which of the four summary bodies applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    AllSuccess,
    AllFailed,
    Mixed,
    Empty,
}

impl SummaryKind {
    pub fn classify(successes: usize, failures: usize) -> Self {
        match (successes > 0, failures > 0) {
            (true, false) => SummaryKind::AllSuccess,
            (false, true) => SummaryKind::AllFailed,
            (true, true) => SummaryKind::Mixed,
            (false, false) => SummaryKind::Empty,
        }
    }
}

/// Summary title: the calendar date, `YYYY-MM-DD`.
pub fn summary_title(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// One `<br/><img src='..' />` line per image URL. Also the artifact line format.
pub fn image_tags<'a>(urls: impl IntoIterator<Item = &'a str>) -> String {
    urls.into_iter()
        .map(|url| format!("<br/><img src='{}' />\n", escape_html(url)))
        .collect()
}

/// Select and render the body for one cycle.
pub fn render_summary(
    successes: &[UploadResult],
    failures: &[UploadResult],
    at: &DateTime<Local>,
    tag: &str,
) -> String {
    let time = format_time(at);
    match SummaryKind::classify(successes.len(), failures.len()) {
        SummaryKind::AllSuccess => render_success(successes),
        SummaryKind::AllFailed => render_failure(failures, &time),
        SummaryKind::Mixed => render_mixed(successes, failures, &time),
        SummaryKind::Empty => render_empty(&time, tag),
    }
}

/// All-success body: image tags only.
pub fn render_success(successes: &[UploadResult]) -> String {
    image_tags(image_urls(successes))
}

pub fn render_failure(failures: &[UploadResult], time: &str) -> String {
    let mut html = String::from(WRAPPER_OPEN);
    html.push_str(r#"<h3 style="color: #dc3545;">Upload failed</h3>"#);
    html.push_str(&format!("<p><strong>Checked at:</strong> {time}</p>"));
    html.push_str(&format!("<p><strong>Failed:</strong> {} file(s)</p>", failures.len()));
    html.push_str(&failure_list(failures));
    html.push_str(
        r#"<p style="color: #721c24; background: #f5c6cb; padding: 10px; border-radius: 5px;">"#,
    );
    html.push_str(
        "<strong>Things to check:</strong><br>\
         network connectivity<br>\
         storage credentials and permissions<br>\
         file size limits of the storage backend<br>\
         the service log for the detailed error",
    );
    html.push_str("</p>");
    html.push_str(WRAPPER_CLOSE);
    html
}

pub fn render_mixed(successes: &[UploadResult], failures: &[UploadResult], time: &str) -> String {
    let mut html = String::from(WRAPPER_OPEN);
    html.push_str(r#"<h3 style="color: #ffc107;">Upload finished with errors</h3>"#);
    html.push_str(&format!("<p><strong>Uploaded at:</strong> {time}</p>"));
    html.push_str(&format!(
        "<p><strong>Succeeded:</strong> {} | <strong>Failed:</strong> {}</p>",
        successes.len(),
        failures.len()
    ));
    html.push_str(r#"<h4 style="color: #28a745;">Uploaded</h4>"#);
    html.push_str(&render_success(successes));
    html.push_str(r#"<h4 style="color: #dc3545;">Failed</h4>"#);
    html.push_str(&failure_list(failures));
    html.push_str(WRAPPER_CLOSE);
    html
}

/// Body for a cycle that found nothing. Not sent by the orchestrator,
/// which short-circuits empty scans, but kept for manual summaries.
pub fn render_empty(time: &str, tag: &str) -> String {
    let tag = escape_html(tag);
    let mut html = String::from(WRAPPER_OPEN);
    html.push_str(r#"<h3 style="color: #6c757d;">Upload check</h3>"#);
    html.push_str(&format!("<p><strong>Checked at:</strong> {time}</p>"));
    html.push_str(&format!("<p>No <code>{tag}</code> files found for today.</p>"));
    html.push_str(&format!(
        "<p><strong>Naming rule:</strong> names start with <code>{tag}</code> and end with \
         today's date <code>YYYYMMDD</code> before the extension, \
         e.g. <code>{tag}-notes20241220.pdf</code></p>"
    ));
    html.push_str(WRAPPER_CLOSE);
    html
}

/// Title and body for a lifecycle notice.
pub fn render_lifecycle(notice: &LifecycleNotice, at: &DateTime<Local>) -> (String, String) {
    let time = format_time(at);
    match notice {
        LifecycleNotice::Started(mode) => {
            let plan = match mode {
                ScheduleMode::Production => "once a day inside the morning window",
                ScheduleMode::Continuous => "continuous polling",
            };
            let body = format!(
                "{WRAPPER_OPEN}<h3 style=\"color: #007bff;\">Service started</h3>\
                 <p><strong>Started at:</strong> {time}</p>\
                 <p><strong>Mode:</strong> {mode}</p>\
                 <p><strong>Plan:</strong> {plan}</p>{WRAPPER_CLOSE}"
            );
            ("DeskDrop started".into(), body)
        }
        LifecycleNotice::Error(message) => {
            let body = format!(
                "{WRAPPER_OPEN}<h3 style=\"color: #dc3545;\">Upload cycle failed</h3>\
                 <p><strong>Time:</strong> {time}</p>\
                 <p><strong>Error:</strong> {}</p>{WRAPPER_CLOSE}",
                escape_html(message)
            );
            ("DeskDrop upload error".into(), body)
        }
    }
}

fn failure_list(failures: &[UploadResult]) -> String {
    let mut html = String::from(
        r#"<ul style="background: #f8d7da; padding: 15px; border-left: 4px solid #dc3545;">"#,
    );
    for f in failures {
        html.push_str(&format!("<li><strong>{}</strong></li>", escape_html(&f.source_name)));
    }
    html.push_str("</ul>");
    html
}
