use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::activity::escape_html;
use crate::config::OutputFormat;
use crate::feed::{ActivityFeed, DeploymentReport};

use super::summary::{render_deployment_summary, render_feed_summary};

/// Exports an activity feed to various formats.
///
/// Supports multiple output formats for different use cases:
/// - CSV: One row per feed entry, for spreadsheets
/// - HTML: Self-contained report
/// - JSON: Programmatic access
/// - Summary: The terminal summary written as plain text
pub fn export_feed(
    feed: &ActivityFeed,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            write!(output, "{}", render_feed_summary(feed))?;
            Ok(())
        }
        OutputFormat::Json => export_json(feed, pretty, output),
        OutputFormat::Csv => export_feed_csv(feed, output),
        OutputFormat::Html => export_feed_html(feed, output),
    }
}

/// Exports a deployment report. CSV yields a single data row.
pub fn export_deployment(
    report: &DeploymentReport,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            write!(output, "{}", render_deployment_summary(report))?;
            Ok(())
        }
        OutputFormat::Json => export_json(report, pretty, output),
        OutputFormat::Csv => export_deployment_csv(report, output),
        OutputFormat::Html => export_deployment_html(report, output),
    }
}

fn export_json<T: Serialize>(value: &T, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

// Quotes every field; embedded quotes are doubled.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn export_feed_csv(feed: &ActivityFeed, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "Id,Created At,Kind,Author,System,Discussion,Body,URL")?;

    for item in &feed.entries {
        writeln!(
            output,
            "{},{},{},{},{},{},{},{}",
            item.id.map(|id| id.to_string()).unwrap_or_default(),
            item.created_at.to_rfc3339(),
            item.kind,
            csv_field(&item.author),
            item.system,
            item.discussion_id,
            csv_field(&item.body),
            csv_field(&item.url)
        )?;
    }

    Ok(())
}

fn export_deployment_csv(report: &DeploymentReport, output: &mut dyn Write) -> Result<()> {
    writeln!(
        output,
        "Project,Deployment,Status,Environment,Most Recent,Environment URL,Deployment URL,Pipeline Text,Job Text"
    )?;
    writeln!(
        output,
        "{},{},{},{},{},{},{},{},{}",
        csv_field(&report.project),
        report.deployment_id,
        report.status,
        csv_field(&report.environment),
        report.is_last,
        csv_field(&report.environment_url),
        csv_field(report.deployment_url.as_deref().unwrap_or("")),
        csv_field(&report.pipeline_text),
        csv_field(&report.job_text)
    )?;

    Ok(())
}

fn write_html_head(output: &mut dyn Write, title: &str) -> Result<()> {
    writeln!(output, "<!DOCTYPE html>")?;
    writeln!(output, "<html lang=\"en\">")?;
    writeln!(output, "<head>")?;
    writeln!(output, "    <meta charset=\"UTF-8\">")?;
    writeln!(output, "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(output, "    <title>{}</title>", escape_html(title))?;
    writeln!(output, "    <style>")?;
    writeln!(output, "        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 40px; background: #f5f5f5; }}")?;
    writeln!(output, "        .container {{ max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }}")?;
    writeln!(output, "        h1 {{ color: #2c3e50; border-bottom: 3px solid #6b4fbb; padding-bottom: 10px; }}")?;
    writeln!(output, "        .summary {{ background: #ecf0f1; padding: 20px; border-radius: 5px; margin: 20px 0; }}")?;
    writeln!(output, "        table {{ width: 100%; border-collapse: collapse; margin: 20px 0; }}")?;
    writeln!(output, "        th, td {{ padding: 12px; text-align: left; border-bottom: 1px solid #ddd; vertical-align: top; }}")?;
    writeln!(output, "        th {{ background: #6b4fbb; color: white; }}")?;
    writeln!(output, "        tr.label td {{ color: #1f78d1; }}")?;
    writeln!(output, "        tr.system td {{ color: #888; }}")?;
    writeln!(output, "        .success {{ color: #27ae60; }}")?;
    writeln!(output, "        .running, .created {{ color: #f39c12; }}")?;
    writeln!(output, "        .failed {{ color: #e74c3c; }}")?;
    writeln!(output, "        .gfm-label {{ font-weight: bold; }}")?;
    writeln!(output, "    </style>")?;
    writeln!(output, "</head>")?;
    writeln!(output, "<body>")?;
    writeln!(output, "    <div class=\"container\">")?;
    Ok(())
}

fn write_html_footer(output: &mut dyn Write, collected_at: &chrono::DateTime<chrono::Utc>) -> Result<()> {
    writeln!(output, "        <footer style=\"margin-top: 40px; padding-top: 20px; border-top: 1px solid #ddd; color: #666; text-align: center;\">")?;
    writeln!(
        output,
        "            <p>Report generated by glactivity v{} on {}</p>",
        env!("CARGO_PKG_VERSION"),
        collected_at.format("%Y-%m-%d %H:%M UTC")
    )?;
    writeln!(output, "        </footer>")?;
    writeln!(output, "    </div>")?;
    writeln!(output, "</body>")?;
    writeln!(output, "</html>")?;
    Ok(())
}

fn export_feed_html(feed: &ActivityFeed, output: &mut dyn Write) -> Result<()> {
    write_html_head(output, &format!("Activity - {}", feed.noteable))?;

    let noteable = escape_html(&feed.noteable);
    let noteable_url = escape_html(&feed.noteable_url);

    writeln!(output, "        <h1>🗒 Activity of <a href=\"{noteable_url}\">{noteable}</a></h1>")?;
    writeln!(output, "        <div class=\"summary\">")?;
    writeln!(output, "            <p><strong>Provider:</strong> {}</p>", escape_html(&feed.provider))?;
    writeln!(output, "            <p><strong>Filter:</strong> {}</p>", feed.notes_filter)?;
    writeln!(output, "            <p><strong>Notes:</strong> {}</p>", feed.total_notes)?;
    writeln!(output, "            <p><strong>Label events:</strong> {}</p>", feed.total_label_events)?;
    if let Some(since) = feed.last_fetched_at {
        writeln!(output, "            <p><strong>Since:</strong> {since}</p>")?;
    }
    writeln!(output, "        </div>")?;

    writeln!(output, "        <table>")?;
    writeln!(output, "            <thead>")?;
    writeln!(output, "                <tr>")?;
    writeln!(output, "                    <th>When</th>")?;
    writeln!(output, "                    <th>Author</th>")?;
    writeln!(output, "                    <th>Activity</th>")?;
    writeln!(output, "                </tr>")?;
    writeln!(output, "            </thead>")?;
    writeln!(output, "            <tbody>")?;

    for item in &feed.entries {
        let class = if item.kind == "label" {
            "label"
        } else if item.system {
            "system"
        } else {
            "comment"
        };
        writeln!(output, "                <tr class=\"{class}\">")?;
        writeln!(
            output,
            "                    <td><a href=\"{}\">{}</a></td>",
            escape_html(&item.url),
            item.created_at.format("%Y-%m-%d %H:%M")
        )?;
        writeln!(output, "                    <td>@{}</td>", escape_html(&item.author))?;
        writeln!(output, "                    <td>{}</td>", item.body_html)?;
        writeln!(output, "                </tr>")?;
    }

    writeln!(output, "            </tbody>")?;
    writeln!(output, "        </table>")?;

    write_html_footer(output, &feed.collected_at)
}

fn export_deployment_html(report: &DeploymentReport, output: &mut dyn Write) -> Result<()> {
    write_html_head(output, &format!("Deployment #{}", report.deployment_id))?;

    writeln!(
        output,
        "        <h1>🚀 Deployment #{} of {}</h1>",
        report.deployment_id,
        escape_html(&report.project)
    )?;
    writeln!(output, "        <div class=\"summary\">")?;
    writeln!(
        output,
        "            <p><strong>Status:</strong> <span class=\"{0}\">{0}</span></p>",
        escape_html(&report.status)
    )?;
    writeln!(
        output,
        "            <p><strong>Environment:</strong> <a href=\"{}\">{}</a></p>",
        escape_html(&report.environment_url),
        escape_html(&report.environment)
    )?;
    writeln!(
        output,
        "            <p><strong>Most recent:</strong> {}</p>",
        if report.is_last { "yes" } else { "no" }
    )?;
    writeln!(output, "        </div>")?;
    writeln!(output, "        <p><strong>Pipeline:</strong> {}</p>", escape_html(&report.pipeline_text))?;
    writeln!(output, "        <p><strong>Job:</strong> {}</p>", escape_html(&report.job_text))?;

    write_html_footer(output, &report.collected_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::NotesFilter;
    use crate::feed::FeedItem;
    use chrono::Utc;

    fn create_test_feed() -> ActivityFeed {
        ActivityFeed {
            provider: "GitLab".to_string(),
            noteable: "group/project!3".to_string(),
            noteable_url: "https://gitlab.com/group/project/-/merge_requests/3".to_string(),
            collected_at: Utc::now(),
            notes_filter: NotesFilter::AllNotes,
            last_fetched_at: None,
            total_notes: 1,
            total_label_events: 1,
            entries: vec![
                FeedItem {
                    id: Some(1),
                    discussion_id: "d1".to_string(),
                    kind: "note".to_string(),
                    author: "alice".to_string(),
                    created_at: Utc::now(),
                    system: false,
                    body: "Use <b>\"quotes\"</b>, please".to_string(),
                    body_html: "<p dir=\"auto\">Use &lt;b&gt;&quot;quotes&quot;&lt;/b&gt;, please</p>"
                        .to_string(),
                    url: "https://gitlab.com/group/project/-/merge_requests/3#note_1".to_string(),
                },
                FeedItem {
                    id: Some(20),
                    discussion_id: "d2".to_string(),
                    kind: "label".to_string(),
                    author: "bob".to_string(),
                    created_at: Utc::now(),
                    system: true,
                    body: "added ~\"needs review\" label".to_string(),
                    body_html: "<p dir=\"auto\">added <span class=\"gfm gfm-label\">~&quot;needs review&quot;</span> label</p>"
                        .to_string(),
                    url: "https://gitlab.com/group/project/-/merge_requests/3".to_string(),
                },
            ],
        }
    }

    fn create_test_report() -> DeploymentReport {
        DeploymentReport {
            project: "group/project".to_string(),
            deployment_id: 7,
            status: "failed".to_string(),
            environment: "review/feature".to_string(),
            environment_url: "https://gitlab.com/group/project/-/environments/4".to_string(),
            external_url: None,
            is_last: false,
            deployment_url: None,
            pipeline_text: "Failed to deploy to https://gitlab.com/group/project/-/environments/4."
                .to_string(),
            job_text: "The deployment of this job to https://gitlab.com/group/project/-/environments/4 did not succeed."
                .to_string(),
            collected_at: Utc::now(),
        }
    }

    #[test]
    fn test_export_feed_json() {
        let mut output = Vec::new();
        export_feed(&create_test_feed(), OutputFormat::Json, false, &mut output).unwrap();
        let json_str = String::from_utf8(output).unwrap();
        assert!(json_str.contains("group/project!3"));
        assert!(json_str.contains("\"kind\":\"label\""));
        assert!(json_str.contains("\"notes_filter\":\"all-notes\""));
    }

    #[test]
    fn test_export_json_pretty() {
        let mut output = Vec::new();
        export_deployment(&create_test_report(), OutputFormat::Json, true, &mut output).unwrap();
        let json_str = String::from_utf8(output).unwrap();
        assert!(json_str.contains('\n'));
        assert!(json_str.contains("  \"deployment_id\": 7"));
    }

    #[test]
    fn test_export_feed_csv_quotes_fields() {
        let mut output = Vec::new();
        export_feed(&create_test_feed(), OutputFormat::Csv, false, &mut output).unwrap();
        let csv = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Id,Created At,Kind,Author"));
        assert!(lines[1].starts_with("1,"));
        assert!(lines[1].contains("\"Use <b>\"\"quotes\"\"</b>, please\""));
        assert!(lines[2].contains(",label,\"bob\",true,d2,"));
    }

    #[test]
    fn test_export_deployment_csv() {
        let mut output = Vec::new();
        export_deployment(&create_test_report(), OutputFormat::Csv, false, &mut output).unwrap();
        let csv = String::from_utf8(output).unwrap();
        assert!(csv.contains("\"group/project\",7,failed,\"review/feature\",false,"));
    }

    #[test]
    fn test_export_feed_html_escapes_bodies() {
        let mut output = Vec::new();
        export_feed(&create_test_feed(), OutputFormat::Html, false, &mut output).unwrap();
        let html = String::from_utf8(output).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<tr class=\"label\">"));
        assert!(html.contains("<span class=\"gfm gfm-label\">~&quot;needs review&quot;</span>"));
        assert!(html.contains("Use &lt;b&gt;&quot;quotes&quot;&lt;/b&gt;, please"));
        assert!(!html.contains("<b>\"quotes\"</b>"));
        assert!(html.contains("</html>"));
    }

    #[test]
    fn test_export_deployment_html() {
        let mut output = Vec::new();
        export_deployment(&create_test_report(), OutputFormat::Html, false, &mut output).unwrap();
        let html = String::from_utf8(output).unwrap();
        assert!(html.contains("<span class=\"failed\">failed</span>"));
        assert!(html.contains("review/feature"));
        assert!(html.contains("did not succeed"));
    }

    #[test]
    fn test_export_feed_summary_as_text() {
        let mut output = Vec::new();
        export_feed(&create_test_feed(), OutputFormat::Summary, false, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("group/project!3"));
        assert!(text.contains("@bob"));
    }
}
