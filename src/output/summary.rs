use std::fmt::Write;

use comfy_table::Cell;

use crate::feed::{ActivityFeed, DeploymentReport};

use super::styling::{deployment_text, heading, highlight, link, muted};
use super::tables::{activity_cell, create_cyan_header, create_table, deployment_status_color};

/// Prints a human-readable activity feed to stdout.
///
/// Displays:
/// - Overview: noteable, filter, entry counts and cutoff
/// - Activity: one row per note or squashed label change, oldest first
///
/// Label changes are shown in cyan and other system notes in grey.
pub fn print_feed_summary(feed: &ActivityFeed) {
    println!("{}", render_feed_summary(feed));
}

/// Prints the pipeline and job wording for a deployment to stdout.
pub fn print_deployment_summary(report: &DeploymentReport) {
    println!("{}", render_deployment_summary(report));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", heading(emoji), heading(title).underlined());
}

pub(super) fn render_feed_summary(feed: &ActivityFeed) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");

    let _ = writeln!(output, "  {} {}", muted("Noteable:"), link(&feed.noteable));
    let _ = writeln!(output, "  {} {}", muted("URL:"), muted(&feed.noteable_url));
    let _ = writeln!(output, "  {} {}", muted("Filter:"), highlight(feed.notes_filter));
    let _ = writeln!(
        output,
        "  {} {} {}",
        muted("Entries:"),
        highlight(feed.entries.len()),
        muted(format!(
            "({} notes, {} label events)",
            feed.total_notes, feed.total_label_events
        ))
    );
    if let Some(since) = feed
        .last_fetched_at
        .and_then(|secs| chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0))
    {
        let _ = writeln!(
            output,
            "  {} {}",
            muted("Since:"),
            muted(since.format("%Y-%m-%d %H:%M UTC"))
        );
    }
    let _ = writeln!(
        output,
        "  {} {}\n",
        muted("Collected:"),
        muted(feed.collected_at.format("%Y-%m-%d %H:%M UTC"))
    );

    if feed.entries.is_empty() {
        let _ = writeln!(output, "{}", highlight("No activity found."));
        return output;
    }

    add_section_header(&mut output, "💬", "Activity");

    let mut table = create_table();
    table.set_header(create_cyan_header(&["#", "When", "Author", "Activity"]));

    for (idx, item) in feed.entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(item.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(format!("@{}", item.author)),
            activity_cell(item),
        ]);
    }

    let _ = writeln!(output, "{table}");

    output
}

pub(super) fn render_deployment_summary(report: &DeploymentReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🚀", "Deployment");

    let mut table = create_table();
    table.set_header(create_cyan_header(&["Project", "Deployment", "Environment", "Status", "Most recent"]));
    table.add_row(vec![
        Cell::new(&report.project),
        Cell::new(format!("#{}", report.deployment_id)),
        Cell::new(&report.environment),
        Cell::new(&report.status).fg(deployment_status_color(&report.status)),
        Cell::new(if report.is_last { "yes" } else { "no" }),
    ]);
    let _ = writeln!(output, "{table}\n");

    let latest = deployment_text(&report.pipeline_text, &report.status, report.is_last);

    let _ = writeln!(output, "  {} {}", muted("Pipeline:"), latest);
    let _ = writeln!(output, "  {} {}", muted("Job:"), report.job_text);
    if let Some(external_url) = &report.external_url {
        let _ = writeln!(output, "  {} {}", muted("Live at:"), link(external_url));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::NotesFilter;
    use crate::feed::FeedItem;
    use chrono::Utc;

    fn create_test_item(kind: &str, author: &str, body: &str) -> FeedItem {
        FeedItem {
            id: Some(1),
            discussion_id: "abc".to_string(),
            kind: kind.to_string(),
            author: author.to_string(),
            created_at: Utc::now(),
            system: kind == "label",
            body: body.to_string(),
            body_html: format!("<p dir=\"auto\">{body}</p>"),
            url: "https://gitlab.com/group/project/-/issues/1".to_string(),
        }
    }

    fn create_test_feed(entries: Vec<FeedItem>) -> ActivityFeed {
        ActivityFeed {
            provider: "GitLab".to_string(),
            noteable: "group/project#1".to_string(),
            noteable_url: "https://gitlab.com/group/project/-/issues/1".to_string(),
            collected_at: Utc::now(),
            notes_filter: NotesFilter::AllNotes,
            last_fetched_at: None,
            total_notes: 1,
            total_label_events: 2,
            entries,
        }
    }

    #[test]
    fn test_render_feed_summary_empty() {
        let output = render_feed_summary(&create_test_feed(vec![]));

        assert!(output.contains("group/project#1"));
        assert!(output.contains("Entries:"));
        assert!(output.contains("No activity found"));
        assert!(!output.contains("Since:"));
    }

    #[test]
    fn test_render_feed_summary_with_entries() {
        let mut feed = create_test_feed(vec![
            create_test_item("note", "alice", "Looks good to me"),
            create_test_item("label", "bob", "added ~bug label and removed ~feature label"),
        ]);
        feed.last_fetched_at = Some(1_700_000_000);

        let output = render_feed_summary(&feed);

        assert!(output.contains("Activity"));
        assert!(output.contains("@alice"));
        assert!(output.contains("@bob"));
        assert!(output.contains("Looks good to me"));
        assert!(output.contains("removed ~feature label"));
        assert!(output.contains("(1 notes, 2 label events)"));
        assert!(output.contains("Since:"));
    }

    #[test]
    fn test_render_deployment_summary() {
        let report = DeploymentReport {
            project: "group/project".to_string(),
            deployment_id: 41,
            status: "success".to_string(),
            environment: "production".to_string(),
            environment_url: "https://gitlab.com/group/project/-/environments/9".to_string(),
            external_url: Some("https://example.com".to_string()),
            is_last: true,
            deployment_url: None,
            pipeline_text: "Successfully deployed to https://gitlab.com/group/project/-/environments/9."
                .to_string(),
            job_text: "This job is the most recent deployment to https://gitlab.com/group/project/-/environments/9."
                .to_string(),
            collected_at: Utc::now(),
        };

        let output = render_deployment_summary(&report);

        assert!(output.contains("#41"));
        assert!(output.contains("production"));
        assert!(output.contains("Successfully deployed to"));
        assert!(output.contains("most recent deployment"));
        assert!(output.contains("https://example.com"));
    }
}
