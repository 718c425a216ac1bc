use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::{
    FeedEntry, LabelEvent, MergeIntoNotes, MergeParams, Note, Noteable, NotesFilter, NotesFinder,
    ReferenceFormat,
};
use crate::providers::gitlab::links::{feed_entry_url, noteable_path, web_url};
use crate::status::DecoratedDeployment;

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityFeed {
    pub provider: String,
    pub noteable: String,
    pub noteable_url: String,
    pub collected_at: DateTime<Utc>,
    pub notes_filter: NotesFilter,
    pub last_fetched_at: Option<i64>,
    pub total_notes: usize,
    pub total_label_events: usize,
    pub entries: Vec<FeedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    /// Note id, or id of the first squashed label event
    pub id: Option<u64>,
    pub discussion_id: String,
    pub kind: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub system: bool,
    pub body: String,
    pub body_html: String,
    pub url: String,
}

/// Where a feed is built from and how references are rendered.
pub struct FeedSource<'a> {
    pub provider: &'a str,
    pub base_url: &'a str,
    pub noteable: &'a Noteable,
    pub reference_format: ReferenceFormat,
}

impl ActivityFeed {
    /// Filters the notes, merges the label events into them and flattens
    /// the result into report items.
    pub fn build(
        source: &FeedSource<'_>,
        notes: Vec<Note>,
        events: Vec<LabelEvent>,
        params: MergeParams,
    ) -> Self {
        let notes = NotesFinder::new(params.notes_filter, params.last_fetched_at).execute(notes);
        let entries = MergeIntoNotes::new(source.noteable, events, params).execute(notes);

        let total_notes = entries
            .iter()
            .filter(|entry| matches!(entry, FeedEntry::Note(_)))
            .count();
        let total_label_events = entries
            .iter()
            .map(|entry| match entry {
                FeedEntry::Label(label_note) => label_note.events.len(),
                FeedEntry::Note(_) => 0,
            })
            .sum();

        let items = entries
            .iter()
            .map(|entry| FeedItem {
                id: entry.id(),
                discussion_id: entry.discussion_id(),
                kind: entry.kind().to_string(),
                author: entry.author().username.clone(),
                created_at: entry.created_at(),
                system: entry.is_system(),
                body: entry.body(source.reference_format),
                body_html: entry.body_html(source.reference_format),
                url: feed_entry_url(source.base_url, source.noteable, entry),
            })
            .collect();

        Self {
            provider: source.provider.to_string(),
            noteable: source.noteable.to_string(),
            noteable_url: web_url(source.base_url, &noteable_path(source.noteable)),
            collected_at: Utc::now(),
            notes_filter: params.notes_filter,
            last_fetched_at: params.last_fetched_at,
            total_notes,
            total_label_events,
            entries: items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub project: String,
    pub deployment_id: u64,
    pub status: String,
    pub environment: String,
    pub environment_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    pub is_last: bool,
    pub deployment_url: Option<String>,
    pub pipeline_text: String,
    pub job_text: String,
    pub collected_at: DateTime<Utc>,
}

impl DeploymentReport {
    pub fn from_decorated(project: &str, decorated: &DecoratedDeployment<'_>) -> Self {
        Self {
            project: project.to_string(),
            deployment_id: decorated.deployment.id,
            status: decorated.details.label().to_string(),
            environment: decorated.deployment.environment.name.clone(),
            environment_url: decorated.environment_path.clone(),
            external_url: decorated.deployment.environment.external_url.clone(),
            is_last: decorated.deployment.is_last(),
            deployment_url: decorated.deployment_path.clone(),
            pipeline_text: decorated.text_for_pipeline(),
            job_text: decorated.text_for_job(),
            collected_at: Utc::now(),
        }
    }
}
