use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Rendering used for label references (`~12` vs `~bug`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceFormat {
    #[default]
    Id,
    Name,
}

/// A GitLab user as embedded in notes and events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Full path of the project owning the label, when it differs from the
    /// noteable's project. Not part of REST payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
}

impl Label {
    /// GitLab label reference, e.g. `~42`, `~bug` or `~"needs review"`.
    pub fn to_reference(&self, from_project: &str, format: ReferenceFormat) -> String {
        let local = match format {
            ReferenceFormat::Id => format!("~{}", self.id),
            ReferenceFormat::Name if self.name.chars().any(char::is_whitespace) => {
                format!("~\"{}\"", self.name)
            }
            ReferenceFormat::Name => format!("~{}", self.name),
        };

        match &self.project_path {
            Some(path) if path != from_project => format!("{path}{local}"),
            _ => local,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteableKind {
    #[serde(rename = "Issue")]
    Issue,
    #[serde(rename = "MergeRequest")]
    MergeRequest,
}

impl NoteableKind {
    /// REST path segment for this kind.
    pub fn api_segment(self) -> &'static str {
        match self {
            Self::Issue => "issues",
            Self::MergeRequest => "merge_requests",
        }
    }

    fn reference_prefix(self) -> char {
        match self {
            Self::Issue => '#',
            Self::MergeRequest => '!',
        }
    }
}

/// The issue or merge request an activity feed belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Noteable {
    pub project_path: String,
    pub kind: NoteableKind,
    pub iid: u64,
}

impl Noteable {
    pub fn issue(project_path: impl Into<String>, iid: u64) -> Self {
        Self {
            project_path: project_path.into(),
            kind: NoteableKind::Issue,
            iid,
        }
    }

    pub fn merge_request(project_path: impl Into<String>, iid: u64) -> Self {
        Self {
            project_path: project_path.into(),
            kind: NoteableKind::MergeRequest,
            iid,
        }
    }
}

impl fmt::Display for Noteable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.project_path,
            self.kind.reference_prefix(),
            self.iid
        )
    }
}

/// A persisted note (comment or system note).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub body: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discussion_id: Option<String>,
}

impl Note {
    /// Stored discussion id, or one derived from the note id.
    pub fn discussion_id(&self) -> String {
        self.discussion_id
            .clone()
            .unwrap_or_else(|| digest_key(&["Note", &self.id.to_string()]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelAction {
    Add,
    Remove,
}

/// A label added to or removed from a noteable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEvent {
    pub id: u64,
    pub user: Author,
    pub created_at: DateTime<Utc>,
    pub action: LabelAction,
    /// `None` once the label itself has been deleted.
    #[serde(default)]
    pub label: Option<Label>,
    #[serde(default)]
    pub resource_type: Option<NoteableKind>,
    #[serde(default)]
    pub resource_id: Option<u64>,
}

impl LabelEvent {
    /// Events share a discussion exactly when they share timestamp and user.
    pub fn discussion_id(&self) -> String {
        digest_key(&[
            "ResourceLabelEvent",
            &self.created_at.to_rfc3339(),
            &self.user.id.to_string(),
        ])
    }

    pub fn reference(&self, from_project: &str, format: ReferenceFormat) -> String {
        self.label.as_ref().map_or_else(
            || DELETED_LABEL_REFERENCE.to_string(),
            |label| label.to_reference(from_project, format),
        )
    }
}

pub(crate) const DELETED_LABEL_REFERENCE: &str = "~deleted-label";

/// 40 hex chars, the width GitLab uses for discussion ids.
fn digest_key(parts: &[&str]) -> String {
    let digest = Sha256::digest(parts.join("-").as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(40);
    hex
}
