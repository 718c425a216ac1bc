use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{LabelEvent, Note};
use crate::error::GlActivityError;

/// Seconds subtracted from the last fetch time when selecting new items.
pub const FETCH_OVERLAP_SECS: i64 = 5;

/// Which parts of an activity feed the reader wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotesFilter {
    #[default]
    AllNotes,
    OnlyComments,
    OnlyActivity,
}

impl NotesFilter {
    pub fn keeps(self, note: &Note) -> bool {
        match self {
            Self::AllNotes => true,
            Self::OnlyComments => !note.system,
            Self::OnlyActivity => note.system,
        }
    }
}

impl FromStr for NotesFilter {
    type Err = GlActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "all" | "all-notes" | "all_notes" => Ok(Self::AllNotes),
            "1" | "comments" | "only-comments" | "only_comments" => Ok(Self::OnlyComments),
            "2" | "activity" | "only-activity" | "only_activity" => Ok(Self::OnlyActivity),
            other => Err(GlActivityError::InvalidFilter(other.to_string())),
        }
    }
}

impl fmt::Display for NotesFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AllNotes => "all",
            Self::OnlyComments => "comments",
            Self::OnlyActivity => "activity",
        };
        f.write_str(name)
    }
}

/// Inclusive lower bound for items created since `last_fetched_at`
/// (unix seconds), widened by [`FETCH_OVERLAP_SECS`].
///
/// Timestamps outside chrono's range clamp to its bounds, so a far-future
/// value still excludes everything and a far-past one keeps everything.
pub fn fetch_cutoff(last_fetched_at: Option<i64>) -> Option<DateTime<Utc>> {
    last_fetched_at.map(|secs| {
        let fetched = DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or(if secs > 0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            DateTime::<Utc>::MIN_UTC
        });
        fetched
            .checked_sub_signed(Duration::seconds(FETCH_OVERLAP_SECS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    })
}

/// Keeps the events created at or after the fetch cutoff.
pub fn since_fetch_at(events: Vec<LabelEvent>, last_fetched_at: Option<i64>) -> Vec<LabelEvent> {
    let Some(cutoff) = fetch_cutoff(last_fetched_at) else {
        return events;
    };

    let before = events.len();
    let kept: Vec<_> = events
        .into_iter()
        .filter(|event| event.created_at >= cutoff)
        .collect();
    debug!("Cutoff {cutoff} kept {}/{before} label events", kept.len());
    kept
}

/// Selects the notes a reader asked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotesFinder {
    pub filter: NotesFilter,
    pub last_fetched_at: Option<i64>,
}

impl NotesFinder {
    pub fn new(filter: NotesFilter, last_fetched_at: Option<i64>) -> Self {
        Self {
            filter,
            last_fetched_at,
        }
    }

    /// Applies the filter, and the fetch cutoff against `updated_at` so that
    /// edited notes are returned again.
    pub fn execute(&self, notes: Vec<Note>) -> Vec<Note> {
        let cutoff = fetch_cutoff(self.last_fetched_at);

        notes
            .into_iter()
            .filter(|note| self.filter.keeps(note))
            .filter(|note| cutoff.map_or(true, |cutoff| note.updated_at >= cutoff))
            .collect()
    }
}
