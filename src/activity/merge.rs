use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use super::filter::{since_fetch_at, NotesFilter};
use super::label_note::{escape_html, LabelNote};
use super::model::{Author, LabelEvent, Note, Noteable, ReferenceFormat};

/// Options a reader passes when loading a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeParams {
    pub notes_filter: NotesFilter,
    /// Unix seconds of the reader's previous fetch.
    pub last_fetched_at: Option<i64>,
}

/// One line of an activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeedEntry {
    Note(Note),
    Label(LabelNote),
}

impl FeedEntry {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Note(note) => note.created_at,
            Self::Label(label_note) => label_note.created_at,
        }
    }

    pub fn author(&self) -> &Author {
        match self {
            Self::Note(note) => &note.author,
            Self::Label(label_note) => &label_note.author,
        }
    }

    pub fn discussion_id(&self) -> String {
        match self {
            Self::Note(note) => note.discussion_id(),
            Self::Label(label_note) => label_note.discussion_id.clone(),
        }
    }

    pub fn is_system(&self) -> bool {
        match self {
            Self::Note(note) => note.system,
            Self::Label(_) => true,
        }
    }

    pub fn body(&self, format: ReferenceFormat) -> String {
        match self {
            Self::Note(note) => note.body.clone(),
            Self::Label(label_note) => label_note.note(format),
        }
    }

    /// Body as rendered HTML; label references are wrapped in spans.
    pub fn body_html(&self, format: ReferenceFormat) -> String {
        match self {
            Self::Note(note) => format!("<p dir=\"auto\">{}</p>", escape_html(&note.body)),
            Self::Label(label_note) => label_note.note_html(format),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Note(_) => "note",
            Self::Label(_) => "label",
        }
    }

    /// Id of the underlying note, or of the first squashed event.
    pub fn id(&self) -> Option<u64> {
        match self {
            Self::Note(note) => Some(note.id),
            Self::Label(label_note) => label_note.events.first().map(|event| event.id),
        }
    }
}

/// Interleaves synthetic label notes into a noteable's notes.
pub struct MergeIntoNotes<'a> {
    noteable: &'a Noteable,
    events: Vec<LabelEvent>,
    params: MergeParams,
}

impl<'a> MergeIntoNotes<'a> {
    pub fn new(noteable: &'a Noteable, events: Vec<LabelEvent>, params: MergeParams) -> Self {
        Self {
            noteable,
            events,
            params,
        }
    }

    /// Returns `notes` and the synthetic notes ordered by creation time.
    ///
    /// Both sources are stable-sorted first; on equal timestamps notes are
    /// placed before synthetic notes.
    pub fn execute(self, mut notes: Vec<Note>) -> Vec<FeedEntry> {
        notes.sort_by_key(|note| note.created_at);
        let synthetic = self.synthetic_notes();

        debug!(
            "Merging {} notes with {} synthetic notes for {}",
            notes.len(),
            synthetic.len(),
            self.noteable
        );

        merge_sorted(notes, synthetic)
    }

    fn synthetic_notes(&self) -> Vec<LabelNote> {
        if self.only_comments() {
            return Vec::new();
        }

        let mut events = since_fetch_at(self.events.clone(), self.params.last_fetched_at);
        events.sort_by_key(|event| event.created_at);

        let mut groups: IndexMap<String, Vec<LabelEvent>> = IndexMap::new();
        for event in events {
            groups.entry(event.discussion_id()).or_default().push(event);
        }

        groups
            .into_values()
            .filter_map(|events| LabelNote::from_events(events, self.noteable))
            .collect()
    }

    fn only_comments(&self) -> bool {
        self.params.notes_filter == NotesFilter::OnlyComments
    }
}

fn merge_sorted(notes: Vec<Note>, synthetic: Vec<LabelNote>) -> Vec<FeedEntry> {
    let mut merged = Vec::with_capacity(notes.len() + synthetic.len());
    let mut notes = notes.into_iter().peekable();
    let mut synthetic = synthetic.into_iter().peekable();

    loop {
        let take_note = match (notes.peek(), synthetic.peek()) {
            (Some(note), Some(label_note)) => {
                note.created_at.cmp(&label_note.created_at) != Ordering::Greater
            }
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };

        let entry = if take_note {
            notes.next().map(FeedEntry::Note)
        } else {
            synthetic.next().map(FeedEntry::Label)
        };
        merged.extend(entry);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::model::fixtures::{at, event, note};
    use crate::activity::model::LabelAction::{Add, Remove};

    const DAY: i64 = 86_400;

    fn noteable() -> Noteable {
        Noteable::issue("group/project", 1)
    }

    fn bodies(entries: &[FeedEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|entry| entry.body(ReferenceFormat::Id))
            .collect()
    }

    #[test]
    fn test_merges_label_events_in_order_of_created_at() {
        let noteable = noteable();
        let note1 = note(1, DAY);
        let note2 = note(2, 3 * DAY);
        let event1 = event(10, 2 * DAY, 1, Add, 5);
        let event2 = event(11, 4 * DAY, 1, Add, 5);

        let entries = MergeIntoNotes::new(
            &noteable,
            vec![event1.clone(), event2.clone()],
            MergeParams::default(),
        )
        .execute(vec![note1.clone(), note2.clone()]);

        let expected = vec![
            note1.discussion_id(),
            event1.discussion_id(),
            note2.discussion_id(),
            event2.discussion_id(),
        ];
        let actual: Vec<String> = entries.iter().map(FeedEntry::discussion_id).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_squashes_events_with_same_time_and_author() {
        let noteable = noteable();
        let events = vec![
            event(1, DAY, 1, Add, 5),
            event(2, DAY, 1, Remove, 6),
            event(3, DAY, 2, Add, 5),
            event(4, 0, 1, Add, 6),
        ];

        let entries =
            MergeIntoNotes::new(&noteable, events, MergeParams::default()).execute(vec![]);

        assert_eq!(entries.len(), 3);
        assert_eq!(
            bodies(&entries),
            vec![
                "added ~6 label",
                "added ~5 label and removed ~6 label",
                "added ~5 label",
            ]
        );
        assert_eq!(entries[1].author().id, 1);
        assert_eq!(entries[2].author().id, 2);
    }

    #[test]
    fn test_interleaved_authors_at_same_instant_get_one_note_each() {
        let noteable = noteable();
        let events = vec![
            event(1, DAY, 1, Add, 5),
            event(2, DAY, 2, Add, 6),
            event(3, DAY, 1, Remove, 7),
        ];

        let entries =
            MergeIntoNotes::new(&noteable, events, MergeParams::default()).execute(vec![]);

        assert_eq!(entries.len(), 2);
        assert_eq!(
            bodies(&entries),
            vec!["added ~5 label and removed ~7 label", "added ~6 label"]
        );
        assert_eq!(entries[0].author().id, 1);
        assert_eq!(entries[1].author().id, 2);
        assert_eq!(entries[0].id(), Some(1));
    }

    #[test]
    fn test_only_comments_excludes_events() {
        let noteable = noteable();
        let params = MergeParams {
            notes_filter: NotesFilter::OnlyComments,
            last_fetched_at: None,
        };

        let entries =
            MergeIntoNotes::new(&noteable, vec![event(1, DAY, 1, Add, 5)], params).execute(vec![]);
        assert!(entries.is_empty());

        let entries = MergeIntoNotes::new(&noteable, vec![event(1, DAY, 1, Add, 5)], params)
            .execute(vec![note(1, 0)]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind(), "note");
    }

    #[test]
    fn test_all_activity_includes_events() {
        let noteable = noteable();
        let entries = MergeIntoNotes::new(
            &noteable,
            vec![event(1, DAY, 1, Add, 5)],
            MergeParams::default(),
        )
        .execute(vec![]);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_system());
    }

    #[test]
    fn test_fetches_only_events_created_after_last_fetched_at() {
        let noteable = noteable();
        let old = event(1, 0, 1, Add, 5);
        let recent = event(2, 3 * DAY, 1, Add, 5);
        let params = MergeParams {
            notes_filter: NotesFilter::AllNotes,
            last_fetched_at: Some(at(2 * DAY).timestamp()),
        };

        let entries = MergeIntoNotes::new(&noteable, vec![old, recent.clone()], params).execute(vec![]);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].discussion_id(), recent.discussion_id());
    }

    #[test]
    fn test_empty_events_pass_notes_through() {
        let noteable = noteable();
        let notes = vec![note(1, 0), note(2, DAY)];
        let entries =
            MergeIntoNotes::new(&noteable, vec![], MergeParams::default()).execute(notes.clone());

        let ids: Vec<Option<u64>> = entries.iter().map(FeedEntry::id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_all_events_in_one_group() {
        let noteable = noteable();
        let events = vec![
            event(1, DAY, 1, Add, 5),
            event(2, DAY, 1, Add, 6),
            event(3, DAY, 1, Remove, 7),
        ];
        let entries =
            MergeIntoNotes::new(&noteable, events, MergeParams::default()).execute(vec![]);

        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].body(ReferenceFormat::Id),
            "added ~5 ~6 labels and removed ~7 label"
        );
    }

    #[test]
    fn test_notes_win_ties_and_keep_their_order() {
        let noteable = noteable();
        let notes = vec![note(1, DAY), note(2, DAY)];
        let entries = MergeIntoNotes::new(
            &noteable,
            vec![event(9, DAY, 3, Add, 5)],
            MergeParams::default(),
        )
        .execute(notes);

        let kinds: Vec<&str> = entries.iter().map(FeedEntry::kind).collect();
        assert_eq!(kinds, vec!["note", "note", "label"]);
        assert_eq!(entries[0].id(), Some(1));
        assert_eq!(entries[1].id(), Some(2));
    }

    #[test]
    fn test_output_is_non_decreasing_for_unsorted_input() {
        let noteable = noteable();
        let notes = vec![note(1, 5 * DAY), note(2, DAY)];
        let events = vec![event(1, 4 * DAY, 1, Add, 5), event(2, 0, 2, Add, 5)];

        let entries = MergeIntoNotes::new(&noteable, events, MergeParams::default()).execute(notes);

        assert_eq!(entries.len(), 4);
        assert!(entries
            .windows(2)
            .all(|pair| pair[0].created_at() <= pair[1].created_at()));
    }
}
