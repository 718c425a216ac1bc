use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::model::{Author, LabelAction, LabelEvent, Noteable, ReferenceFormat};

/// Synthetic system note standing in for a group of label events that share
/// a timestamp and an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelNote {
    pub discussion_id: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub noteable: Noteable,
    pub events: Vec<LabelEvent>,
}

impl LabelNote {
    /// Builds the note from a group of events; the first event supplies the
    /// author, timestamp and discussion id.
    pub fn from_events(events: Vec<LabelEvent>, noteable: &Noteable) -> Option<Self> {
        let first = events.first()?;

        Some(Self {
            discussion_id: first.discussion_id(),
            author: first.user.clone(),
            created_at: first.created_at,
            noteable: noteable.clone(),
            events,
        })
    }

    /// Plain text, e.g. `added ~1 ~2 labels and removed ~3 label`.
    pub fn note(&self, format: ReferenceFormat) -> String {
        self.phrases(format, |reference| reference.to_string())
    }

    pub fn note_html(&self, format: ReferenceFormat) -> String {
        let text = self.phrases(format, |reference| {
            format!(
                "<span class=\"gfm gfm-label\">{}</span>",
                escape_html(reference)
            )
        });
        format!("<p dir=\"auto\">{text}</p>")
    }

    fn phrases(&self, format: ReferenceFormat, render: impl Fn(&str) -> String) -> String {
        let added = self.references(LabelAction::Add, format);
        let removed = self.references(LabelAction::Remove, format);

        [("added", added), ("removed", removed)]
            .into_iter()
            .filter(|(_, refs)| !refs.is_empty())
            .map(|(verb, refs)| {
                let suffix = if refs.len() == 1 { "label" } else { "labels" };
                let rendered: Vec<String> = refs.iter().map(|r| render(r.as_str())).collect();
                format!("{verb} {} {suffix}", rendered.join(" "))
            })
            .collect::<Vec<_>>()
            .join(" and ")
    }

    fn references(&self, action: LabelAction, format: ReferenceFormat) -> IndexSet<String> {
        self.events
            .iter()
            .filter(|event| event.action == action)
            .map(|event| event.reference(&self.noteable.project_path, format))
            .collect()
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::model::fixtures::{event, label};
    use crate::activity::model::LabelAction::{Add, Remove};

    fn noteable() -> Noteable {
        Noteable::issue("group/project", 1)
    }

    #[test]
    fn test_from_empty_group_is_none() {
        assert!(LabelNote::from_events(vec![], &noteable()).is_none());
    }

    #[test]
    fn test_single_added_label() {
        let note = LabelNote::from_events(vec![event(1, 0, 1, Add, 10)], &noteable()).unwrap();
        assert_eq!(note.note(ReferenceFormat::Id), "added ~10 label");
        assert_eq!(note.author.id, 1);
    }

    #[test]
    fn test_added_and_removed_are_joined() {
        let events = vec![event(1, 0, 1, Add, 10), event(2, 0, 1, Remove, 20)];
        let note = LabelNote::from_events(events, &noteable()).unwrap();
        assert_eq!(
            note.note(ReferenceFormat::Id),
            "added ~10 label and removed ~20 label"
        );
    }

    #[test]
    fn test_added_phrase_comes_first_regardless_of_event_order() {
        let events = vec![
            event(1, 0, 1, Remove, 20),
            event(2, 0, 1, Add, 10),
            event(3, 0, 1, Add, 11),
        ];
        let note = LabelNote::from_events(events, &noteable()).unwrap();
        assert_eq!(
            note.note(ReferenceFormat::Name),
            "added ~label-10 ~label-11 labels and removed ~label-20 label"
        );
    }

    #[test]
    fn test_only_removed() {
        let events = vec![event(1, 0, 1, Remove, 20), event(2, 0, 1, Remove, 21)];
        let note = LabelNote::from_events(events, &noteable()).unwrap();
        assert_eq!(note.note(ReferenceFormat::Id), "removed ~20 ~21 labels");
    }

    #[test]
    fn test_repeated_reference_listed_once() {
        let events = vec![event(1, 0, 1, Add, 10), event(2, 0, 1, Add, 10)];
        let note = LabelNote::from_events(events, &noteable()).unwrap();
        assert_eq!(note.note(ReferenceFormat::Id), "added ~10 label");
    }

    #[test]
    fn test_note_html_escapes_and_wraps() {
        let mut e = event(1, 0, 1, Add, 10);
        e.label = Some(label(10, "a<b"));
        let note = LabelNote::from_events(vec![e], &noteable()).unwrap();
        assert_eq!(
            note.note_html(ReferenceFormat::Name),
            "<p dir=\"auto\">added <span class=\"gfm gfm-label\">~a&lt;b</span> label</p>"
        );
    }
}
