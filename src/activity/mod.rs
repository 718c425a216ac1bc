//! Activity feed of an issue or merge request.
//!
//! Persisted notes are merged with synthetic notes built from label events.
//! Label events sharing a timestamp and an author are squashed into a single
//! synthetic note such as `added ~1 label and removed ~2 label`.

mod filter;
mod label_note;
mod merge;
mod model;

pub use filter::{NotesFilter, NotesFinder};
pub(crate) use label_note::escape_html;
pub use merge::{FeedEntry, MergeIntoNotes, MergeParams};
pub use model::{LabelEvent, Note, Noteable, ReferenceFormat};

#[cfg(test)]
pub(crate) use label_note::LabelNote;
#[cfg(test)]
pub(crate) use model::{LabelAction, NoteableKind};
