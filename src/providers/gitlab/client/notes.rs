use log::info;
use url::Url;

use super::core::GitLabClient;
use crate::activity::{LabelEvent, Note, Noteable};
use crate::error::Result;

impl GitLabClient {
    fn noteable_url(&self, noteable: &Noteable) -> Result<Url> {
        let project = self.project_url(&noteable.project_path)?;
        Self::join(
            &project,
            &format!("{}/{}/", noteable.kind.api_segment(), noteable.iid),
        )
    }

    /// Fetch the notes of an issue or merge request, oldest first.
    ///
    /// # Errors
    /// Returns an error if the noteable does not exist or a request keeps
    /// failing after retries.
    pub async fn fetch_notes(&self, noteable: &Noteable, limit: usize) -> Result<Vec<Note>> {
        let url = Self::join(&self.noteable_url(noteable)?, "notes")?;
        let query = [
            ("sort", "asc".to_string()),
            ("order_by", "created_at".to_string()),
        ];

        let notes: Vec<Note> = self.get_all_pages(&url, &query, limit).await?;
        info!("Fetched {} notes for {noteable}", notes.len());

        Ok(notes)
    }

    /// Fetch the label add/remove events of an issue or merge request.
    pub async fn fetch_label_events(
        &self,
        noteable: &Noteable,
        limit: usize,
    ) -> Result<Vec<LabelEvent>> {
        let url = Self::join(&self.noteable_url(noteable)?, "resource_label_events")?;

        let events: Vec<LabelEvent> = self.get_all_pages(&url, &[], limit).await?;
        info!("Fetched {} label events for {noteable}", events.len());

        Ok(events)
    }
}
