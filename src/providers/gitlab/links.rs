use crate::activity::{FeedEntry, Noteable};

/// Relative path of a CI job page.
///
/// # Returns
///
/// Path like `/group/project/-/jobs/456`
pub fn job_path(project_path: &str, job_id: u64) -> String {
    format!("/{project_path}/-/jobs/{job_id}")
}

/// Relative path of an environment page.
///
/// # Returns
///
/// Path like `/group/project/-/environments/7`
pub fn environment_path(project_path: &str, environment_id: u64) -> String {
    format!("/{project_path}/-/environments/{environment_id}")
}

/// Relative path of an issue or merge request page.
pub fn noteable_path(noteable: &Noteable) -> String {
    format!(
        "/{}/-/{}/{}",
        noteable.project_path,
        noteable.kind.api_segment(),
        noteable.iid
    )
}

/// Joins a GitLab base URL and a relative web path.
///
/// # Arguments
///
/// * `base_url` - GitLab instance base URL (e.g., <https://gitlab.com>)
/// * `path` - Path starting with `/`
pub fn web_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Converts a feed entry to a clickable anchor on the noteable's page.
///
/// Persisted notes link to `#note_<id>`; synthetic label notes have no note
/// id and link to the noteable itself.
pub fn feed_entry_url(base_url: &str, noteable: &Noteable, entry: &FeedEntry) -> String {
    let page = web_url(base_url, &noteable_path(noteable));
    match entry {
        FeedEntry::Note(note) => format!("{page}#note_{}", note.id),
        FeedEntry::Label(_) => page,
    }
}
