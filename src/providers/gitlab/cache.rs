use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::activity::{LabelEvent, Note, Noteable};
use crate::error::{GlActivityError, Result};

/// Notes and label events of one noteable as seen by the last fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedFeed {
    /// Unix seconds of the fetch that produced this snapshot
    pub fetched_at: i64,
    pub notes: Vec<Note>,
    pub events: Vec<LabelEvent>,
}

/// Feed cache for GitLab issues and merge requests.
///
/// Keeps the last fetched notes and label events per noteable so that the
/// next run can show only what changed since then, or rebuild the feed
/// without network access. Uses one file per noteable in platform-specific
/// cache directories:
/// - Linux: `~/.cache/glactivity/gitlab/{project-slug}-{kind}-{iid}.json`
/// - macOS: `~/Library/Caches/glactivity/gitlab/{project-slug}-{kind}-{iid}.json`
pub struct FeedCache {
    cache_file: PathBuf,
    snapshot: Option<CachedFeed>,
    enabled: bool,
}

impl FeedCache {
    /// Creates a cache for `noteable`, loading any existing snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if cache directory cannot be determined or created.
    pub fn new(noteable: &Noteable, enabled: bool) -> Result<Self> {
        if !enabled {
            debug!("Feed cache disabled");
            return Ok(Self::disabled());
        }

        Self::in_dir(&cache_root()?, noteable)
    }

    pub fn disabled() -> Self {
        Self {
            cache_file: PathBuf::new(),
            snapshot: None,
            enabled: false,
        }
    }

    /// Cache rooted at `root` instead of the platform cache directory.
    pub fn in_dir(root: &Path, noteable: &Noteable) -> Result<Self> {
        let cache_dir = root.join("glactivity").join("gitlab");
        fs::create_dir_all(&cache_dir)?;

        let cache_file = cache_dir.join(cache_filename(noteable));

        let snapshot = if cache_file.exists() {
            fs::read_to_string(&cache_file)
                .ok()
                .and_then(|content| serde_json::from_str(&content).ok())
                .inspect(|_| debug!("Loaded cache from: {}", cache_file.display()))
                .or_else(|| {
                    warn!("Failed to load cache, starting with empty cache");
                    None
                })
        } else {
            None
        };

        info!("Feed cache enabled at: {}", cache_file.display());

        Ok(Self {
            cache_file,
            snapshot,
            enabled: true,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn snapshot(&self) -> Option<&CachedFeed> {
        self.snapshot.as_ref()
    }

    /// Time of the previous fetch, used as `last_fetched_at` for
    /// incremental runs.
    pub fn last_fetched_at(&self) -> Option<i64> {
        self.snapshot.as_ref().map(|snapshot| snapshot.fetched_at)
    }

    /// Merges freshly fetched data into the snapshot and writes it to disk.
    ///
    /// Items are keyed by id; a fetched item replaces its cached copy in
    /// place and unseen items are appended in fetch order.
    pub fn save(&mut self, notes: &[Note], events: &[LabelEvent], fetched_at: i64) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let snapshot = match self.snapshot.take() {
            Some(previous) => CachedFeed {
                fetched_at,
                notes: merge_by_id(previous.notes, notes, |note| note.id),
                events: merge_by_id(previous.events, events, |event| event.id),
            },
            None => CachedFeed {
                fetched_at,
                notes: notes.to_vec(),
                events: events.to_vec(),
            },
        };

        let content = serde_json::to_string(&snapshot)?;
        fs::write(&self.cache_file, content)?;

        debug!(
            "Saved {} notes and {} label events to cache: {}",
            snapshot.notes.len(),
            snapshot.events.len(),
            self.cache_file.display()
        );

        self.snapshot = Some(snapshot);
        Ok(())
    }

    /// Removes the cache file of a noteable.
    ///
    /// # Errors
    ///
    /// Returns an error if cache file cannot be removed.
    pub fn clear_noteable_cache(noteable: &Noteable) -> Result<()> {
        let cache_file = cache_root()?
            .join("glactivity")
            .join("gitlab")
            .join(cache_filename(noteable));

        if cache_file.exists() {
            fs::remove_file(&cache_file)?;
            info!("Cache cleared: {}", cache_file.display());
        } else {
            info!("No cache file found for {noteable}");
        }

        Ok(())
    }
}

fn merge_by_id<T: Clone>(cached: Vec<T>, fresh: &[T], id: impl Fn(&T) -> u64) -> Vec<T> {
    let mut merged: IndexMap<u64, T> = cached.into_iter().map(|item| (id(&item), item)).collect();
    for item in fresh {
        merged.insert(id(item), item.clone());
    }
    merged.into_values().collect()
}

fn cache_root() -> Result<PathBuf> {
    dirs::cache_dir().ok_or_else(|| GlActivityError::Cache("No cache directory found".into()))
}

// "group/project" issue 12 -> "group%2Fproject-issues-12.json"
fn cache_filename(noteable: &Noteable) -> String {
    format!(
        "{}-{}-{}.json",
        urlencoding::encode(&noteable.project_path),
        noteable.kind.api_segment(),
        noteable.iid
    )
}
