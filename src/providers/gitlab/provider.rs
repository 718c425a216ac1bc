use chrono::Utc;
use log::{info, warn};

use crate::activity::{LabelEvent, MergeParams, Note, Noteable, ReferenceFormat};
use crate::auth::Token;
use crate::error::{GlActivityError, Result};
use crate::feed::{ActivityFeed, DeploymentReport, FeedSource};
use crate::providers::gitlab::client::GitLabClient;
use crate::status::DecoratedDeployment;

use super::cache::FeedCache;
use super::links::web_url;
use super::progress_bar::PhaseProgress;

/// How a feed should be collected.
#[derive(Debug, Clone, Copy)]
pub struct FeedOptions {
    pub params: MergeParams,
    /// Maximum number of notes, and of label events, to fetch
    pub limit: usize,
    pub reference_format: ReferenceFormat,
    /// Use the previous fetch time from the cache as `last_fetched_at`
    pub incremental: bool,
    /// Rebuild the feed from the cache without calling the API
    pub offline: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            params: MergeParams::default(),
            limit: 1000,
            reference_format: ReferenceFormat::Name,
            incremental: false,
            offline: false,
        }
    }
}

/// GitLab activity and deployment provider.
///
/// Fetches notes, label events and deployments from GitLab's REST API and
/// turns them into activity feeds and deployment status reports.
pub struct GitLabProvider {
    pub client: GitLabClient,
    pub project_path: String,
}

impl GitLabProvider {
    /// Creates a new GitLab provider for the specified project.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitLab instance base URL (e.g., <https://gitlab.com>)
    /// * `project_path` - Project path (e.g., "group/project")
    /// * `token` - Optional authentication token
    ///
    /// # Errors
    ///
    /// Returns an error if the API endpoint URL cannot be constructed.
    pub fn new(base_url: &str, project_path: String, token: Option<Token>) -> Result<Self> {
        let client = GitLabClient::new(base_url, token)?;

        Ok(Self {
            client,
            project_path,
        })
    }

    async fn fetch_activity(
        &self,
        noteable: &Noteable,
        limit: usize,
    ) -> Result<(Vec<Note>, Vec<LabelEvent>)> {
        info!("Fetching notes and label events for {noteable}...");

        futures::future::try_join(
            self.client.fetch_notes(noteable, limit),
            self.client.fetch_label_events(noteable, limit),
        )
        .await
    }

    /// Collects the activity feed of an issue or merge request.
    ///
    /// Progress is displayed in three phases:
    /// 1. Fetching notes and label events (or reading them from the cache)
    /// 2. Merging label events into the notes
    /// 3. Updating the feed cache
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - API requests fail after retries
    /// - The issue or merge request is not found
    /// - `offline` is set and nothing is cached for the noteable
    pub async fn collect_feed(
        &self,
        noteable: &Noteable,
        options: &FeedOptions,
        cache: &mut FeedCache,
    ) -> Result<ActivityFeed> {
        info!("Starting feed collection for {noteable}");

        let mut params = options.params;
        if params.last_fetched_at.is_none() && options.incremental {
            params.last_fetched_at = cache.last_fetched_at();
            if params.last_fetched_at.is_none() {
                warn!("No previous fetch cached for {noteable}, showing the full feed");
            }
        }

        // Phase 1: Fetching
        let progress = PhaseProgress::start_phase_1(&noteable.to_string());

        // Taken before fetching so the next incremental run overlaps this one
        let fetched_at = Utc::now().timestamp();

        let (notes, events) = if options.offline {
            if !cache.is_enabled() {
                return Err(GlActivityError::Cache(
                    "Feed cache is disabled, cannot build an offline feed".into(),
                ));
            }
            let snapshot = cache.snapshot().ok_or_else(|| {
                GlActivityError::Cache(format!("No cached feed for {noteable}"))
            })?;
            (snapshot.notes.clone(), snapshot.events.clone())
        } else {
            self.fetch_activity(noteable, options.limit).await?
        };

        // Phase 2: Merging
        let progress = progress.finish_phase_1_start_phase_2(notes.len(), events.len());

        let base_url = self.client.web_base();
        let source = FeedSource {
            provider: "GitLab",
            base_url: &base_url,
            noteable,
            reference_format: options.reference_format,
        };
        let feed = ActivityFeed::build(&source, notes.clone(), events.clone(), params);

        // Phase 3: Caching
        let progress = progress.finish_phase_2_start_phase_3(feed.entries.len());

        if !options.offline {
            cache.save(&notes, &events, fetched_at)?;
        }

        progress.finish_phase_3();

        info!(
            "Feed for {noteable}: {} entries ({} notes, {} label events)",
            feed.entries.len(),
            feed.total_notes,
            feed.total_label_events
        );

        Ok(feed)
    }

    /// Describes a deployment the way pipeline and job pages do.
    ///
    /// The deployment payload embeds its environment without the last
    /// deployment, so the environment is fetched separately.
    pub async fn deployment_status(&self, deployment_id: u64) -> Result<DeploymentReport> {
        let mut deployment = self
            .client
            .fetch_deployment(&self.project_path, deployment_id)
            .await?;

        let environment = self
            .client
            .fetch_environment(&self.project_path, deployment.environment.id)
            .await?;
        deployment.environment.last_deployment = environment.last_deployment;

        let base_url = self.client.web_base();
        let decorated = DecoratedDeployment::new(&deployment, &self.project_path)
            .map_paths(|path| web_url(&base_url, path));

        Ok(DeploymentReport::from_decorated(&self.project_path, &decorated))
    }
}
