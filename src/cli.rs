use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::activity::{LabelEvent, MergeParams, Note, Noteable, NotesFilter, ReferenceFormat};
use crate::auth::Token;
use crate::config::{Config, OutputFormat};
use crate::feed::{ActivityFeed, FeedSource};
use crate::output::{export_deployment, export_feed, print_deployment_summary, print_feed_summary};
use crate::providers::{FeedCache, FeedOptions, GitLabProvider};

#[derive(Parser)]
#[command(name = "glactivity")]
#[command(author, version, about = "GitLab activity feeds and deployment status", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./glactivity.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(short, long, global = true, env = "GITLAB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitLab instance URL
    #[arg(short, long, global = true)]
    url: Option<String>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("noteable").required(true).args(["issue", "merge_request"])))]
struct NoteableArgs {
    #[arg(short = 'P', long)]
    project: Option<String>,

    #[arg(short, long)]
    issue: Option<u64>,

    #[arg(short, long)]
    merge_request: Option<u64>,

    /// all, comments or activity
    #[arg(long)]
    filter: Option<NotesFilter>,

    /// Only show activity since this unix timestamp
    #[arg(short, long)]
    since: Option<i64>,

    /// Render label references by id instead of by name
    #[arg(long, default_value_t = false)]
    ids: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Activity feed of an issue or merge request
    Feed {
        #[command(flatten)]
        target: NoteableArgs,

        /// Only show activity since the previous run
        #[arg(long, default_value_t = false)]
        incremental: bool,

        /// Rebuild the feed from the cache without calling GitLab
        #[arg(long, default_value_t = false)]
        offline: bool,

        #[arg(long, default_value_t = false)]
        no_cache: bool,

        #[arg(long, default_value_t = false)]
        clear_cache: bool,

        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Merge exported notes and label events without calling GitLab
    Merge {
        #[command(flatten)]
        target: NoteableArgs,

        /// JSON array of notes as returned by the notes API
        #[arg(long)]
        notes: PathBuf,

        /// JSON array of resource label events
        #[arg(long)]
        events: PathBuf,
    },
    /// Describe a deployment the way pipeline and job pages do
    Deployment {
        #[arg(short = 'P', long)]
        project: Option<String>,

        #[arg(short, long)]
        deployment: u64,
    },
}

impl NoteableArgs {
    fn noteable(&self, config: &Config) -> Result<Noteable> {
        let project = resolve_project(self.project.as_deref(), config)?;

        match (self.issue, self.merge_request) {
            (Some(iid), _) => Ok(Noteable::issue(project, iid)),
            (None, Some(iid)) => Ok(Noteable::merge_request(project, iid)),
            (None, None) => bail!("Either --issue or --merge-request is required"),
        }
    }

    fn params(&self, config: &Config) -> MergeParams {
        MergeParams {
            notes_filter: self.filter.unwrap_or(config.feed.notes_filter),
            last_fetched_at: self.since,
        }
    }

    fn reference_format(&self, config: &Config) -> ReferenceFormat {
        if self.ids {
            ReferenceFormat::Id
        } else {
            config.output.reference_format
        }
    }
}

fn resolve_project(project: Option<&str>, config: &Config) -> Result<String> {
    project
        .map(str::to_string)
        .or_else(|| config.gitlab.project_path.clone())
        .context("No project given: pass --project or set gitlab.project-path")
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

impl Cli {
    fn base_url(&self, config: &Config) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| config.gitlab.base_url.clone())
    }

    fn token(&self, config: &Config) -> Option<Token> {
        self.token
            .as_deref()
            .or(config.gitlab.token.as_deref())
            .map(Token::from)
    }

    fn format(&self, config: &Config) -> OutputFormat {
        self.format.unwrap_or(config.output.format)
    }

    fn write_report(&self, export: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<()> {
        if let Some(output_path) = &self.output {
            let mut file = std::fs::File::create(output_path)
                .with_context(|| format!("Failed to create {}", output_path.display()))?;
            export(&mut file)?;
            info!("Report written to: {}", output_path.display());
        } else {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            export(&mut handle)?;
        }

        Ok(())
    }

    fn emit_feed(&self, feed: &ActivityFeed, config: &Config) -> Result<()> {
        let format = self.format(config);
        if format == OutputFormat::Summary && self.output.is_none() {
            print_feed_summary(feed);
            return Ok(());
        }

        let pretty = self.pretty || config.output.pretty;
        self.write_report(|output| export_feed(feed, format, pretty, output))
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_feed(
        &self,
        config: &Config,
        target: &NoteableArgs,
        incremental: bool,
        offline: bool,
        no_cache: bool,
        clear_cache: bool,
        limit: Option<usize>,
    ) -> Result<()> {
        let noteable = target.noteable(config)?;
        info!("Collecting activity feed for {noteable}");

        if clear_cache {
            FeedCache::clear_noteable_cache(&noteable)?;
        }

        let cache_enabled = !(no_cache || config.gitlab.no_cache);
        let mut cache = FeedCache::new(&noteable, cache_enabled)?;

        let options = FeedOptions {
            params: target.params(config),
            limit: limit.unwrap_or(config.gitlab.limit),
            reference_format: target.reference_format(config),
            incremental: incremental || config.feed.incremental,
            offline,
        };

        let provider = GitLabProvider::new(
            &self.base_url(config),
            noteable.project_path.clone(),
            self.token(config),
        )?;

        let feed = provider.collect_feed(&noteable, &options, &mut cache).await?;

        self.emit_feed(&feed, config)
    }

    fn execute_merge(
        &self,
        config: &Config,
        target: &NoteableArgs,
        notes: &Path,
        events: &Path,
    ) -> Result<()> {
        let noteable = target.noteable(config)?;
        let notes: Vec<Note> = read_json(notes)?;
        let events: Vec<LabelEvent> = read_json(events)?;
        info!(
            "Merging {} notes and {} label events for {noteable}",
            notes.len(),
            events.len()
        );

        let base_url = self.base_url(config);
        let source = FeedSource {
            provider: "GitLab",
            base_url: base_url.trim_end_matches('/'),
            noteable: &noteable,
            reference_format: target.reference_format(config),
        };
        let feed = ActivityFeed::build(&source, notes, events, target.params(config));

        self.emit_feed(&feed, config)
    }

    async fn execute_deployment(
        &self,
        config: &Config,
        project: Option<&str>,
        deployment_id: u64,
    ) -> Result<()> {
        let project = resolve_project(project, config)?;
        info!("Describing deployment {deployment_id} of {project}");

        let provider = GitLabProvider::new(&self.base_url(config), project, self.token(config))?;
        let report = provider.deployment_status(deployment_id).await?;

        let format = self.format(config);
        if format == OutputFormat::Summary && self.output.is_none() {
            print_deployment_summary(&report);
            return Ok(());
        }

        let pretty = self.pretty || config.output.pretty;
        self.write_report(|output| export_deployment(&report, format, pretty, output))
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Feed {
                target,
                incremental,
                offline,
                no_cache,
                clear_cache,
                limit,
            } => {
                self.execute_feed(
                    &config,
                    target,
                    *incremental,
                    *offline,
                    *no_cache,
                    *clear_cache,
                    *limit,
                )
                .await
            }
            Commands::Merge {
                target,
                notes,
                events,
            } => self.execute_merge(&config, target, notes, events),
            Commands::Deployment {
                project,
                deployment,
            } => {
                self.execute_deployment(&config, project.as_deref(), *deployment)
                    .await
            }
        }
    }
}
