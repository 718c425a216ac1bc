use serde::{Deserialize, Serialize};

use crate::providers::gitlab::links::{environment_path, job_path};

const ENVIRONMENT_PATH: &str = "%{environment_path}";
const DEPLOYMENT_PATH: &str = "%{deployment_path}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Created,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Blocked,
}

/// CI job that performed (or will perform) a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastDeployment {
    pub id: u64,
    #[serde(default)]
    pub deployable: Option<Job>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub last_deployment: Option<LastDeployment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: u64,
    pub iid: u64,
    pub status: DeploymentStatus,
    pub environment: Environment,
    #[serde(default)]
    pub deployable: Option<Job>,
}

impl Deployment {
    /// Whether this is the environment's most recent deployment.
    pub fn is_last(&self) -> bool {
        self.environment
            .last_deployment
            .as_ref()
            .is_some_and(|last| last.id == self.id)
    }

    fn has_other_last_deployment(&self) -> bool {
        self.environment.last_deployment.is_some() && !self.is_last()
    }
}

/// Status-specific wording for a deployment, shown on pipeline and job pages.
///
/// Texts contain `%{environment_path}` and `%{deployment_path}` placeholders,
/// see [`render`].
pub trait DeploymentDetails: Sync {
    fn label(&self) -> &'static str;

    fn matches(&self, deployment: &Deployment) -> bool;

    fn environment_text_for_pipeline(&self, deployment: &Deployment) -> &'static str;

    fn environment_text_for_job(&self, deployment: &Deployment) -> &'static str;

    /// Path of the job behind the environment's most recent deployment.
    fn deployment_path(&self, deployment: &Deployment, project_path: &str) -> Option<String> {
        let last = deployment.environment.last_deployment.as_ref()?;
        let job = last.deployable.as_ref()?;
        Some(job_path(project_path, job.id))
    }
}

pub struct Success;

impl DeploymentDetails for Success {
    fn label(&self) -> &'static str {
        "success"
    }

    fn matches(&self, deployment: &Deployment) -> bool {
        deployment.status == DeploymentStatus::Success
    }

    fn environment_text_for_pipeline(&self, deployment: &Deployment) -> &'static str {
        if deployment.is_last() {
            "Successfully deployed to %{environment_path}."
        } else {
            "Outdated deployment to %{environment_path}. View the most recent deployment %{deployment_path}."
        }
    }

    fn environment_text_for_job(&self, deployment: &Deployment) -> &'static str {
        if deployment.is_last() {
            "This job is the most recent deployment to %{environment_path}."
        } else {
            "This job is an out-of-date deployment to %{environment_path}. View the most recent deployment %{deployment_path}."
        }
    }
}

pub struct Running;

impl DeploymentDetails for Running {
    fn label(&self) -> &'static str {
        "running"
    }

    fn matches(&self, deployment: &Deployment) -> bool {
        deployment.status == DeploymentStatus::Running
    }

    fn environment_text_for_pipeline(&self, _deployment: &Deployment) -> &'static str {
        "Deploying to %{environment_path}."
    }

    fn environment_text_for_job(&self, _deployment: &Deployment) -> &'static str {
        "This job is deploying to %{environment_path}."
    }
}

/// Created deployments and manual ones still waiting to be played.
pub struct Created;

impl DeploymentDetails for Created {
    fn label(&self) -> &'static str {
        "created"
    }

    fn matches(&self, deployment: &Deployment) -> bool {
        matches!(
            deployment.status,
            DeploymentStatus::Created | DeploymentStatus::Blocked
        )
    }

    fn environment_text_for_pipeline(&self, _deployment: &Deployment) -> &'static str {
        "Will deploy to %{environment_path}."
    }

    fn environment_text_for_job(&self, deployment: &Deployment) -> &'static str {
        if deployment.has_other_last_deployment() {
            "This job will deploy to %{environment_path} and overwrite the most recent deployment %{deployment_path}."
        } else {
            "This job will deploy to %{environment_path}."
        }
    }
}

pub struct Failed;

impl DeploymentDetails for Failed {
    fn label(&self) -> &'static str {
        "failed"
    }

    fn matches(&self, deployment: &Deployment) -> bool {
        deployment.status == DeploymentStatus::Failed
    }

    fn environment_text_for_pipeline(&self, _deployment: &Deployment) -> &'static str {
        "Failed to deploy to %{environment_path}."
    }

    fn environment_text_for_job(&self, _deployment: &Deployment) -> &'static str {
        "The deployment of this job to %{environment_path} did not succeed."
    }
}

/// Canceled and skipped deployments.
pub struct Canceled;

impl DeploymentDetails for Canceled {
    fn label(&self) -> &'static str {
        "canceled"
    }

    fn matches(&self, deployment: &Deployment) -> bool {
        matches!(
            deployment.status,
            DeploymentStatus::Canceled | DeploymentStatus::Skipped
        )
    }

    fn environment_text_for_pipeline(&self, _deployment: &Deployment) -> &'static str {
        "Did not deploy to %{environment_path}."
    }

    fn environment_text_for_job(&self, _deployment: &Deployment) -> &'static str {
        "This job was not deployed to %{environment_path}."
    }
}

/// Fallback used when no extended status matches.
pub struct Core;

impl DeploymentDetails for Core {
    fn label(&self) -> &'static str {
        "core"
    }

    fn matches(&self, _deployment: &Deployment) -> bool {
        true
    }

    fn environment_text_for_pipeline(&self, _deployment: &Deployment) -> &'static str {
        "Deployment to %{environment_path}."
    }

    fn environment_text_for_job(&self, _deployment: &Deployment) -> &'static str {
        "This job is associated with %{environment_path}."
    }
}

static EXTENDED: [&dyn DeploymentDetails; 5] = [&Success, &Running, &Created, &Failed, &Canceled];

pub struct DeploymentStatusFactory;

impl DeploymentStatusFactory {
    /// First extended status matching the deployment, or [`Core`].
    pub fn fabricate(deployment: &Deployment) -> &'static dyn DeploymentDetails {
        EXTENDED
            .iter()
            .copied()
            .find(|details| details.matches(deployment))
            .unwrap_or(&Core)
    }
}

/// Substitutes the path placeholders of a status text. Without a deployment
/// path the environment path is used in its place.
pub fn render(template: &str, environment_path: &str, deployment_path: Option<&str>) -> String {
    template
        .replace(ENVIRONMENT_PATH, environment_path)
        .replace(DEPLOYMENT_PATH, deployment_path.unwrap_or(environment_path))
}

/// A deployment paired with its status wording and resolved paths.
pub struct DecoratedDeployment<'a> {
    pub deployment: &'a Deployment,
    pub details: &'static dyn DeploymentDetails,
    pub environment_path: String,
    pub deployment_path: Option<String>,
}

impl<'a> DecoratedDeployment<'a> {
    pub fn new(deployment: &'a Deployment, project_path: &str) -> Self {
        let details = DeploymentStatusFactory::fabricate(deployment);

        Self {
            deployment,
            details,
            environment_path: environment_path(project_path, deployment.environment.id),
            deployment_path: details.deployment_path(deployment, project_path),
        }
    }

    /// Rewrites both paths with `f`, e.g. to turn them into absolute URLs.
    pub fn map_paths(mut self, f: impl Fn(&str) -> String) -> Self {
        self.environment_path = f(&self.environment_path);
        self.deployment_path = self.deployment_path.as_deref().map(&f);
        self
    }

    pub fn text_for_pipeline(&self) -> String {
        render(
            self.details.environment_text_for_pipeline(self.deployment),
            &self.environment_path,
            self.deployment_path.as_deref(),
        )
    }

    pub fn text_for_job(&self) -> String {
        render(
            self.details.environment_text_for_job(self.deployment),
            &self.environment_path,
            self.deployment_path.as_deref(),
        )
    }
}
