use log::info;

use super::core::GitLabClient;
use crate::error::Result;
use crate::status::{Deployment, Environment};

impl GitLabClient {
    /// Fetch a single deployment. The embedded environment carries no
    /// `last_deployment`; see [`GitLabClient::fetch_environment`].
    pub async fn fetch_deployment(&self, project_path: &str, deployment_id: u64) -> Result<Deployment> {
        let url = Self::join(
            &self.project_url(project_path)?,
            &format!("deployments/{deployment_id}"),
        )?;

        let deployment: Deployment = self.get_json(&url).await?;
        info!(
            "Fetched deployment {} ({:?}) to {}",
            deployment.id, deployment.status, deployment.environment.name
        );

        Ok(deployment)
    }

    pub async fn fetch_environment(&self, project_path: &str, environment_id: u64) -> Result<Environment> {
        let url = Self::join(
            &self.project_url(project_path)?,
            &format!("environments/{environment_id}"),
        )?;

        self.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::DeploymentStatus;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_fetch_deployment_and_environment() {
        let mut server = mockito::Server::new_async().await;
        let _deployment = server
            .mock("GET", Matcher::Regex("/deployments/41$".to_string()))
            .with_body(
                r#"{
                    "id": 41, "iid": 1, "ref": "main", "status": "success",
                    "environment": {"id": 9, "name": "production", "external_url": null},
                    "deployable": {"id": 1278, "name": "deploy", "status": "success"}
                }"#,
            )
            .create_async()
            .await;
        let _environment = server
            .mock("GET", Matcher::Regex("/environments/9$".to_string()))
            .with_body(
                r#"{
                    "id": 9, "name": "production", "slug": "production",
                    "external_url": "https://example.com", "state": "available",
                    "last_deployment": {"id": 41, "iid": 1, "status": "success",
                        "deployable": {"id": 1278, "name": "deploy"}}
                }"#,
            )
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();

        let deployment = client.fetch_deployment("group/project", 41).await.unwrap();
        assert_eq!(deployment.status, DeploymentStatus::Success);
        assert!(deployment.environment.last_deployment.is_none());

        let environment = client.fetch_environment("group/project", 9).await.unwrap();
        assert_eq!(environment.last_deployment.map(|d| d.id), Some(41));
    }
}
