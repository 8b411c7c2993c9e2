use anyhow::Context;
use async_trait::async_trait;
use octocrab::models::pulls::FileDiff;
use octocrab::Octocrab;

use crate::github::{GithubRepoName, LabelerClient, PullRequest, PullRequestNumber};

/// Provides access to a single repository using the GitHub API.
pub struct GithubRepositoryClient {
    client: Octocrab,
    repo_name: GithubRepoName,
}

impl GithubRepositoryClient {
    pub fn new(client: Octocrab, repo_name: GithubRepoName) -> Self {
        Self { client, repo_name }
    }

    pub fn name(&self) -> &GithubRepoName {
        &self.repo_name
    }

    fn format_pr(&self, pr: PullRequestNumber) -> String {
        format!("{}/{}/{}", self.name().owner(), self.name().name(), pr)
    }
}

#[async_trait]
impl LabelerClient for GithubRepositoryClient {
    fn repository(&self) -> &GithubRepoName {
        self.name()
    }

    async fn list_changed_files(&self, pr: PullRequestNumber) -> anyhow::Result<Vec<String>> {
        // https://docs.github.com/en/rest/pulls/pulls?apiVersion=2022-11-28#list-pull-requests-files
        let first_page = self
            .client
            .pulls(self.name().owner(), self.name().name())
            .list_files(pr.0)
            .await
            .with_context(|| format!("Cannot list changed files of {}", self.format_pr(pr)))?;
        let files: Vec<FileDiff> = self
            .client
            .all_pages(first_page)
            .await
            .with_context(|| format!("Cannot list changed files of {}", self.format_pr(pr)))?;
        tracing::debug!("Found {} changed file(s) in {}", files.len(), self.format_pr(pr));
        Ok(files.into_iter().map(|file| file.filename).collect())
    }

    async fn get_pull_request(&self, pr: PullRequestNumber) -> anyhow::Result<PullRequest> {
        let pr = self
            .client
            .pulls(self.name().owner(), self.name().name())
            .get(pr.0)
            .await
            .map_err(|error| {
                anyhow::anyhow!("Could not get PR {}/{}: {error:?}", self.repository(), pr.0)
            })?;
        Ok(github_pr_to_pr(pr))
    }

    async fn read_file(&self, path: &str, git_ref: Option<&str>) -> anyhow::Result<String> {
        let repos = self.client.repos(self.name().owner(), self.name().name());
        let mut request = repos.get_content().path(path);
        if let Some(git_ref) = git_ref {
            request = request.r#ref(git_ref);
        }
        let content = request.send().await.with_context(|| {
            format!(
                "Cannot read {path} from {} (ref {})",
                self.name(),
                git_ref.unwrap_or("<default branch>")
            )
        })?;

        let Some(file) = content.items.into_iter().next() else {
            return Err(anyhow::anyhow!("{path} not found in {}", self.name()));
        };
        file.decoded_content()
            .ok_or_else(|| anyhow::anyhow!("{path} in {} is not a text file", self.name()))
    }

    async fn replace_labels(
        &self,
        pr: PullRequestNumber,
        labels: &[String],
    ) -> anyhow::Result<()> {
        self.client
            .issues(self.name().owner(), self.name().name())
            .replace_all_labels(pr.0, labels)
            .await
            .with_context(|| format!("Cannot replace labels of {}", self.format_pr(pr)))?;
        Ok(())
    }
}

fn github_pr_to_pr(pr: octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        title: pr.title.unwrap_or_default(),
        labels: pr
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(|label| label.name)
            .collect(),
        mergeable: pr.mergeable.into(),
    }
}
