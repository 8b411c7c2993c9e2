//! Contains definitions of common types (pull request, repository name) needed
//! for working with GitHub repositories, and the client used to talk to them.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use async_trait::async_trait;

use crate::labeler::MergeableState;

pub mod api;
pub mod event;

pub use api::client::GithubRepositoryClient;
pub use event::TriggerContext;

/// Unique identifier of a GitHub repository
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct GithubRepoName {
    owner: String,
    name: String,
}

impl GithubRepoName {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_lowercase(),
            name: name.to_lowercase(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for GithubRepoName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}/{}", self.owner, self.name))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Repository name `{0}` is not in the `<owner>/<name>` format")]
pub struct InvalidRepoName(String);

impl FromStr for GithubRepoName {
    type Err = InvalidRepoName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(InvalidRepoName(value.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PullRequestNumber(pub u64);

impl From<u64> for PullRequestNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for PullRequestNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <u64 as Display>::fmt(&self.0, f)
    }
}

#[derive(Clone, Debug)]
pub struct PullRequest {
    pub title: String,
    pub labels: Vec<String>,
    pub mergeable: MergeableState,
}

/// Provides access to the pull requests of a single repository.
/// It is behind a trait to allow easier mocking in tests.
#[async_trait]
pub trait LabelerClient {
    fn repository(&self) -> &GithubRepoName;

    /// Return paths of all files changed by the given PR.
    async fn list_changed_files(&self, pr: PullRequestNumber) -> anyhow::Result<Vec<String>>;

    /// Resolve a pull request from this repository by its number.
    async fn get_pull_request(&self, pr: PullRequestNumber) -> anyhow::Result<PullRequest>;

    /// Read a text file from the repository, either from the given git ref or from the
    /// default branch.
    async fn read_file(&self, path: &str, git_ref: Option<&str>) -> anyhow::Result<String>;

    /// Replace all labels of the PR with `labels`.
    async fn replace_labels(
        &self,
        pr: PullRequestNumber,
        labels: &[String],
    ) -> anyhow::Result<()>;
}
