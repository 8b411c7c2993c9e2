use std::path::Path;

use anyhow::Context;

use crate::github::{GithubRepoName, PullRequestNumber};

/// Describes the event that triggered a labeler run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerContext {
    pub repository: Option<GithubRepoName>,
    /// `None` if the event does not belong to a pull request.
    pub pr_number: Option<PullRequestNumber>,
    pub action: String,
}

#[derive(serde::Deserialize, Debug)]
struct EventPayload {
    action: Option<String>,
    number: Option<u64>,
    pull_request: Option<PullRequestPayload>,
    issue: Option<IssuePayload>,
    repository: Option<RepositoryPayload>,
}

#[derive(serde::Deserialize, Debug)]
struct PullRequestPayload {
    number: u64,
}

#[derive(serde::Deserialize, Debug)]
struct IssuePayload {
    number: u64,
    /// Only present if the issue is a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(serde::Deserialize, Debug)]
struct RepositoryPayload {
    name: String,
    owner: OwnerPayload,
}

#[derive(serde::Deserialize, Debug)]
struct OwnerPayload {
    login: String,
}

impl TriggerContext {
    /// Loads the webhook payload of the current GitHub Actions event.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let body = std::fs::read(path)
            .with_context(|| format!("Cannot read event payload from {}", path.display()))?;
        Self::from_payload(&body)
    }

    pub fn from_payload(body: &[u8]) -> anyhow::Result<Self> {
        let payload: EventPayload =
            serde_json::from_slice(body).context("Cannot parse event payload")?;

        let pr_number = payload
            .pull_request
            .map(|pr| pr.number)
            .or(payload.number)
            .or_else(|| {
                payload
                    .issue
                    .filter(|issue| issue.pull_request.is_some())
                    .map(|issue| issue.number)
            })
            .map(PullRequestNumber);

        Ok(Self {
            repository: payload
                .repository
                .map(|repo| GithubRepoName::new(&repo.owner.login, &repo.name)),
            pr_number,
            action: payload.action.unwrap_or_default(),
        })
    }
}
