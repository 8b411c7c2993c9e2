use anyhow::Context;
use octocrab::Octocrab;
use secrecy::{ExposeSecret, SecretString};

pub mod client;

pub fn base_github_url() -> &'static str {
    "https://api.github.com"
}

/// Creates an API client authenticated with the given token (usually the `GITHUB_TOKEN` of an
/// Actions job). `api_url` can point to a GitHub Enterprise instance.
pub fn create_github_client(token: &SecretString, api_url: &str) -> anyhow::Result<Octocrab> {
    Octocrab::builder()
        .personal_token(token.expose_secret().to_string())
        .base_uri(api_url)
        .with_context(|| format!("Invalid GitHub API URL {api_url}"))?
        .build()
        .context("Could not create octocrab client")
}
