use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use pr_labeler::config::DEFAULT_CONFIG_PATH;
use pr_labeler::github::api::{base_github_url, create_github_client};
use pr_labeler::github::{
    GithubRepoName, GithubRepositoryClient, PullRequestNumber, TriggerContext,
};
use pr_labeler::{run_labeler, RuleSet, RunOptions, RunOutcome};

#[derive(clap::Parser)]
#[command(about = "Labels pull requests based on their changed files, title and merge state")]
struct Opts {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Label the pull request that triggered the current GitHub Actions event.
    Run(RunOpts),
    /// Check a local rule file and print its normalized form.
    Validate {
        /// Path to the rule file.
        path: PathBuf,
    },
}

#[derive(clap::Args)]
struct RunOpts {
    /// Token used to authenticate with the GitHub API.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Repository of the pull request (`<owner>/<name>`).
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<GithubRepoName>,

    /// Path to the JSON payload of the triggering event.
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// Pull request to label. Overrides the number from the event payload.
    #[arg(long)]
    pr_number: Option<u64>,

    /// Event action. Overrides the action from the event payload.
    #[arg(long)]
    action: Option<String>,

    /// Path of the rule file inside the repository.
    #[arg(long, env = "LABELER_CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
    config_path: String,

    /// Git ref from which the rule file is read. Defaults to the default branch.
    #[arg(long, env = "LABELER_CONFIG_REF")]
    config_ref: Option<String>,

    /// Base URL of the GitHub API.
    #[arg(long, env = "GITHUB_API_URL", default_value = base_github_url())]
    api_url: String,

    /// Compute the labels without modifying the pull request.
    #[arg(long)]
    dry_run: bool,
}

fn load_context(opts: &RunOpts) -> anyhow::Result<TriggerContext> {
    let mut context = match &opts.event_path {
        Some(path) => TriggerContext::load(path)?,
        None => TriggerContext {
            repository: None,
            pr_number: None,
            action: String::new(),
        },
    };
    if let Some(repository) = &opts.repository {
        context.repository = Some(repository.clone());
    }
    if let Some(pr_number) = opts.pr_number {
        context.pr_number = Some(PullRequestNumber(pr_number));
    }
    if let Some(action) = &opts.action {
        context.action = action.clone();
    }
    Ok(context)
}

async fn run(opts: RunOpts) -> anyhow::Result<()> {
    let context = load_context(&opts)?;
    let Some(repository) = context.repository.clone() else {
        return Err(anyhow::anyhow!(
            "Repository is unknown, pass --repository or set GITHUB_REPOSITORY"
        ));
    };

    let client = create_github_client(&SecretString::new(opts.token), &opts.api_url)?;
    let client = GithubRepositoryClient::new(client, repository);
    let options = RunOptions {
        config_path: opts.config_path,
        config_ref: opts.config_ref,
        dry_run: opts.dry_run,
    };

    match run_labeler(&client, &context, &options).await? {
        RunOutcome::NotApplicable => tracing::info!("Skipped, not a pull request event"),
        RunOutcome::Unchanged => tracing::info!("Labels are up to date"),
        RunOutcome::DryRun { labels } => tracing::info!("Labels would be set to {labels:?}"),
        RunOutcome::Updated { labels } => tracing::info!("Labels set to {labels:?}"),
    }
    Ok(())
}

fn validate(path: PathBuf) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let rules = RuleSet::from_yaml(&text)?;
    tracing::info!("{} contains {} valid rule(s)", path.display(), rules.len());
    print!("{}", rules.to_yaml()?);
    Ok(())
}

fn try_main(opts: Opts) -> anyhow::Result<()> {
    match opts.command {
        Command::Run(opts) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Cannot build tokio runtime")?;
            runtime.block_on(run(opts))
        }
        Command::Validate { path } => validate(path),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();
    if let Err(error) = try_main(opts) {
        eprintln!("Error: {error:?}");
        std::process::exit(1);
    }
}
