use tracing::Instrument;

use crate::config::{RuleSet, DEFAULT_CONFIG_PATH};
use crate::error::LabelerError;
use crate::github::{LabelerClient, PullRequestNumber, TriggerContext};
use crate::labeler::{evaluate, same_labels, PullRequestFacts};

#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Path of the rule file inside the repository.
    pub config_path: String,
    /// Git ref from which the rule file is read. The default branch is used if missing.
    pub config_ref: Option<String>,
    /// Compute the labels, but do not modify the PR.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            config_ref: None,
            dry_run: false,
        }
    }
}

/// What a labeler run did.
#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The triggering event does not belong to a pull request.
    NotApplicable,
    /// The labels of the PR already match the rules.
    Unchanged,
    /// The PR should have `labels`, but it was not modified.
    DryRun { labels: Vec<String> },
    /// The labels of the PR were replaced with `labels`.
    Updated { labels: Vec<String> },
}

/// Evaluates the labeling rules of the repository against the PR that triggered `context`, and
/// updates the labels of the PR accordingly.
pub async fn run_labeler<Client: LabelerClient + Sync>(
    client: &Client,
    context: &TriggerContext,
    options: &RunOptions,
) -> Result<RunOutcome, LabelerError> {
    let Some(pr) = context.pr_number else {
        tracing::info!("Event does not belong to a pull request, nothing to do");
        return Ok(RunOutcome::NotApplicable);
    };

    let span = tracing::info_span!("label", repo = %client.repository(), pr = %pr);
    label_pull_request(client, pr, &context.action, options)
        .instrument(span)
        .await
}

async fn label_pull_request<Client: LabelerClient + Sync>(
    client: &Client,
    pr: PullRequestNumber,
    action: &str,
    options: &RunOptions,
) -> Result<RunOutcome, LabelerError> {
    let config = client
        .read_file(&options.config_path, options.config_ref.as_deref())
        .await
        .map_err(LabelerError::provider)?;
    let rules = RuleSet::from_yaml(&config)?;
    tracing::debug!("Loaded {} rule(s) from {}", rules.len(), options.config_path);

    let (changed_files, pull_request) =
        tokio::try_join!(client.list_changed_files(pr), client.get_pull_request(pr))
            .map_err(LabelerError::provider)?;

    let facts = PullRequestFacts {
        changed_files,
        title: pull_request.title,
        mergeable: pull_request.mergeable,
        labels: pull_request.labels,
        action: action.to_string(),
    };
    let decision = evaluate(&rules, &facts);
    tracing::info!(
        "Label decision: add = {:?}, remove = {:?}",
        decision.add,
        decision.remove
    );
    if decision.is_empty() {
        return Ok(RunOutcome::Unchanged);
    }

    let labels = decision.apply(&facts.labels);
    if same_labels(labels.as_slice(), facts.labels.as_slice()) {
        tracing::info!("Labels {:?} are already up to date", facts.labels);
        return Ok(RunOutcome::Unchanged);
    }

    if options.dry_run {
        tracing::info!("Dry run, not replacing labels {:?} with {labels:?}", facts.labels);
        return Ok(RunOutcome::DryRun { labels });
    }

    tracing::info!("Replacing labels {:?} with {labels:?}", facts.labels);
    client
        .replace_labels(pr, &labels)
        .await
        .map_err(LabelerError::provider)?;
    Ok(RunOutcome::Updated { labels })
}

#[cfg(test)]
mod tests {
    use crate::config::ConfigurationError;
    use crate::error::LabelerError;
    use crate::github::{PullRequestNumber, TriggerContext};
    use crate::run::{run_labeler, RunOptions, RunOutcome};
    use crate::tests::client::{default_pr, labels, TestLabelerClientBuilder};
    use crate::tests::io::load_test_file;

    fn context(action: &str) -> TriggerContext {
        TriggerContext {
            repository: None,
            pr_number: Some(default_pr()),
            action: action.to_string(),
        }
    }

    #[tokio::test]
    async fn not_applicable_without_pr() {
        let client = TestLabelerClientBuilder::default().create();
        let context = TriggerContext {
            repository: None,
            pr_number: None,
            action: "created".to_string(),
        };
        let outcome = run_labeler(&client, &context, &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::NotApplicable);
        assert!(client.read_files().is_empty());
        assert!(client.replaced_labels().is_empty());
    }

    #[tokio::test]
    async fn add_label_for_changed_file() {
        let client = TestLabelerClientBuilder::default()
            .config(r#"bug: { patterns: "*.md" }"#)
            .files(&["README.md"])
            .create();
        let outcome = run_labeler(&client, &context("synchronize"), &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Updated {
                labels: labels(&["bug"])
            }
        );
        assert_eq!(
            client.replaced_labels(),
            vec![(default_pr(), labels(&["bug"]))]
        );
    }

    #[tokio::test]
    async fn remove_removable_label() {
        let client = TestLabelerClientBuilder::default()
            .config(r#"bug: { patterns: "*.md", removable: true }"#)
            .files(&["main.go"])
            .pr_labels(&["bug", "ci"])
            .create();
        run_labeler(&client, &context("synchronize"), &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(client.replaced_labels(), vec![(default_pr(), labels(&["ci"]))]);
    }

    #[tokio::test]
    async fn always_remove_keeps_other_labels() {
        let client = TestLabelerClientBuilder::default()
            .config("stale: { type: alwaysRemove }")
            .pr_labels(&["stale", "bug"])
            .create();
        run_labeler(&client, &context("edited"), &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(
            client.replaced_labels(),
            vec![(default_pr(), labels(&["bug"]))]
        );
    }

    #[tokio::test]
    async fn conflict_label_for_unmergeable_pr() {
        let client = TestLabelerClientBuilder::default()
            .config("conflict: { type: mergeState }")
            .mergeable(Some(false))
            .create();
        let outcome = run_labeler(&client, &context("synchronize"), &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Updated {
                labels: labels(&["conflict"])
            }
        );
    }

    #[tokio::test]
    async fn opened_only_rule_skipped_on_synchronize() {
        let client = TestLabelerClientBuilder::default()
            .config(r#"triage: { patterns: "*", opened_only: true }"#)
            .files(&["README.md"])
            .create();
        let outcome = run_labeler(&client, &context("synchronize"), &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::Unchanged);
        assert!(client.replaced_labels().is_empty());
    }

    #[tokio::test]
    async fn no_update_when_labels_already_present() {
        let client = TestLabelerClientBuilder::default()
            .config(r#"bug: { patterns: "*.md" }"#)
            .files(&["README.md"])
            .pr_labels(&["bug"])
            .create();
        let outcome = run_labeler(&client, &context("synchronize"), &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::Unchanged);
        assert!(client.replaced_labels().is_empty());
    }

    #[tokio::test]
    async fn invalid_config_applies_no_labels() {
        let client = TestLabelerClientBuilder::default()
            .config(
                r#"
docs: { patterns: "*.md" }
bug: { patterns: 5 }
"#,
            )
            .files(&["README.md"])
            .create();
        let error = run_labeler(&client, &context("opened"), &RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            LabelerError::Configuration(ConfigurationError::InvalidRules(_))
        ));
        assert!(error.to_string().contains("label `bug`"));
        assert!(client.replaced_labels().is_empty());
    }

    #[tokio::test]
    async fn missing_config_is_provider_error() {
        let client = TestLabelerClientBuilder::default().create();
        let error = run_labeler(&client, &context("opened"), &RunOptions::default())
            .await
            .unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"File .github/pr-labeler.yml not found in owner/name");
    }

    #[tokio::test]
    async fn changed_files_failure_applies_no_labels() {
        let client = TestLabelerClientBuilder::default()
            .config(r#"bug: { patterns: "*.md" }"#)
            .fail_changed_files(true)
            .create();
        let error = run_labeler(&client, &context("opened"), &RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(error, LabelerError::Provider(_)));
        assert!(client.replaced_labels().is_empty());
    }

    #[tokio::test]
    async fn dry_run_does_not_modify_pr() {
        let client = TestLabelerClientBuilder::default()
            .config(r#"bug: { patterns: "*.md" }"#)
            .files(&["README.md"])
            .pr_labels(&["ci"])
            .create();
        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };
        let outcome = run_labeler(&client, &context("opened"), &options)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RunOutcome::DryRun {
                labels: labels(&["ci", "bug"])
            }
        );
        assert!(client.replaced_labels().is_empty());
    }

    #[tokio::test]
    async fn config_read_from_custom_path_and_ref() {
        let client = TestLabelerClientBuilder::default()
            .config(r#"bug: { patterns: "*.md" }"#)
            .create();
        let options = RunOptions {
            config_path: "ci/labels.yml".to_string(),
            config_ref: Some("main".to_string()),
            dry_run: false,
        };
        run_labeler(&client, &context("opened"), &options)
            .await
            .unwrap();
        assert_eq!(
            client.read_files(),
            vec![("ci/labels.yml".to_string(), Some("main".to_string()))]
        );
    }

    #[tokio::test]
    async fn full_config_on_opened_pr() {
        let client = TestLabelerClientBuilder::default()
            .config(&load_test_file("config/labeler.yml"))
            .files(&["src/lib.rs", "docs/guide/intro.md", "Cargo.lock"])
            .title("Fix label removal")
            .pr_labels(&["waiting-on-author", "has-conflicts", "github-actions"])
            .create();
        let outcome = run_labeler(&client, &context("opened"), &RunOptions::default())
            .await
            .unwrap();
        insta::assert_debug_snapshot!(outcome, @r###"
        Updated {
            labels: [
                "github-actions",
                "documentation",
                "rust",
                "fix",
                "needs-triage",
            ],
        }
        "###);
    }

    #[tokio::test]
    async fn full_config_on_synchronized_pr() {
        let client = TestLabelerClientBuilder::default()
            .config(&load_test_file("config/labeler.yml"))
            .files(&[".github/workflows/ci.yml"])
            .title("Add CI")
            .mergeable(None)
            .pr_labels(&["rust", "documentation", "needs-triage"])
            .create();
        let outcome = run_labeler(&client, &context("synchronize"), &RunOptions::default())
            .await
            .unwrap();
        insta::assert_debug_snapshot!(outcome, @r###"
        Updated {
            labels: [
                "needs-triage",
                "github-actions",
                "has-conflicts",
            ],
        }
        "###);
    }

    #[tokio::test]
    async fn uses_pr_from_context() {
        let client = TestLabelerClientBuilder::default()
            .config(r#"bug: { patterns: "*.md" }"#)
            .files(&["README.md"])
            .create();
        let context = TriggerContext {
            repository: None,
            pr_number: Some(PullRequestNumber(42)),
            action: "opened".to_string(),
        };
        run_labeler(&client, &context, &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(
            client.replaced_labels(),
            vec![(PullRequestNumber(42), labels(&["bug"]))]
        );
    }
}
