use itertools::{Either, Itertools};

use crate::config::{Rule, RuleSet, TriggerKind};
use crate::labeler::matcher::any_match;
use crate::labeler::{LabelDecision, LabelModification, PullRequestFacts};

/// The action of a `pull_request` event that is sent when a PR is created.
pub const OPENED_ACTION: &str = "opened";

/// Evaluates all rules against the given PR, in declaration order.
pub fn evaluate(rules: &RuleSet, facts: &PullRequestFacts) -> LabelDecision {
    let (add, remove): (Vec<String>, Vec<String>) = rules
        .rules()
        .iter()
        .filter_map(|rule| evaluate_rule(rule, facts))
        .partition_map(|modification| match modification {
            LabelModification::Add(label) => Either::Left(label),
            LabelModification::Remove(label) => Either::Right(label),
        });

    LabelDecision {
        add: add.into_iter().unique().collect(),
        remove: remove.into_iter().unique().collect(),
    }
}

/// Decides what a single rule does with its label. `None` means that the label is left alone.
pub fn evaluate_rule(rule: &Rule, facts: &PullRequestFacts) -> Option<LabelModification> {
    if rule.opened_only && facts.action != OPENED_ACTION {
        tracing::debug!(
            "Skipping rule for `{}`, it only applies to opened PRs (action={})",
            rule.label,
            facts.action
        );
        return None;
    }

    let condition = match rule.trigger {
        TriggerKind::FilesChanged => any_match(facts.changed_files.as_slice(), &rule.patterns),
        TriggerKind::Title => any_match(&[facts.title.as_str()], &rule.patterns),
        TriggerKind::MergeState => !facts.mergeable.is_mergeable(),
        TriggerKind::AlwaysRemove => {
            tracing::debug!("Rule for `{}` always removes its label", rule.label);
            return Some(LabelModification::Remove(rule.label.clone()));
        }
    };

    let modification = if condition {
        Some(LabelModification::Add(rule.label.clone()))
    } else if rule.removable {
        Some(LabelModification::Remove(rule.label.clone()))
    } else {
        None
    };
    tracing::debug!(
        "Rule `{}` ({}) condition={condition} -> {modification:?}",
        rule.label,
        rule.trigger
    );
    modification
}
