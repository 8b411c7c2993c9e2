use std::fmt::{Display, Formatter};

use itertools::Itertools;
use serde_yaml::{Mapping, Value};

use crate::labeler::Pattern;

pub const DEFAULT_CONFIG_PATH: &str = ".github/pr-labeler.yml";

/// What has to happen on a pull request for a rule to apply its label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerKind {
    /// At least one changed file matches one of the patterns.
    #[default]
    FilesChanged,
    /// The title of the PR matches one of the patterns.
    Title,
    /// The PR cannot be merged (merge conflict or unknown mergeability).
    MergeState,
    /// The label is always removed from the PR.
    AlwaysRemove,
}

impl TriggerKind {
    fn from_config_name(name: &str) -> Option<Self> {
        match name {
            "filesChanged" => Some(Self::FilesChanged),
            "title" => Some(Self::Title),
            "mergeState" => Some(Self::MergeState),
            "alwaysRemove" => Some(Self::AlwaysRemove),
            _ => None,
        }
    }

    pub fn config_name(&self) -> &'static str {
        match self {
            Self::FilesChanged => "filesChanged",
            Self::Title => "title",
            Self::MergeState => "mergeState",
            Self::AlwaysRemove => "alwaysRemove",
        }
    }

    /// Does this trigger evaluate glob patterns?
    pub fn requires_patterns(&self) -> bool {
        matches!(self, Self::FilesChanged | Self::Title)
    }
}

impl Display for TriggerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.config_name())
    }
}

/// A single labeling rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub label: String,
    pub trigger: TriggerKind,
    /// Empty for triggers that do not evaluate patterns, unless the configuration provided some.
    pub patterns: Vec<Pattern>,
    /// Remove the label when the condition of the rule does not hold.
    pub removable: bool,
    /// Only evaluate the rule when the PR has just been opened.
    pub opened_only: bool,
}

/// Labeling rules of a repository, loaded from a YAML file (by default
/// [`DEFAULT_CONFIG_PATH`]) in the repository.
///
/// Rules are kept in the order in which they were declared, which is also the order in which
/// they are evaluated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigurationError> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::parse(&value)
    }

    /// Parses rules from a YAML document. Either every entry is valid, or an error listing all
    /// invalid entries is returned.
    pub fn parse(raw: &Value) -> Result<Self, ConfigurationError> {
        let Value::Mapping(entries) = raw else {
            return Err(ConfigurationError::NotAMapping {
                found: value_kind(raw),
            });
        };

        let (rules, errors): (Vec<Rule>, Vec<RuleError>) = entries
            .iter()
            .map(|(key, body)| parse_rule(key, body))
            .partition_result();
        if !errors.is_empty() {
            return Err(ConfigurationError::InvalidRules(errors));
        }
        Ok(Self { rules })
    }

    /// Serializes the rules back into the configuration file format, with every field spelled
    /// out explicitly.
    pub fn to_yaml(&self) -> Result<String, ConfigurationError> {
        let mut entries = Mapping::new();
        for rule in &self.rules {
            let mut body = Mapping::new();
            body.insert("type".into(), rule.trigger.config_name().into());
            if !rule.patterns.is_empty() {
                body.insert(
                    "patterns".into(),
                    Value::Sequence(
                        rule.patterns
                            .iter()
                            .map(|pattern| Value::from(pattern.as_str()))
                            .collect(),
                    ),
                );
            }
            body.insert("removable".into(), rule.removable.into());
            body.insert("opened_only".into(), rule.opened_only.into());
            entries.insert(rule.label.as_str().into(), Value::Mapping(body));
        }
        Ok(serde_yaml::to_string(&Value::Mapping(entries))?)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn parse_rule(key: &Value, body: &Value) -> Result<Rule, RuleError> {
    let Some(label) = parse_label(key) else {
        return Err(RuleError {
            label: format!("{key:?}"),
            kind: RuleErrorKind::InvalidLabel,
        });
    };
    let error = |kind| RuleError {
        label: label.clone(),
        kind,
    };

    let trigger = match body.get("type") {
        None => TriggerKind::default(),
        Some(value) => match value.as_str().and_then(TriggerKind::from_config_name) {
            Some(trigger) => trigger,
            None => {
                tracing::warn!(
                    "Unknown rule type {value:?} for label `{label}`, using `{}`",
                    TriggerKind::default()
                );
                TriggerKind::default()
            }
        },
    };
    let removable = parse_flag(&label, body, "removable");
    let opened_only = parse_flag(&label, body, "opened_only");

    let patterns = match parse_patterns(body.get("patterns")) {
        Some(patterns) if patterns.is_empty() && trigger.requires_patterns() => {
            return Err(error(RuleErrorKind::EmptyPatterns { trigger }));
        }
        Some(patterns) => patterns,
        None if trigger.requires_patterns() => {
            return Err(error(RuleErrorKind::MissingPatterns { trigger }));
        }
        None => vec![],
    };
    // Patterns of other triggers are never evaluated, so they are only kept for serialization.
    let patterns = if trigger.requires_patterns() {
        patterns
            .into_iter()
            .map(|pattern| {
                Pattern::new(&pattern).map_err(|source| {
                    error(RuleErrorKind::InvalidPattern {
                        pattern,
                        error: source,
                    })
                })
            })
            .collect::<Result<Vec<_>, _>>()?
    } else {
        patterns.iter().map(|pattern| Pattern::inert(pattern)).collect()
    };

    Ok(Rule {
        label,
        trigger,
        patterns,
        removable,
        opened_only,
    })
}

/// Labels are usually strings, but YAML happily parses keys like `1.0` or `true` as other
/// scalars. These are turned back into text.
fn parse_label(key: &Value) -> Option<String> {
    let label = match key {
        Value::String(label) => label.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(value) => value.to_string(),
        _ => return None,
    };
    (!label.trim().is_empty()).then_some(label)
}

fn parse_flag(label: &str, body: &Value, name: &str) -> bool {
    match body.get(name) {
        None => false,
        Some(Value::Bool(value)) => *value,
        Some(value) => {
            tracing::warn!("Ignoring non-boolean `{name}` value {value:?} for label `{label}`");
            false
        }
    }
}

/// Returns `None` if the patterns are missing or are not a string/list of strings.
fn parse_patterns(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::String(pattern) => Some(vec![pattern.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| item.as_str().map(|s| s.to_string()))
            .collect(),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "an empty document",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Cannot parse labeler configuration: {0}")]
    Syntax(#[from] serde_yaml::Error),
    #[error("Labeler configuration must be a mapping of labels to rules, found {found}")]
    NotAMapping { found: &'static str },
    #[error("Invalid labeler configuration:\n{}", format_rule_errors(.0))]
    InvalidRules(Vec<RuleError>),
}

fn format_rule_errors(errors: &[RuleError]) -> String {
    errors.iter().map(|error| format!("- {error}")).join("\n")
}

/// A configuration entry that could not be turned into a [`Rule`].
#[derive(Debug, thiserror::Error)]
#[error("label `{label}`: {kind}")]
pub struct RuleError {
    pub label: String,
    pub kind: RuleErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleErrorKind {
    #[error("label names must be non-empty strings")]
    InvalidLabel,
    #[error("`patterns` must be a string or a list of strings for a `{trigger}` rule")]
    MissingPatterns { trigger: TriggerKind },
    #[error("`patterns` must not be empty for a `{trigger}` rule")]
    EmptyPatterns { trigger: TriggerKind },
    #[error("invalid glob pattern `{pattern}`: {error}")]
    InvalidPattern {
        pattern: String,
        error: globset::Error,
    },
}
