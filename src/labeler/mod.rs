//! Decides which labels a pull request should have, based on the labeling rules of its
//! repository.
mod evaluate;
mod matcher;
mod reconcile;

pub use evaluate::{evaluate, evaluate_rule, OPENED_ACTION};
pub use matcher::{any_match, matches, Pattern};
pub use reconcile::{reconcile, same_labels};

/// Whether GitHub thinks that a pull request can be merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeableState {
    Mergeable,
    Conflicting,
    /// GitHub has not finished computing mergeability yet.
    Unknown,
}

impl MergeableState {
    /// `Unknown` is treated as not mergeable.
    pub fn is_mergeable(&self) -> bool {
        matches!(self, Self::Mergeable)
    }
}

impl From<Option<bool>> for MergeableState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Mergeable,
            Some(false) => Self::Conflicting,
            None => Self::Unknown,
        }
    }
}

/// Snapshot of a pull request that the rules are evaluated against.
#[derive(Clone, Debug)]
pub struct PullRequestFacts {
    pub changed_files: Vec<String>,
    pub title: String,
    pub mergeable: MergeableState,
    /// Labels currently attached to the PR.
    pub labels: Vec<String>,
    /// Action of the event that triggered the evaluation (e.g. `opened` or `synchronize`).
    pub action: String,
}

#[derive(Debug, Eq, PartialEq)]
pub enum LabelModification {
    Add(String),
    Remove(String),
}

/// Labels that should be added to and removed from a pull request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelDecision {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl LabelDecision {
    /// If nothing is added or removed, the labels of the PR must not be touched at all.
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Returns the complete set of labels that the PR should have after this decision.
    pub fn apply(&self, current: &[String]) -> Vec<String> {
        reconcile(current, self.add.as_slice(), self.remove.as_slice())
    }
}
