//! This is the library of the pull request labeler.
pub mod config;
pub mod error;
pub mod github;
pub mod labeler;
mod run;

pub use config::{ConfigurationError, Rule, RuleSet, TriggerKind};
pub use error::LabelerError;
pub use run::{run_labeler, RunOptions, RunOutcome};
