use crate::config::ConfigurationError;

/// Reasons why a labeler run has failed. No labels are modified when a run fails.
#[derive(Debug, thiserror::Error)]
pub enum LabelerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A request to GitHub has failed.
    #[error("{0:#}")]
    Provider(anyhow::Error),
}

impl LabelerError {
    pub fn provider(error: anyhow::Error) -> Self {
        Self::Provider(error)
    }
}
