//! Search error taxonomy

use std::path::PathBuf;

use sm_cad::CadError;

/// Errors raised while searching for matching parts
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Failed to load {}: {source}", path.display())]
    Load { path: PathBuf, source: CadError },

    #[error("Geometry error in {}: {source}", path.display())]
    Geometry { path: PathBuf, source: CadError },

    #[error("Degenerate reference {}: {reason}", path.display())]
    DegenerateReference { path: PathBuf, reason: String },

    #[error("Cannot list directory {}: {reason}", path.display())]
    DirectoryAccess { path: PathBuf, reason: String },
}

impl SearchError {
    /// Whether a candidate-level occurrence of this error lets the search go on
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SearchError::Load { .. }
                | SearchError::Geometry { .. }
                | SearchError::DirectoryAccess { .. }
        )
    }
}
