//! Error types for cluman

use thiserror::Error;

/// Result type for cluman operations
pub type Result<T> = std::result::Result<T, ClumanError>;

/// cluman error types
#[derive(Error, Debug)]
pub enum ClumanError {
    #[error("Cluster {cluster} declares unknown backend kind '{kind}'")]
    UnknownBackendKind { cluster: String, kind: String },

    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config file parse error: {0}")]
    ConfigParse(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClumanError {
    /// True for errors a backend call may recover from on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClumanError::BackendUnavailable(_) | ClumanError::Transport(_) | ClumanError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ClumanError::Transport("reset".to_string()).is_transient());
        assert!(ClumanError::Timeout("5s".to_string()).is_transient());
        assert!(!ClumanError::UnknownBackendKind {
            cluster: "c1".to_string(),
            kind: "nonexistent".to_string(),
        }
        .is_transient());
    }

    #[test]
    fn test_unknown_kind_message() {
        let err = ClumanError::UnknownBackendKind {
            cluster: "east".to_string(),
            kind: "nonexistent".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cluster east declares unknown backend kind 'nonexistent'"
        );
    }
}
