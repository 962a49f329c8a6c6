/// Errors surfaced by the reconciliation workflows and their collaborators.
///
/// Setup problems (configuration, auth, missing ledger, transport) stop the
/// process. Schema and filesystem problems only abort the operation that hit
/// them. Commit failures are per-record and are absorbed by the commit loop.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReconcileError {
    #[error("Configuration error: {message}. Set it in the config file or the matching environment variable")]
    Configuration { message: String },

    #[error(
        "{service} rejected our credentials ({reason}). The token is likely expired or revoked; re-authenticate and run again"
    )]
    RemoteAuth { service: String, reason: String },

    #[error(
        "Ledger '{name}' not found or access denied.\n- Make sure the spreadsheet exists.\n- Make sure it is shared with the account behind your access token.\n- Or change `google.spreadsheet` in the config file"
    )]
    RemoteNotFound { name: String },

    #[error("Ledger schema error: {message}")]
    Schema { message: String },

    #[error("File system error during {operation} on {path}: {error_message}")]
    Filesystem {
        operation: String,
        path: String,
        error_message: String,
    },

    #[error("Failed to update '{title}': {reason}")]
    Commit { title: String, reason: String },

    #[error("{service} request failed during {operation}: {error_message}")]
    Remote {
        service: String,
        operation: String,
        error_message: String,
    },
}

impl ReconcileError {
    /// Whether the error should terminate the whole process rather than a single operation.
    pub fn is_fatal(&self) -> bool {
        match self {
            ReconcileError::Configuration { .. }
            | ReconcileError::RemoteAuth { .. }
            | ReconcileError::RemoteNotFound { .. }
            | ReconcileError::Remote { .. } => true,
            ReconcileError::Schema { .. }
            | ReconcileError::Filesystem { .. }
            | ReconcileError::Commit { .. } => false,
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        ReconcileError::Schema {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        ReconcileError::Configuration {
            message: message.into(),
        }
    }
}
