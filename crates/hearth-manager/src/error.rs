use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Persistence call failed: {0}")]
    Network(String),

    #[error("Timed out waiting for type `{type_id}` to register")]
    LoadTimeout { type_id: String },

    #[error("Instance already exists: {0}")]
    DuplicateInstance(String),

    #[error("Widget type not available: {0}")]
    UnavailableType(String),

    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Widget type not found: {0}")]
    TypeNotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ManagerError {
    /// True for guard-condition outcomes that are logged as warnings and
    /// short-circuit an operation without counting as real failures.
    pub fn is_guard(&self) -> bool {
        matches!(
            self,
            ManagerError::DuplicateInstance(_) | ManagerError::UnavailableType(_)
        )
    }
}
