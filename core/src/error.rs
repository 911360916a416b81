use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmlError {
    #[error("Invalid input in field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Workflow violation: cannot transition report from {from} to {to}")]
    WorkflowViolation { from: String, to: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AmlError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AmlError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        AmlError::Config {
            reason: reason.into(),
        }
    }
}

pub type AmlResult<T> = Result<T, AmlError>;
