use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommissionError {
    #[error("Invalid policy: {field} — {reason}")]
    InvalidPolicy { field: String, reason: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CommissionError {
    pub(crate) fn policy(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CommissionError::InvalidPolicy {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CommissionError {
    fn from(e: serde_json::Error) -> Self {
        CommissionError::SerializationError(e.to_string())
    }
}
