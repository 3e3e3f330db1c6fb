use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Validation failed for customer {customer_id}: {details}")]
    ValidationError {
        customer_id: String,
        details: String,
    },

    #[error("Invalid tier schedule: {0}")]
    InvalidTierSchedule(String),

    #[error("Invalid rate table: {0}")]
    InvalidRateTable(String),

    #[error("Report for customer {customer_id} is inconsistent: {details}")]
    InconsistentReport {
        customer_id: String,
        details: String,
    },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[cfg(feature = "ollama")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl AdvisorError {
    pub fn validation(customer_id: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ValidationError {
            customer_id: customer_id.into(),
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
