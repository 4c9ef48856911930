//! Error taxonomy for the generation pipeline (§7).
//!
//! `AppError` is the single sum type stage functions return. The orchestrator decides,
//! per variant, whether to abort the request (fatal) or record a warning and continue.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    ApiKeyInvalid,
    RateLimit,
    Network,
    Timeout,
    Server,
    EmptyData,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("location error: {0}")]
    Location(String),

    #[error("weather API error ({kind:?}): {message}")]
    Api {
        kind: ApiErrorKind,
        message: String,
    },

    #[error("forecast data validation error: {0}")]
    DataValidation(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("corpus error: {0}")]
    Corpus(String),

    #[error("selection error: {0}")]
    Selection(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Whether this error should abort the whole request, per §7's propagation policy.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Location(_)
                | AppError::Corpus(_)
                | AppError::Selection(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_location_errors_are_fatal() {
        assert!(AppError::Config("missing key".into()).is_fatal());
        assert!(AppError::Location("unknown".into()).is_fatal());
    }

    #[test]
    fn cache_and_data_validation_errors_are_not_fatal() {
        assert!(!AppError::Cache("disk full".into()).is_fatal());
        assert!(!AppError::DataValidation("bad temp".into()).is_fatal());
        assert!(!AppError::Api {
            kind: ApiErrorKind::Timeout,
            message: "timed out".into()
        }
        .is_fatal());
    }
}
