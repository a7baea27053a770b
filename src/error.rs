use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("unparseable clock value: {raw:?}")]
    ClockParse { raw: String },

    #[error("invalid configuration for `{field}`: {message}")]
    InvalidConfig {
        field: &'static str,
        message: String,
    },

    #[error("unknown stat category: {0:?}")]
    UnknownStatCategory(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl AnalyticsError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        AnalyticsError::InvalidConfig {
            field,
            message: message.into(),
        }
    }

    /// Configuration problems are user input errors; everything else is not.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AnalyticsError::InvalidConfig { .. } | AnalyticsError::UnknownStatCategory(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
