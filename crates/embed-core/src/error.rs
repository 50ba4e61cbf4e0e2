//! Error Types

use thiserror::Error;

/// Result type alias for embed operations
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Configuration errors, fatal to a single widget build
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required marker attribute is absent or empty
    #[error("Missing required attribute: data-{0}")]
    MissingRequiredAttribute(String),

    /// No usable payment option (or a required checkout option) was configured
    #[error("Missing option: {0}")]
    MissingOption(String),

    /// An amount does not look like a decimal number
    #[error("Invalid amount for option: {option}")]
    InvalidAmount { option: String },
}

/// Embed error types
#[derive(Error, Debug)]
pub enum EmbedError {
    /// Widget configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport failure talking to the status endpoint
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Status endpoint answered with a non-success status
    #[error("Status endpoint returned HTTP {0}")]
    Status(u16),

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The host environment (DOM, cookie jar, window) refused an operation
    #[error("Host error: {0}")]
    Host(String),
}

impl EmbedError {
    /// Poll failures of this kind are retried on the next tick
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Status(_) | Self::Parse(_) | Self::Json(_)
        )
    }

    /// Short diagnostic suitable for the browser console
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(ConfigError::MissingRequiredAttribute(name)) => {
                format!("The payment widget is missing its data-{name} attribute.")
            }
            Self::Config(ConfigError::MissingOption(name)) => {
                format!("The payment widget needs a value for '{name}'.")
            }
            Self::Config(ConfigError::InvalidAmount { option }) => {
                format!("The amount for '{option}' is not a valid number.")
            }
            Self::Host(_) => "The page did not allow the payment widget to load.".into(),
            _ => "The payment status could not be checked.".into(),
        }
    }
}
