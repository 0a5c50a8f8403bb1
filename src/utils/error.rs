use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchboxError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration parsing error: {message}")]
    ConfigParseError { message: String },

    #[error("Missing configuration item: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Authentication error: {message}")]
    AuthenticationError { message: String },

    #[error("Export error: {message}")]
    ExportError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Environment,
    Data,
    Configuration,
    Credentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MatchboxError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MatchboxError::HttpError(_) => ErrorCategory::Network,
            MatchboxError::IoError(_) | MatchboxError::ExportError { .. } => {
                ErrorCategory::Environment
            }
            MatchboxError::SerializationError(_) => ErrorCategory::Data,
            MatchboxError::ConfigParseError { .. }
            | MatchboxError::MissingConfigError { .. }
            | MatchboxError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            MatchboxError::AuthenticationError { .. } => ErrorCategory::Credentials,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Credentials | ErrorCategory::Environment => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MatchboxError::HttpError(_) => {
                "Check network connectivity and that the MATCHBox URL is reachable"
            }
            MatchboxError::IoError(_) => "Check that the output directory exists and is writable",
            MatchboxError::SerializationError(_) => {
                "The source returned data that is not valid JSON; inspect the raw response"
            }
            MatchboxError::ConfigParseError { .. } => {
                "Make sure the config file is valid JSON or TOML"
            }
            MatchboxError::MissingConfigError { .. } => {
                "Add the missing item to the config file for the chosen method"
            }
            MatchboxError::InvalidConfigValueError { .. } => {
                "Fix the reported value in the config file or command line"
            }
            MatchboxError::AuthenticationError { .. } => {
                "Verify the username, password, client_id and client_name"
            }
            MatchboxError::ExportError { .. } => {
                "Make sure mongoexport is installed and on PATH"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MatchboxError::MissingConfigError { field } => {
                format!("The config file has no '{}' entry", field)
            }
            MatchboxError::HttpError(e) if e.is_connect() => {
                "Could not connect to MATCHBox".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MatchboxError>;
