use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathkeeperError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Invalid construction input: {0}")]
    InvalidConstructionInput(String),
    #[error("Malformed pattern '{pattern}': {message}")]
    MalformedPattern { pattern: String, message: String },
    #[error("Resource exhausted: memory usage {usage} exceeds limit {limit}")]
    ResourceExhausted { usage: String, limit: String },
}

pub type Result<T> = std::result::Result<T, PathkeeperError>;

// Helper conversions
impl From<serde_json::Error> for PathkeeperError {
    fn from(e: serde_json::Error) -> Self { Self::Decode(e.to_string()) }
}
impl From<::config::ConfigError> for PathkeeperError {
    fn from(e: ::config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<std::io::Error> for PathkeeperError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
