use thiserror::Error;

/// Main error type for graphseed
#[derive(Error, Debug)]
pub enum GraphseedError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP failures
    #[error("HTTP error: {0}")]
    Http(String),

    /// Generative text service errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge-base lookup errors
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for GraphseedError {
    fn from(err: reqwest::Error) -> Self {
        GraphseedError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for GraphseedError {
    fn from(err: serde_json::Error) -> Self {
        GraphseedError::Parse(err.to_string())
    }
}

/// Convenient Result type using GraphseedError
pub type Result<T> = std::result::Result<T, GraphseedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphseedError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GraphseedError = io_err.into();
        assert!(matches!(err, GraphseedError::Io(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: GraphseedError = json_err.into();
        assert!(matches!(err, GraphseedError::Parse(_)));
    }
}
