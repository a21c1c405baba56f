use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShaderError {
    // Grammar authoring bug. Raised when compiling the grammar, never per document.
    #[error("Grammar error: {0}")]
    GrammarError(String),
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
    #[error("Failed to parse: {0}")]
    ParseError(String),
    #[error("Internal error: {0}")]
    InternalErr(String),
}

impl From<regex::Error> for ShaderError {
    fn from(error: regex::Error) -> Self {
        ShaderError::GrammarError(format!("Invalid regex: {}", error))
    }
}

impl From<serde_json::Error> for ShaderError {
    fn from(error: serde_json::Error) -> Self {
        ShaderError::ParseError(error.to_string())
    }
}
