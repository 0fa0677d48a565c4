use thiserror::Error;

/// Errors raised by the search service transport.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The requested document or index does not exist (HTTP 404)
    #[error("not found: {0}")]
    NotFound(String),

    /// The search service answered with a non-success status
    #[error("search service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) if status.as_u16() == 404 => ClientError::NotFound(error.to_string()),
            Some(status) => ClientError::Status {
                status: status.as_u16(),
                body: error.to_string(),
            },
            None => ClientError::Transport(error.to_string()),
        }
    }
}

/// Custom error type for query construction, execution and index synchronization
#[derive(Debug, Error)]
pub enum QuarryError {
    /// Unrecognized bucket, type name or multi-match type
    #[error("unsupported type <{0}>")]
    UnsupportedType(String),

    /// Value of incompatible shape handed to a query setter
    #[error("unknown argument type: {0}")]
    UnknownArgumentType(String),

    /// Invalid match-query operator
    #[error("operator <{0}> is not supported")]
    UnsupportedOperator(String),

    /// Index resolution failed and no default index is configured
    #[error("failed to resolve index name for <{0}>")]
    NoIndexForType(String),

    /// Single-document fetch hit a missing document
    #[error("document <{0}> not found")]
    DocumentNotFound(String),

    /// Query factory asked for a helper it does not know
    #[error("query <{0}> is not supported")]
    UnsupportedQuery(String),

    /// `end()` called on the root of a clause tree
    #[error("no upper level found, end() called at the root clause")]
    NoParent,

    /// Getter used on a clause field that was never set
    #[error("trying to get value of unexisting clause field '{0}'")]
    UnknownField(String),

    /// Descending into a clause field that holds a plain value
    #[error("clause field '{0}' holds a value, not a nested clause")]
    NotAClause(String),

    /// Searchable type is not registered with the facade
    #[error("searchable type <{0}> is not registered")]
    UnknownSearchableType(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Search service errors
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse errors
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl QuarryError {
    /// True when the underlying search service reported a missing document.
    pub fn is_not_found(&self) -> bool {
        match self {
            QuarryError::DocumentNotFound(_) => true,
            QuarryError::Client(e) => e.is_not_found(),
            _ => false,
        }
    }

    pub fn unsupported_type(name: impl Into<String>) -> Self {
        QuarryError::UnsupportedType(name.into())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, QuarryError>;
