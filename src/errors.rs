use thiserror::Error;

#[derive(Debug, Error)]
pub enum DegreesError {
    #[error("connection error: {0}")]
    ConnectionError(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("query error: {0}")]
    QueryError(String),
    #[error("entity not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("corrupt search state: {0}")]
    CorruptState(String),
    #[error("no root person is set; ingest data that contains the root first")]
    RootNotSet,
    #[error("search interrupted")]
    Interrupted,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DegreesError {
    pub fn connection<T: Into<String>>(msg: T) -> Self {
        DegreesError::ConnectionError(msg.into())
    }

    pub fn schema<T: Into<String>>(msg: T) -> Self {
        DegreesError::SchemaError(msg.into())
    }

    pub fn query<T: Into<String>>(msg: T) -> Self {
        DegreesError::QueryError(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        DegreesError::NotFound(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        DegreesError::InvalidInput(msg.into())
    }

    pub fn malformed<T: Into<String>>(msg: T) -> Self {
        DegreesError::MalformedInput(msg.into())
    }

    pub fn corrupt<T: Into<String>>(msg: T) -> Self {
        DegreesError::CorruptState(msg.into())
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, DegreesError::Interrupted)
    }
}
