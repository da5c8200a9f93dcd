use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("construction error: {0}")]
    Construction(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("stale reference: {0}")]
    StaleReference(String),
    #[error("index out of range: {0}")]
    IndexOutOfRange(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl GraphError {
    pub fn construction<T: Into<String>>(msg: T) -> Self {
        GraphError::Construction(msg.into())
    }

    pub fn invalid_operation<T: Into<String>>(msg: T) -> Self {
        GraphError::InvalidOperation(msg.into())
    }

    pub fn stale<T: Into<String>>(msg: T) -> Self {
        GraphError::StaleReference(msg.into())
    }

    pub fn out_of_range<T: Into<String>>(msg: T) -> Self {
        GraphError::IndexOutOfRange(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        GraphError::Internal(msg.into())
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, GraphError::StaleReference(_))
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self, GraphError::IndexOutOfRange(_))
    }
}
