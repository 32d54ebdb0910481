use std::fmt::Display;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage level errors.
///
/// Every error is reported by the operation that detected it, storages
/// never retry or recover on their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Index outside of valid range for the operation.
    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: u64, len: u64 },
    /// Index or count exceeds what the backing storage can address.
    #[error("value {value} exceeds storage limit {limit}")]
    Overflow { value: u64, limit: u64 },
    /// Operation invoked before required setup or on a storage whose
    /// invariants forbid it right now.
    #[error("illegal state: {0}")]
    IllegalState(String),
    /// Arguments are well formed but semantically wrong.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Storage doesn't support operation at all.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    IndexOutOfBounds,
    Overflow,
    IllegalState,
    InvalidInput,
    Unsupported,
}

impl StorageError {
    pub fn out_of_bounds(index: u64, len: u64) -> Self {
        Self::IndexOutOfBounds { index, len }
    }

    pub fn overflow(value: u64, limit: u64) -> Self {
        Self::Overflow { value, limit }
    }

    pub fn illegal_state(msg: impl Display) -> Self {
        Self::IllegalState(msg.to_string())
    }

    pub fn invalid_input(msg: impl Display) -> Self {
        Self::InvalidInput(msg.to_string())
    }

    pub fn unsupported(op: &'static str) -> Self {
        Self::Unsupported(op)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IndexOutOfBounds { .. } => ErrorKind::IndexOutOfBounds,
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::IllegalState(_) => ErrorKind::IllegalState,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// True if the same call could succeed once the storage is in a different state.
    pub fn recoverable(&self) -> bool {
        match self.kind() {
            ErrorKind::IllegalState => true,
            ErrorKind::IndexOutOfBounds
            | ErrorKind::Overflow
            | ErrorKind::InvalidInput
            | ErrorKind::Unsupported => false,
        }
    }

    pub fn unrecoverable(&self) -> bool {
        !self.recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            StorageError::out_of_bounds(3, 2).kind(),
            ErrorKind::IndexOutOfBounds
        );
        assert_eq!(StorageError::overflow(3, 2).kind(), ErrorKind::Overflow);
        assert_eq!(
            StorageError::unsupported("swap").kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn recoverable() {
        assert!(StorageError::illegal_state("occupied").recoverable());
        assert!(StorageError::invalid_input("gap").unrecoverable());
    }

    #[test]
    fn display() {
        assert_eq!(
            StorageError::out_of_bounds(7, 5).to_string(),
            "index 7 is out of bounds for length 5"
        );
    }
}
