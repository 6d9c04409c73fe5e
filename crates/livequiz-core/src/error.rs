//! Error types for page specs, storage capabilities and services.

/// Malformed input rejected synchronously, before any storage call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Page size below 1.
    #[error("page size must be at least 1 (given: {size})")]
    PageSize { size: i64 },

    /// Negative page index.
    #[error("page index must not be negative (given: {index})")]
    PageIndex { index: i64 },

    /// `size * index` does not fit a row offset.
    #[error("page {index} of size {size} is out of range")]
    PageOutOfRange { size: u64, index: u64 },

    /// Tried to select a page of the unpaged sentinel.
    #[error("cannot select page {index} of an unpaged spec")]
    Unpaged { index: i64 },

    /// Integer that does not map to a difficulty rating.
    #[error("unknown difficulty rating: {value}")]
    UnknownRating { value: i64 },
}

/// Errors raised by a storage capability.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing engine rejected or failed the operation.
    #[error("storage backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("storage lock poisoned: {0}")]
    Poisoned(String),

    /// A persisted row could not be mapped back into a record.
    #[error("corrupt row in {table}: {message}")]
    Corrupt { table: String, message: String },

    /// The store is temporarily unable to serve requests.
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
}

impl StorageError {
    /// Backend error with only a message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Backend error wrapping the engine's own error.
    pub fn from_source<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether issuing the same service call again may succeed.
    ///
    /// Envelopes never retry on their own; this is a hint for callers.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Result type for storage capabilities.
pub type StorageResult<T> = Result<T, StorageError>;

/// A storage fault captured by an envelope.
///
/// Memoized alongside successful outcomes; every read of a failed envelope
/// sees the same value.
#[derive(Debug, thiserror::Error)]
#[error("persistence failure in {operation}: {cause}")]
pub struct PersistenceFailure {
    operation: &'static str,
    #[source]
    cause: StorageError,
}

impl PersistenceFailure {
    pub fn new(operation: &'static str, cause: StorageError) -> Self {
        Self { operation, cause }
    }

    /// Label of the service operation whose storage call failed.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// The underlying storage error.
    pub fn cause(&self) -> &StorageError {
        &self.cause
    }

    pub fn into_cause(self) -> StorageError {
        self.cause
    }
}

/// Outcome memoized by an envelope.
pub type Outcome<T> = Result<T, PersistenceFailure>;

/// Umbrella error for callers mixing page validation and envelope reads.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceFailure),
}

impl ServiceError {
    /// Whether re-issuing the originating service call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Persistence(failure) => failure.cause().is_transient(),
        }
    }
}

/// Result type for service callers.
pub type ServiceResult<T> = Result<T, ServiceError>;
