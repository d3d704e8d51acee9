//! Tracer Error Hierarchy
//!
//! Errors are split by the layer that raises them:
//! - [`TracerError`]: the mutation path and the session lifecycle
//! - [`RegistryError`]: field table construction
//! - configuration loading and validation
//!
//! A CAS conflict is deliberately absent: a stale expected value is a normal
//! outcome of a lost race and is reported as `Ok(false)`.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Mutation path and lifecycle failures
    #[error(transparent)]
    Tracer(#[from] TracerError),

    /// Field table construction failures
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration semantic validation failures
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Event record encoding failures
    #[error(transparent)]
    Codec(#[from] bincode::Error),

    /// Metrics endpoint could not be started
    #[error("Metrics server failed: {0}")]
    Metrics(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TracerError {
    /// Field index outside `[0, field_count)`; a caller-programming error
    #[error("Invalid field index {index} (registry has {field_count} fields)")]
    InvalidField { index: u32, field_count: u32 },

    /// Entry point invoked before `initialize()`
    #[error("Tracer is not initialized")]
    NotInitialized,

    /// `initialize()` invoked on a tracer that already left `Uninitialized`
    #[error("Tracer is already initialized")]
    AlreadyInitialized,

    /// Tracer reached its terminal state
    #[error("Tracer has been shut down")]
    ShutDown,

    /// Event stream already handed out to a consumer
    #[error("Event stream already has a consumer")]
    StreamTaken,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Field registry must contain at least one field")]
    Empty,

    #[error("Field registry exceeds {max} entries")]
    TooManyFields { max: u64 },

    #[error("Field {index} has an empty name")]
    EmptyName { index: u32 },

    #[error("Field name {name:?} at index {index} contains a NUL byte")]
    NulInName { name: String, index: u32 },

    #[error("Field name '{name}' is {len} bytes, limit is {max}")]
    NameTooLong { name: String, len: usize, max: usize },

    #[error("Duplicate field name '{name}' at indices {first} and {second}")]
    DuplicateName { name: String, first: u32, second: u32 },
}

impl Error {
    /// Returns the tracer error if this is one, for call sites that match on
    /// mutation-path outcomes.
    pub fn as_tracer(&self) -> Option<&TracerError> {
        match self {
            Error::Tracer(e) => Some(e),
            _ => None,
        }
    }
}
