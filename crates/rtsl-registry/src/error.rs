use rtsl_types::{RuntimeType, SurrogateType};

/// Errors from registry construction and lookup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No mapping exists for the given runtime type or surrogate tag.
    #[error("unregistered type: {0}")]
    UnregisteredType(String),

    /// The runtime type was already mapped to another surrogate.
    #[error("runtime type {runtime} already registered as {existing}")]
    DuplicateRuntime {
        runtime: RuntimeType,
        existing: SurrogateType,
    },

    /// The surrogate tag was already claimed by another runtime type.
    #[error("surrogate type {surrogate} already registered for {existing}")]
    DuplicateSurrogate {
        surrogate: SurrogateType,
        existing: RuntimeType,
    },
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
