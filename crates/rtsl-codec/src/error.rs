use rtsl_registry::RegistryError;
use rtsl_scene::InstanceId;
use rtsl_types::{Identity, SurrogateType};

/// Errors from surrogate extraction, application and identity bookkeeping.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    /// A runtime type or surrogate tag has no registration.
    #[error("unregistered type: {0}")]
    UnregisteredType(String),

    /// A field's value does not match its declared shape.
    #[error("unsupported field {surrogate}.{field}: {reason}")]
    UnsupportedField {
        surrogate: SurrogateType,
        field: String,
        reason: String,
    },

    /// An identity could not be resolved to an instance or a record.
    #[error("dangling reference to {identity}{}", referrer.as_ref().map(|r| format!(" from {r}")).unwrap_or_default())]
    DanglingReference {
        identity: Identity,
        referrer: Option<Identity>,
    },

    /// A handle does not name a live object.
    #[error("instance {0} is not in the world")]
    MissingInstance(InstanceId),

    /// An existing instance is not of the type the record describes.
    #[error("instance {instance} is a {actual}, record expects {expected}")]
    TypeMismatch {
        instance: InstanceId,
        expected: &'static str,
        actual: &'static str,
    },

    /// An identity or instance is already bound to a different partner.
    #[error("identity {identity} conflicts with existing binding for {instance}")]
    IdentityConflict {
        identity: Identity,
        instance: InstanceId,
    },

    /// The null identity cannot be bound to an instance.
    #[error("cannot bind the null identity")]
    NullIdentity,

    /// The shard-local counter ran out.
    #[error("identity space of shard {ordinal} exhausted")]
    IdentityExhausted { ordinal: u32 },

    /// Two schemas claim the same surrogate tag.
    #[error("duplicate schema for {0}")]
    DuplicateSchema(SurrogateType),

    /// A schema chain declares a field name twice.
    #[error("duplicate field {field} in {surrogate}")]
    DuplicateField {
        surrogate: SurrogateType,
        field: String,
    },

    /// Any other registry failure.
    #[error("registry error: {0}")]
    Registry(RegistryError),
}

impl From<RegistryError> for CodecError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnregisteredType(name) => Self::UnregisteredType(name),
            other => Self::Registry(other),
        }
    }
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
