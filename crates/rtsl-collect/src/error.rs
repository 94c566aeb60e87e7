//! Error types for dependency collection.

use rtsl_codec::CodecError;
use rtsl_scene::InstanceId;
use rtsl_types::Identity;

/// Errors that can occur while computing a dependency closure.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CollectError {
    /// A record references an identity absent from the record set.
    #[error("dangling reference to {identity}{}", referrer.as_ref().map(|r| format!(" from {r}")).unwrap_or_default())]
    DanglingReference {
        identity: Identity,
        referrer: Option<Identity>,
    },

    /// A live object references an instance that is no longer in the world.
    #[error("missing instance {instance}{}", referrer.as_ref().map(|r| format!(" referenced by {r}")).unwrap_or_default())]
    MissingInstance {
        instance: InstanceId,
        referrer: Option<InstanceId>,
    },

    /// Schema lookup or field access failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Convenience alias for collection results.
pub type CollectResult<T> = Result<T, CollectError>;
