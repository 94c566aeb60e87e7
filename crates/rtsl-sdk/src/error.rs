use std::fmt;

use serde::Serialize;
use thiserror::Error;

use rtsl_codec::CodecError;
use rtsl_collect::CollectError;
use rtsl_library::LibraryError;
use rtsl_store::StoreError;

/// Caller-facing classification of a failed save or load pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A live type or stored tag has no registration.
    UnregisteredType,
    /// A surrogate declares a field the codec cannot handle.
    UnsupportedField,
    /// A referenced identity is not in the supplied shard set.
    DanglingReference,
    /// A unit of objects cannot fit a fresh shard.
    CapacityExceeded,
    /// The store failed or a shard is missing.
    Storage,
    /// A shard failed to decode or verify.
    Corrupt,
    /// Invalid configuration.
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnregisteredType => "unregistered_type",
            Self::UnsupportedField => "unsupported_field",
            Self::DanglingReference => "dangling_reference",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::Storage => "storage",
            Self::Corrupt => "corrupt",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SdkError {
    /// The failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Codec(err) => codec_kind(err),
            Self::Collect(CollectError::DanglingReference { .. }) => ErrorKind::DanglingReference,
            Self::Collect(CollectError::MissingInstance { .. }) => ErrorKind::Internal,
            Self::Collect(CollectError::Codec(err)) => codec_kind(err),
            Self::Library(err) => library_kind(err),
            Self::Store(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

fn codec_kind(err: &CodecError) -> ErrorKind {
    match err {
        CodecError::UnregisteredType(_) => ErrorKind::UnregisteredType,
        CodecError::UnsupportedField { .. }
        | CodecError::DuplicateField { .. }
        | CodecError::DuplicateSchema(_) => ErrorKind::UnsupportedField,
        CodecError::DanglingReference { .. } => ErrorKind::DanglingReference,
        CodecError::IdentityExhausted { .. } => ErrorKind::CapacityExceeded,
        _ => ErrorKind::Internal,
    }
}

fn library_kind(err: &LibraryError) -> ErrorKind {
    match err {
        LibraryError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
        LibraryError::Codec(err) => codec_kind(err),
        LibraryError::Store(_) | LibraryError::NotFound(_) => ErrorKind::Storage,
        LibraryError::InvalidState(_) => ErrorKind::Internal,
        LibraryError::InvalidMagic { .. }
        | LibraryError::UnsupportedVersion(_)
        | LibraryError::ChecksumMismatch { .. }
        | LibraryError::CrcMismatch { .. }
        | LibraryError::Corrupt { .. }
        | LibraryError::DuplicateIdentity { .. }
        | LibraryError::Serialization(_) => ErrorKind::Corrupt,
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
