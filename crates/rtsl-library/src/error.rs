use rtsl_codec::CodecError;
use rtsl_store::StoreError;
use rtsl_types::Identity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("a unit of {unit} objects cannot fit a shard of at most {max} assets")]
    CapacityExceeded { unit: usize, max: usize },

    #[error("invalid shard magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported shard format version: {0}")]
    UnsupportedVersion(u32),

    #[error("shard checksum mismatch for {key}")]
    ChecksumMismatch { key: String },

    #[error("CRC32 mismatch for entry {index}")]
    CrcMismatch { index: usize },

    #[error("corrupt shard at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("identity {identity} appears in both {first} and {second}")]
    DuplicateIdentity {
        identity: Identity,
        first: String,
        second: String,
    },

    #[error("shard not found: {0}")]
    NotFound(String),

    #[error("invalid sharder state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for LibraryError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;
