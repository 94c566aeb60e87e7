//! Foundation types for the runtime save/load codec (RTSL).
//!
//! This crate provides the identity, type-descriptor and record types shared
//! by every other RTSL crate. Nothing here knows about live objects; it only
//! describes the flat, persistent side of the codec.
//!
//! # Key Types
//!
//! - [`Identity`]: shard-ordinal + local counter; `0` is the null reference
//! - [`RuntimeType`]: descriptor of a live Rust type (keyed by `TypeId`)
//! - [`SurrogateType`]: persistent type tag written into records
//! - [`Primitive`] / [`ValueSurrogate`]: field payloads copied by value
//! - [`FieldValue`]: one stored field: primitive, value, reference or reference list
//! - [`SurrogateRecord`]: the serialized form of one instance

pub mod error;
pub mod identity;
pub mod record;
pub mod runtime;
pub mod value;

pub use error::TypeError;
pub use identity::Identity;
pub use record::{FieldValue, SurrogateRecord};
pub use runtime::{RuntimeType, SurrogateType};
pub use value::{
    Color, Primitive, PrimitiveField, Quaternion, ValueField, ValueSurrogate, Vector2, Vector3,
    Vector4,
};
