//! Surrogate codec for the runtime save/load system.
//!
//! Converts live objects in a [`World`](rtsl_scene::World) into flat
//! [`SurrogateRecord`](rtsl_types::SurrogateRecord)s that hold identities
//! instead of object references, and rebuilds live objects from records.
//!
//! # Pieces
//!
//! - [`IdentityStore`]: one identity per instance for the length of a pass,
//!   reverse lookup, and the "already present" set
//! - [`SchemaBuilder`] / [`Layer`]: per-type field mappings composed base first
//! - [`Codec`]: extract, apply, and dependency enumeration in both directions
//! - [`Materializer`]: two-phase placeholder-then-patch reconstruction
//! - [`surrogates`]: adapters for the built-in scene and asset types

pub mod codec;
pub mod error;
pub mod identity;
pub mod materialize;
pub mod schema;
pub mod surrogates;

pub use codec::{Codec, CodecBuilder};
pub use error::{CodecError, CodecResult};
pub use identity::{IdentityStore, ResolveIdentity};
pub use materialize::{Materializer, RecordSource};
pub use schema::{
    component_layer, object_layer, FieldLayer, FieldShape, FieldSpec, Layer, LiveValue,
    SchemaBuilder, SurrogateSchema,
};
