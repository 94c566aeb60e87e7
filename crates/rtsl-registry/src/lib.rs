//! Type registry for the runtime save/load codec.
//!
//! Maps every serializable live type to exactly one persistent surrogate tag
//! and back. The registry is assembled once through [`TypeRegistryBuilder`]
//! and is immutable afterwards; passes share it by reference.

pub mod error;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use registry::{TypeRegistry, TypeRegistryBuilder};
