//! Live runtime object model for RTSL.
//!
//! The codec never owns live objects. It reads them from, and writes them
//! into, a [`World`]: an arena of boxed [`RuntimeObject`]s addressed by
//! [`InstanceId`]. Objects refer to each other only by `InstanceId`, so
//! cyclic graphs (a transform and its parent, a component and its game
//! object) are ordinary data.
//!
//! # Built-in types
//!
//! - Scene objects: [`GameObject`], [`Transform`], [`MeshFilter`],
//!   [`MeshRenderer`], [`RuntimeAnimation`]
//! - Assets: [`Mesh`], [`Material`], [`Texture2D`], [`Sprite`], [`Font`],
//!   [`RuntimeAnimationClip`]
//! - [`BuiltinAssets`]: the fixed set of engine built-ins shared by every scene

pub mod assets;
pub mod builtin;
pub mod components;
pub mod error;
pub mod object;
pub mod world;

pub use assets::{Font, Material, Mesh, RuntimeAnimationClip, Sprite, Texture2D};
pub use builtin::BuiltinAssets;
pub use components::{GameObject, MeshFilter, MeshRenderer, RuntimeAnimation, Transform};
pub use error::{SceneError, SceneResult};
pub use object::{Component, InstanceId, ObjectBase, RuntimeObject};
pub use world::World;
