//! Dependency closure collection for the runtime save/load codec.
//!
//! [`DependencyCollector`] walks from a root set through every serializable
//! reference field and returns each reachable object exactly once, in a
//! deterministic discovery order. It runs on live objects before a save and
//! on record sets before a load.

pub mod collector;
pub mod error;

pub use collector::{DependencyCollector, LiveClosure, RecordClosure, TraversalOrder};
pub use error::{CollectError, CollectResult};
