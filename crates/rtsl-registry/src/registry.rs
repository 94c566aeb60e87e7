use std::any::Any;
use std::collections::{BTreeMap, HashMap};

use rtsl_types::{RuntimeType, SurrogateType};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// Collects registrations before the registry is frozen.
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    forward: HashMap<RuntimeType, SurrogateType>,
    reverse: BTreeMap<SurrogateType, RuntimeType>,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `runtime` to `surrogate`.
    ///
    /// Registering the same pair twice is a no-op. Mapping either side to a
    /// different partner is an error: the mapping must stay one-to-one.
    pub fn register(
        &mut self,
        runtime: RuntimeType,
        surrogate: SurrogateType,
    ) -> RegistryResult<&mut Self> {
        if let Some(existing) = self.forward.get(&runtime) {
            if *existing == surrogate {
                return Ok(self);
            }
            return Err(RegistryError::DuplicateRuntime {
                runtime,
                existing: existing.clone(),
            });
        }
        if let Some(existing) = self.reverse.get(&surrogate) {
            return Err(RegistryError::DuplicateSurrogate {
                surrogate,
                existing: *existing,
            });
        }
        self.forward.insert(runtime, surrogate.clone());
        self.reverse.insert(surrogate, runtime);
        Ok(self)
    }

    /// Typed shorthand for [`register`](Self::register).
    pub fn register_type<T: Any>(
        &mut self,
        surrogate: impl Into<SurrogateType>,
    ) -> RegistryResult<&mut Self> {
        self.register(RuntimeType::of::<T>(), surrogate.into())
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn build(self) -> TypeRegistry {
        debug!(types = self.forward.len(), "type registry frozen");
        TypeRegistry {
            forward: self.forward,
            reverse: self.reverse,
        }
    }
}

/// Immutable runtime-type to surrogate-type mapping.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    forward: HashMap<RuntimeType, SurrogateType>,
    reverse: BTreeMap<SurrogateType, RuntimeType>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    pub fn surrogate_for(&self, runtime: &RuntimeType) -> RegistryResult<&SurrogateType> {
        self.forward
            .get(runtime)
            .ok_or_else(|| RegistryError::UnregisteredType(runtime.name().to_string()))
    }

    pub fn runtime_for(&self, surrogate: &SurrogateType) -> RegistryResult<RuntimeType> {
        self.reverse
            .get(surrogate)
            .copied()
            .ok_or_else(|| RegistryError::UnregisteredType(surrogate.to_string()))
    }

    pub fn contains_runtime(&self, runtime: &RuntimeType) -> bool {
        self.forward.contains_key(runtime)
    }

    pub fn contains_surrogate(&self, surrogate: &SurrogateType) -> bool {
        self.reverse.contains_key(surrogate)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Registrations ordered by surrogate tag.
    pub fn iter(&self) -> impl Iterator<Item = (&SurrogateType, RuntimeType)> + '_ {
        self.reverse.iter().map(|(s, r)| (s, *r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mesh;
    struct Material;

    fn registry() -> TypeRegistry {
        let mut builder = TypeRegistry::builder();
        builder
            .register_type::<Mesh>("PersistentMesh")
            .unwrap()
            .register_type::<Material>("PersistentMaterial")
            .unwrap();
        builder.build()
    }

    #[test]
    fn lookups_work_both_ways() {
        let reg = registry();
        let tag = reg.surrogate_for(&RuntimeType::of::<Mesh>()).unwrap();
        assert_eq!(tag.as_str(), "PersistentMesh");
        assert_eq!(reg.runtime_for(tag).unwrap(), RuntimeType::of::<Mesh>());
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn misses_are_unregistered_type() {
        let reg = registry();
        let err = reg.surrogate_for(&RuntimeType::of::<u8>()).unwrap_err();
        assert!(matches!(err, RegistryError::UnregisteredType(name) if name == "u8"));
        let err = reg
            .runtime_for(&SurrogateType::from_static("PersistentNope"))
            .unwrap_err();
        assert_eq!(err, RegistryError::UnregisteredType("PersistentNope".into()));
    }

    #[test]
    fn same_pair_twice_is_idempotent() {
        let mut builder = TypeRegistry::builder();
        builder.register_type::<Mesh>("PersistentMesh").unwrap();
        builder.register_type::<Mesh>("PersistentMesh").unwrap();
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn conflicting_registrations_rejected() {
        let mut builder = TypeRegistry::builder();
        builder.register_type::<Mesh>("PersistentMesh").unwrap();
        let err = builder.register_type::<Mesh>("PersistentOther").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRuntime { .. }));
        let err = builder
            .register_type::<Material>("PersistentMesh")
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateSurrogate { .. }));
    }

    #[test]
    fn iter_is_sorted_by_tag() {
        let reg = registry();
        let tags: Vec<_> = reg.iter().map(|(s, _)| s.as_str().to_string()).collect();
        assert_eq!(tags, vec!["PersistentMaterial", "PersistentMesh"]);
    }
}
