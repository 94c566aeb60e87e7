use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Descriptor of a live Rust type.
///
/// Equality and hashing use only the `TypeId`; the name is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct RuntimeType {
    id: TypeId,
    name: &'static str,
}

impl RuntimeType {
    /// Descriptor for `T`.
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let head = self.name.split('<').next().unwrap_or(self.name);
        match head.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for RuntimeType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RuntimeType {}

impl Hash for RuntimeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuntimeType({})", self.name)
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Persistent type tag written into every [`SurrogateRecord`].
///
/// [`SurrogateRecord`]: crate::SurrogateRecord
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurrogateType(Cow<'static, str>);

impl SurrogateType {
    /// A tag backed by a static string (no allocation).
    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    /// A tag from an owned or borrowed string; rejects empty tags.
    pub fn new(tag: impl Into<String>) -> Result<Self, TypeError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(TypeError::EmptyTag);
        }
        Ok(Self(Cow::Owned(tag)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SurrogateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurrogateType({})", self.0)
    }
}

impl fmt::Display for SurrogateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for SurrogateType {
    fn from(tag: &'static str) -> Self {
        Self::from_static(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    mod nested {
        pub struct Generic<T>(pub T);
    }

    #[test]
    fn runtime_type_equality_uses_type_id() {
        assert_eq!(RuntimeType::of::<Marker>(), RuntimeType::of::<Marker>());
        assert_ne!(RuntimeType::of::<Marker>(), RuntimeType::of::<u32>());
    }

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(RuntimeType::of::<Marker>().short_name(), "Marker");
        assert_eq!(RuntimeType::of::<u32>().short_name(), "u32");
        let generic = RuntimeType::of::<nested::Generic<Marker>>();
        assert!(generic.short_name().starts_with("Generic<"));
    }

    #[test]
    fn surrogate_tags_compare_by_content() {
        let a = SurrogateType::from_static("PersistentMesh");
        let b = SurrogateType::new(String::from("PersistentMesh")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "PersistentMesh");
    }

    #[test]
    fn empty_tag_rejected() {
        assert_eq!(SurrogateType::new(""), Err(TypeError::EmptyTag));
    }
}
