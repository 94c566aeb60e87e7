use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::runtime::SurrogateType;
use crate::value::{Primitive, ValueSurrogate};

/// One stored field of a [`SurrogateRecord`].
///
/// Object relationships are never embedded: a reference is always an
/// [`Identity`], `Identity::NULL` standing for "no object".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Primitive(Primitive),
    Value(ValueSurrogate),
    Ref(Identity),
    RefList(Vec<Identity>),
}

impl FieldValue {
    /// Short name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Value(_) => "value",
            Self::Ref(_) => "reference",
            Self::RefList(_) => "reference-array",
        }
    }

    /// Non-null identities held by this value, in stored order.
    pub fn identities(&self) -> impl Iterator<Item = Identity> + '_ {
        let slice: &[Identity] = match self {
            Self::Ref(id) => std::slice::from_ref(id),
            Self::RefList(ids) => ids,
            _ => &[],
        };
        slice.iter().copied().filter(|id| !id.is_null())
    }
}

/// The serialized form of one instance: type tag, identity and named fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurrogateRecord {
    pub identity: Identity,
    pub type_tag: SurrogateType,
    pub fields: BTreeMap<String, FieldValue>,
}

impl SurrogateRecord {
    pub fn new(identity: Identity, type_tag: SurrogateType) -> Self {
        Self {
            identity,
            type_tag,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Insert or replace a field. Returns the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Every non-null identity found in any field.
    ///
    /// This scans the whole record. The codec's dependency enumeration only
    /// looks at fields its schema declares as references.
    pub fn all_references(&self) -> impl Iterator<Item = Identity> + '_ {
        self.fields.values().flat_map(FieldValue::identities)
    }
}
