//! Layered field schemas.
//!
//! A surrogate is described as a chain of [`FieldLayer`]s, base first. Each
//! layer contributes named fields with a declared [`FieldShape`] and a
//! type-erased getter/setter pair. Composing `Object -> Component -> own
//! type` layers gives every surrogate its supertypes' fields without any
//! inheritance on the Rust side.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use rtsl_scene::{Component, InstanceId, RuntimeObject};
use rtsl_types::{
    Primitive, PrimitiveField, RuntimeType, SurrogateType, ValueField, ValueSurrogate,
};

use crate::error::{CodecError, CodecResult};

/// How a field is stored in a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldShape {
    Primitive,
    Value,
    Reference,
    ReferenceArray,
}

impl FieldShape {
    pub fn is_reference(self) -> bool {
        matches!(self, Self::Reference | Self::ReferenceArray)
    }
}

/// A field value read from, or written to, a live object.
#[derive(Clone, Debug, PartialEq)]
pub enum LiveValue {
    Primitive(Primitive),
    Value(ValueSurrogate),
    Reference(Option<InstanceId>),
    References(Vec<InstanceId>),
}

impl LiveValue {
    pub fn shape(&self) -> FieldShape {
        match self {
            Self::Primitive(_) => FieldShape::Primitive,
            Self::Value(_) => FieldShape::Value,
            Self::Reference(_) => FieldShape::Reference,
            Self::References(_) => FieldShape::ReferenceArray,
        }
    }
}

/// Reads a field; `None` when the object is not of the layer's type.
pub type Getter = Box<dyn Fn(&dyn RuntimeObject) -> Option<LiveValue> + Send + Sync>;

/// Writes a field; `false` when the object or the value does not fit.
pub type Setter = Box<dyn Fn(&mut dyn RuntimeObject, LiveValue) -> bool + Send + Sync>;

/// Builds an empty instance of a schema's runtime type.
pub type Constructor = Box<dyn Fn() -> Box<dyn RuntimeObject> + Send + Sync>;

/// One declared field.
pub struct FieldSpec {
    name: &'static str,
    shape: FieldShape,
    part: bool,
    get: Getter,
    set: Setter,
}

impl FieldSpec {
    /// A field from raw erased accessors.
    pub fn new(name: &'static str, shape: FieldShape, get: Getter, set: Setter) -> Self {
        Self {
            name,
            shape,
            part: false,
            get,
            set,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    /// Whether the field lists owned sub-objects.
    pub fn is_part(&self) -> bool {
        self.part
    }

    pub fn get(&self, object: &dyn RuntimeObject) -> Option<LiveValue> {
        (self.get)(object)
    }

    pub fn set(&self, object: &mut dyn RuntimeObject, value: LiveValue) -> bool {
        (self.set)(object, value)
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("part", &self.part)
            .finish()
    }
}

/// The fields one level of a type chain contributes.
#[derive(Debug)]
pub struct FieldLayer {
    name: &'static str,
    fields: Vec<FieldSpec>,
}

impl FieldLayer {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// Typed builder for a [`FieldLayer`] over runtime type `T`.
pub struct Layer<T> {
    name: &'static str,
    fields: Vec<FieldSpec>,
    _type: PhantomData<fn() -> T>,
}

impl<T: RuntimeObject> Layer<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            _type: PhantomData,
        }
    }

    pub fn primitive<F, G, S>(self, name: &'static str, get: G, set: S) -> Self
    where
        F: PrimitiveField + 'static,
        G: Fn(&T) -> F + Send + Sync + 'static,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        self.typed(
            name,
            FieldShape::Primitive,
            move |t| LiveValue::Primitive(get(t).into_primitive()),
            move |t, value| match value {
                LiveValue::Primitive(p) => F::from_primitive(&p).map(|v| set(t, v)).is_some(),
                _ => false,
            },
        )
    }

    pub fn value<V, G, S>(self, name: &'static str, get: G, set: S) -> Self
    where
        V: ValueField + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.typed(
            name,
            FieldShape::Value,
            move |t| LiveValue::Value(get(t).into_value()),
            move |t, value| match value {
                LiveValue::Value(v) => V::from_value(&v).map(|v| set(t, v)).is_some(),
                _ => false,
            },
        )
    }

    pub fn reference<G, S>(self, name: &'static str, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Option<InstanceId> + Send + Sync + 'static,
        S: Fn(&mut T, Option<InstanceId>) + Send + Sync + 'static,
    {
        self.typed(
            name,
            FieldShape::Reference,
            move |t| LiveValue::Reference(get(t)),
            move |t, value| match value {
                LiveValue::Reference(r) => {
                    set(t, r);
                    true
                }
                _ => false,
            },
        )
    }

    pub fn references<G, S>(self, name: &'static str, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Vec<InstanceId> + Send + Sync + 'static,
        S: Fn(&mut T, Vec<InstanceId>) + Send + Sync + 'static,
    {
        self.typed(
            name,
            FieldShape::ReferenceArray,
            move |t| LiveValue::References(get(t)),
            move |t, value| match value {
                LiveValue::References(list) => {
                    set(t, list);
                    true
                }
                _ => false,
            },
        )
    }

    /// A reference array of owned sub-objects, kept in the same shard as
    /// their owner.
    pub fn parts<G, S>(mut self, name: &'static str, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Vec<InstanceId> + Send + Sync + 'static,
        S: Fn(&mut T, Vec<InstanceId>) + Send + Sync + 'static,
    {
        self = self.references(name, get, set);
        if let Some(last) = self.fields.last_mut() {
            last.part = true;
        }
        self
    }

    /// A field with hand-written erased accessors.
    pub fn raw(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    fn typed<G, S>(mut self, name: &'static str, shape: FieldShape, get: G, set: S) -> Self
    where
        G: Fn(&T) -> LiveValue + Send + Sync + 'static,
        S: Fn(&mut T, LiveValue) -> bool + Send + Sync + 'static,
    {
        self.fields.push(FieldSpec {
            name,
            shape,
            part: false,
            get: Box::new(move |obj: &dyn RuntimeObject| {
                obj.as_any().downcast_ref::<T>().map(&get)
            }),
            set: Box::new(move |obj: &mut dyn RuntimeObject, value: LiveValue| {
                match obj.as_any_mut().downcast_mut::<T>() {
                    Some(t) => set(t, value),
                    None => false,
                }
            }),
        });
        self
    }

    fn erase(self) -> FieldLayer {
        FieldLayer {
            name: self.name,
            fields: self.fields,
        }
    }
}

/// Fields shared by every runtime object.
pub fn object_layer<T: RuntimeObject>() -> Layer<T> {
    Layer::new("Object")
        .primitive(
            "name",
            |t: &T| t.base().name.clone(),
            |t: &mut T, v: String| t.base_mut().name = v,
        )
        .primitive(
            "hide_flags",
            |t: &T| t.base().hide_flags,
            |t: &mut T, v: u32| t.base_mut().hide_flags = v,
        )
}

/// Fields shared by every component.
pub fn component_layer<T: Component>() -> Layer<T> {
    Layer::new("Component").reference(
        "game_object",
        |t: &T| t.game_object(),
        |t: &mut T, v| t.set_game_object(v),
    )
}

/// Assembles the layer chain of one surrogate.
pub struct SchemaBuilder<T> {
    surrogate: SurrogateType,
    construct: Constructor,
    layers: Vec<FieldLayer>,
    _type: PhantomData<fn() -> T>,
}

impl<T: RuntimeObject + Default> SchemaBuilder<T> {
    pub fn new(surrogate: impl Into<SurrogateType>) -> Self {
        Self::with_constructor(surrogate, T::default)
    }
}

impl<T: RuntimeObject> SchemaBuilder<T> {
    pub fn with_constructor<C>(surrogate: impl Into<SurrogateType>, construct: C) -> Self
    where
        C: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            surrogate: surrogate.into(),
            construct: Box::new(move || Box::new(construct()) as Box<dyn RuntimeObject>),
            layers: Vec::new(),
            _type: PhantomData,
        }
    }

    /// Append the next layer; call base layers first.
    pub fn layer(mut self, layer: Layer<T>) -> Self {
        self.layers.push(layer.erase());
        self
    }

    pub fn build(self) -> CodecResult<SurrogateSchema> {
        let mut seen = HashSet::new();
        for field in self.layers.iter().flat_map(|l| l.fields.iter()) {
            if !seen.insert(field.name) {
                return Err(CodecError::DuplicateField {
                    surrogate: self.surrogate,
                    field: field.name.to_string(),
                });
            }
        }
        Ok(SurrogateSchema {
            surrogate: self.surrogate,
            runtime: RuntimeType::of::<T>(),
            construct: self.construct,
            layers: self.layers,
        })
    }
}

/// Field mapping between one runtime type and its surrogate.
pub struct SurrogateSchema {
    surrogate: SurrogateType,
    runtime: RuntimeType,
    construct: Constructor,
    layers: Vec<FieldLayer>,
}

impl SurrogateSchema {
    pub fn surrogate(&self) -> &SurrogateType {
        &self.surrogate
    }

    pub fn runtime(&self) -> RuntimeType {
        self.runtime
    }

    pub fn layers(&self) -> &[FieldLayer] {
        &self.layers
    }

    /// All fields, base layers first.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> + '_ {
        self.layers.iter().flat_map(|l| l.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.name == name)
    }

    pub fn reference_fields(&self) -> impl Iterator<Item = &FieldSpec> + '_ {
        self.fields().filter(|f| f.shape.is_reference())
    }

    pub fn construct(&self) -> Box<dyn RuntimeObject> {
        (self.construct)()
    }
}

impl fmt::Debug for SurrogateSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurrogateSchema")
            .field("surrogate", &self.surrogate)
            .field("runtime", &self.runtime)
            .field("layers", &self.layers)
            .finish()
    }
}
