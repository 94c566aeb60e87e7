//! Field payloads that are copied by value into a record.
//!
//! [`Primitive`] covers scalars, strings and flat numeric arrays.
//! [`ValueSurrogate`] covers small embedded value types (vectors, quaternions,
//! colors). Neither can hold a reference to another object.

use serde::{Deserialize, Serialize};

use crate::runtime::RuntimeType;

/// A primitive field payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    StrArray(Vec<String>),
}

impl Primitive {
    /// Short name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::IntArray(_) => "int[]",
            Self::FloatArray(_) => "float[]",
            Self::StrArray(_) => "string[]",
        }
    }
}

/// Conversion between a Rust field type and a [`Primitive`].
pub trait PrimitiveField: Sized {
    fn into_primitive(self) -> Primitive;
    fn from_primitive(primitive: &Primitive) -> Option<Self>;
}

impl PrimitiveField for bool {
    fn into_primitive(self) -> Primitive {
        Primitive::Bool(self)
    }

    fn from_primitive(primitive: &Primitive) -> Option<Self> {
        match primitive {
            Primitive::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! int_primitive {
    ($($ty:ty),*) => {
        $(
            impl PrimitiveField for $ty {
                fn into_primitive(self) -> Primitive {
                    Primitive::Int(self as i64)
                }

                fn from_primitive(primitive: &Primitive) -> Option<Self> {
                    match primitive {
                        Primitive::Int(v) => <$ty>::try_from(*v).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

int_primitive!(i32, i64, u8, u16, u32);

impl PrimitiveField for f32 {
    fn into_primitive(self) -> Primitive {
        Primitive::Float(self as f64)
    }

    fn from_primitive(primitive: &Primitive) -> Option<Self> {
        match primitive {
            Primitive::Float(v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl PrimitiveField for f64 {
    fn into_primitive(self) -> Primitive {
        Primitive::Float(self)
    }

    fn from_primitive(primitive: &Primitive) -> Option<Self> {
        match primitive {
            Primitive::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl PrimitiveField for String {
    fn into_primitive(self) -> Primitive {
        Primitive::Str(self)
    }

    fn from_primitive(primitive: &Primitive) -> Option<Self> {
        match primitive {
            Primitive::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl PrimitiveField for Vec<u8> {
    fn into_primitive(self) -> Primitive {
        Primitive::Bytes(self)
    }

    fn from_primitive(primitive: &Primitive) -> Option<Self> {
        match primitive {
            Primitive::Bytes(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl PrimitiveField for Vec<i32> {
    fn into_primitive(self) -> Primitive {
        Primitive::IntArray(self.into_iter().map(i64::from).collect())
    }

    fn from_primitive(primitive: &Primitive) -> Option<Self> {
        match primitive {
            Primitive::IntArray(v) => v.iter().map(|&i| i32::try_from(i).ok()).collect(),
            _ => None,
        }
    }
}

impl PrimitiveField for Vec<f32> {
    fn into_primitive(self) -> Primitive {
        Primitive::FloatArray(self.into_iter().map(f64::from).collect())
    }

    fn from_primitive(primitive: &Primitive) -> Option<Self> {
        match primitive {
            Primitive::FloatArray(v) => Some(v.iter().map(|&f| f as f32).collect()),
            _ => None,
        }
    }
}

impl PrimitiveField for Vec<String> {
    fn into_primitive(self) -> Primitive {
        Primitive::StrArray(self)
    }

    fn from_primitive(primitive: &Primitive) -> Option<Self> {
        match primitive {
            Primitive::StrArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3::new(0.0, 0.0, 0.0);
    pub const ONE: Vector3 = Vector3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// Rotation quaternion. The default is the identity rotation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Linear RGBA color. The default is opaque white.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Embedded value-type surrogate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ValueSurrogate {
    Vector2(Vector2),
    Vector3(Vector3),
    Vector4(Vector4),
    Quaternion(Quaternion),
    Color(Color),
    Vector3Array(Vec<Vector3>),
}

impl ValueSurrogate {
    /// The live type this value stands in for.
    pub fn runtime_type(&self) -> RuntimeType {
        match self {
            Self::Vector2(_) => RuntimeType::of::<Vector2>(),
            Self::Vector3(_) => RuntimeType::of::<Vector3>(),
            Self::Vector4(_) => RuntimeType::of::<Vector4>(),
            Self::Quaternion(_) => RuntimeType::of::<Quaternion>(),
            Self::Color(_) => RuntimeType::of::<Color>(),
            Self::Vector3Array(_) => RuntimeType::of::<Vec<Vector3>>(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Vector2(_) => "vector2",
            Self::Vector3(_) => "vector3",
            Self::Vector4(_) => "vector4",
            Self::Quaternion(_) => "quaternion",
            Self::Color(_) => "color",
            Self::Vector3Array(_) => "vector3[]",
        }
    }
}

/// Conversion between a Rust value type and a [`ValueSurrogate`].
pub trait ValueField: Sized {
    fn into_value(self) -> ValueSurrogate;
    fn from_value(value: &ValueSurrogate) -> Option<Self>;
}

macro_rules! value_field {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ValueField for $ty {
                fn into_value(self) -> ValueSurrogate {
                    ValueSurrogate::$variant(self)
                }

                fn from_value(value: &ValueSurrogate) -> Option<Self> {
                    match value {
                        ValueSurrogate::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

value_field!(
    Vector2 => Vector2,
    Vector3 => Vector3,
    Vector4 => Vector4,
    Quaternion => Quaternion,
    Color => Color,
    Vec<Vector3> => Vector3Array,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_ints_reject_out_of_range() {
        let big = Primitive::Int(i64::from(u32::MAX) + 1);
        assert_eq!(u32::from_primitive(&big), None);
        assert_eq!(i64::from_primitive(&big), Some(i64::from(u32::MAX) + 1));
        assert_eq!(i32::from_primitive(&Primitive::Int(-7)), Some(-7));
        assert_eq!(u8::from_primitive(&Primitive::Int(-1)), None);
    }

    #[test]
    fn f32_survives_widening() {
        let v = 0.1f32;
        assert_eq!(f32::from_primitive(&v.into_primitive()), Some(v));
    }

    #[test]
    fn wrong_variant_is_none() {
        assert_eq!(bool::from_primitive(&Primitive::Int(1)), None);
        assert_eq!(String::from_primitive(&Primitive::Bool(true)), None);
        assert_eq!(Vector3::from_value(&ValueSurrogate::Color(Color::WHITE)), None);
    }

    #[test]
    fn int_array_rejects_overflowing_entries() {
        let p = Primitive::IntArray(vec![1, i64::MAX]);
        assert_eq!(Vec::<i32>::from_primitive(&p), None);
        assert_eq!(
            Vec::<i32>::from_primitive(&vec![1, 2, 3].into_primitive()),
            Some(vec![1, 2, 3])
        );
    }

    #[test]
    fn value_runtime_types_are_distinct() {
        let a = ValueSurrogate::Vector3(Vector3::ONE).runtime_type();
        let b = ValueSurrogate::Vector3Array(vec![]).runtime_type();
        assert_ne!(a, b);
        assert_eq!(a, RuntimeType::of::<Vector3>());
    }

    #[test]
    fn defaults_are_identity_and_white() {
        assert_eq!(Quaternion::default().w, 1.0);
        assert_eq!(Color::default(), Color::WHITE);
    }
}
