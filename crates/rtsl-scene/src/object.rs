use std::any::Any;
use std::fmt;

use rtsl_types::RuntimeType;

/// Handle of a live object inside a [`World`].
///
/// The `world` part is unique per `World` instance, so a handle minted by
/// one world never matches an object of another.
///
/// [`World`]: crate::World
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    world: u32,
    index: u32,
}

impl InstanceId {
    pub(crate) const fn new(world: u32, index: u32) -> Self {
        Self { world, index }
    }

    /// Id of the world that minted this handle.
    pub const fn world(&self) -> u32 {
        self.world
    }

    /// Arena index within the world.
    pub const fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId(w{}#{})", self.world, self.index)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}#{}", self.world, self.index)
    }
}

/// State shared by every runtime object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectBase {
    pub name: String,
    pub hide_flags: u32,
}

impl ObjectBase {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hide_flags: 0,
        }
    }
}

/// A live object that can be stored in a [`World`].
///
/// Implement with [`impl_runtime_object!`] for any struct that has a
/// `base: ObjectBase` field.
///
/// [`World`]: crate::World
/// [`impl_runtime_object!`]: crate::impl_runtime_object
pub trait RuntimeObject: Any + fmt::Debug + Send + Sync {
    fn base(&self) -> &ObjectBase;
    fn base_mut(&mut self) -> &mut ObjectBase;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Descriptor of the concrete type behind this object.
    fn runtime_type(&self) -> RuntimeType {
        RuntimeType::of::<Self>()
    }

    fn name(&self) -> &str {
        &self.base().name
    }
}

/// A runtime object attached to a [`GameObject`].
///
/// [`GameObject`]: crate::GameObject
pub trait Component: RuntimeObject {
    fn game_object(&self) -> Option<InstanceId>;
    fn set_game_object(&mut self, game_object: Option<InstanceId>);
}

/// Implements [`RuntimeObject`] for types with a `base: ObjectBase` field.
#[macro_export]
macro_rules! impl_runtime_object {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::RuntimeObject for $ty {
                fn base(&self) -> &$crate::ObjectBase {
                    &self.base
                }

                fn base_mut(&mut self) -> &mut $crate::ObjectBase {
                    &mut self.base
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                    self
                }
            }
        )+
    };
}

/// Implements [`Component`] for runtime objects with a
/// `game_object: Option<InstanceId>` field.
#[macro_export]
macro_rules! impl_component {
    ($($ty:ty),+ $(,)?) => {
        $(
            $crate::impl_runtime_object!($ty);

            impl $crate::Component for $ty {
                fn game_object(&self) -> Option<$crate::InstanceId> {
                    self.game_object
                }

                fn set_game_object(&mut self, game_object: Option<$crate::InstanceId>) {
                    self.game_object = game_object;
                }
            }
        )+
    };
}
