use crate::object::InstanceId;

/// Errors from scene mutations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The instance does not exist in this world.
    #[error("instance not found: {0}")]
    NotFound(InstanceId),

    /// The instance exists but is not of the expected type.
    #[error("instance {id} is a {actual}, expected {expected}")]
    WrongType {
        id: InstanceId,
        expected: &'static str,
        actual: &'static str,
    },

    /// Re-parenting would make a game object its own ancestor.
    #[error("cannot parent {child} under its own descendant {parent}")]
    HierarchyCycle { child: InstanceId, parent: InstanceId },
}

/// Result alias for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
