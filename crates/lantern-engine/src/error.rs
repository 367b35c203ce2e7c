//! Error type for simulation operations.

use lantern_ecs::entity::EntityId;
use lantern_ecs::EcsError;
use rapier3d::prelude::ColliderHandle;

use crate::sensor::SensorCommandHandle;

/// Errors produced by repositories, systems and command execution.
///
/// Missing components surface uniformly as [`SimError::Ecs`] wrapping
/// [`EcsError::ComponentNotFound`]; no repository silently ignores them.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// The entity has a physics component but no kinematic character
    /// controller, and the operation sweeps one.
    #[error("entity {entity} has no character controller")]
    MissingCharacterController { entity: EntityId },

    /// The entity has a physics component without any collider.
    #[error("entity {entity} has no collider")]
    MissingCollider { entity: EntityId },

    /// A collider handle that does not belong to the physics world.
    #[error("collider {collider:?} is not part of the physics world")]
    UnknownCollider { collider: ColliderHandle },

    /// Mesh data that cannot form a triangle mesh.
    #[error("invalid mesh: {reason}")]
    InvalidMesh { reason: String },

    /// No sensor command record exists for the handle.
    #[error("no sensor command {handle:?}")]
    UnknownSensorCommand { handle: SensorCommandHandle },

    /// A player tried to trigger an interaction that is not available this
    /// tick (no target overlaps its sensor, or it is disabled).
    #[error("interaction {handle:?} is not available on entity {entity}")]
    InteractionUnavailable {
        entity: EntityId,
        handle: SensorCommandHandle,
    },

    /// A command addressed its triggering entity but was queued without one.
    #[error("command '{command}' targets its trigger but none was recorded")]
    NoTrigger { command: String },

    /// A scene script command returned an error.
    #[error("script command '{name}' failed: {source}")]
    Script {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// Loading or validating configuration failed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}
