//! rapier3d integration: colliders, kinematic characters and gravity.
//!
//! The [`PhysicsRepository`] owns a rapier world and the per-entity
//! [`PhysicsComponent`]s that reference bodies and colliders inside it. Game
//! code never touches rapier handles' owners directly; it goes through the
//! repository so that removing an entity's component also tears down
//! everything it created in the world.
//!
//! # Character movement
//!
//! Characters are kinematic position-based bodies driven by a
//! [`KinematicCharacterController`]. Each logic tick resolves movement in two
//! independent sweeps:
//!
//! 1. vertical: [`apply_gravity`](PhysicsRepository::apply_gravity), between
//!    the two world steps of the physics phase;
//! 2. horizontal: [`try_move_character_controller`](PhysicsRepository::try_move_character_controller),
//!    from the movement phase.
//!
//! A sweep never moves the body directly. It sets the next kinematic
//! translation, which the following [`tick_world`](PhysicsRepository::tick_world)
//! commits.

use glam::{Quat, Vec3};
use lantern_ecs::entity::EntityId;
use lantern_ecs::store::{ComponentStore, SimulationRepository};
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;
use rapier3d::parry::query::Unsupported;
use tracing::{debug, warn};

use crate::config::PhysicsConfig;
use crate::error::SimError;
use crate::math::{from_vector, to_point, to_rotation, to_vector};
use crate::scene::SceneNode;

/// Repository name used in errors and logs.
pub const PHYSICS_REPOSITORY: &str = "physics";

// ---------------------------------------------------------------------------
// PhysicsComponent
// ---------------------------------------------------------------------------

/// Physics state of one entity.
///
/// The first body, collider and controller are the entity's *primary* ones:
/// position queries and character sweeps use them. Additional colliders are
/// usually sensors or static level geometry.
#[derive(Default)]
pub struct PhysicsComponent {
    colliders: Vec<ColliderHandle>,
    characters: Vec<KinematicCharacterController>,
    bodies: Vec<RigidBodyHandle>,
    previous_position: Vec3,
    vertical_velocity: f32,
    affected_by_gravity: bool,
    grounded: bool,
}

// ---------------------------------------------------------------------------
// PhysicsRepository
// ---------------------------------------------------------------------------

/// Per-entity physics state plus the rapier world it lives in.
pub struct PhysicsRepository {
    store: ComponentStore<PhysicsComponent>,
    config: PhysicsConfig,
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsRepository {
    /// An empty world stepping by `step_seconds` per [`tick_world`](Self::tick_world).
    pub fn new(config: PhysicsConfig, step_seconds: f32) -> Self {
        let mut integration_params = IntegrationParameters::default();
        integration_params.dt = step_seconds;

        Self {
            store: ComponentStore::new(PHYSICS_REPOSITORY),
            gravity: vector![0.0, config.gravity, 0.0],
            config,
            pipeline: PhysicsPipeline::new(),
            integration_params,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    // -- world --------------------------------------------------------------

    /// Advance the rapier world one step and refresh the query pipeline used
    /// by character sweeps.
    pub fn tick_world(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.query_pipeline.update(&self.collider_set);
    }

    /// Number of rigid bodies in the world.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Number of colliders in the world.
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    // -- positions ----------------------------------------------------------

    /// World-space position: primary body, else primary collider, else zero.
    pub fn position(&self, entity: EntityId) -> Result<Vec3, SimError> {
        let component = self.store.get(entity)?;
        if let Some(body) = component
            .bodies
            .first()
            .and_then(|h| self.rigid_body_set.get(*h))
        {
            return Ok(from_vector(body.translation()));
        }
        if let Some(collider) = component
            .colliders
            .first()
            .and_then(|h| self.collider_set.get(*h))
        {
            return Ok(from_vector(collider.translation()));
        }
        Ok(Vec3::ZERO)
    }

    /// Teleport the entity's primary body (or, without a body, its primary
    /// collider). Unlike a sweep this ignores collisions.
    pub fn set_position(&mut self, entity: EntityId, position: Vec3) -> Result<(), SimError> {
        let component = self.store.get(entity)?;
        if let Some(body) = component
            .bodies
            .first()
            .and_then(|h| self.rigid_body_set.get_mut(*h))
        {
            body.set_translation(to_vector(position), true);
            return Ok(());
        }
        match component
            .colliders
            .first()
            .and_then(|h| self.collider_set.get_mut(*h))
        {
            Some(collider) => {
                collider.set_translation(to_vector(position));
                Ok(())
            }
            None => Err(SimError::MissingCollider { entity }),
        }
    }

    pub fn previous_position(&self, entity: EntityId) -> Result<Vec3, SimError> {
        Ok(self.store.get(entity)?.previous_position)
    }

    pub fn set_previous_position(&mut self, entity: EntityId, position: Vec3) -> Result<(), SimError> {
        self.store.get_mut(entity)?.previous_position = position;
        Ok(())
    }

    /// Blend between the previous tick's position and the current one.
    /// `lerp = 0` is the previous position, `lerp = 1` the current one.
    pub fn interpolated_position(&self, entity: EntityId, lerp: f32) -> Result<Vec3, SimError> {
        let previous = self.previous_position(entity)?;
        let current = self.position(entity)?;
        Ok(previous.lerp(current, lerp))
    }

    /// Record every entity's current position as its previous position.
    pub fn snapshot_previous_positions(&mut self) -> Result<(), SimError> {
        for entity in self.store.ids().to_vec() {
            let position = self.position(entity)?;
            self.set_previous_position(entity, position)?;
        }
        Ok(())
    }

    // -- gravity ------------------------------------------------------------

    pub fn set_affected_by_gravity(&mut self, entity: EntityId, affected: bool) -> Result<(), SimError> {
        self.store.get_mut(entity)?.affected_by_gravity = affected;
        Ok(())
    }

    pub fn affected_by_gravity(&self, entity: EntityId) -> Result<bool, SimError> {
        Ok(self.store.get(entity)?.affected_by_gravity)
    }

    /// Vertical velocity in units per second.
    pub fn vertical_velocity(&self, entity: EntityId) -> Result<f32, SimError> {
        Ok(self.store.get(entity)?.vertical_velocity)
    }

    /// Override vertical velocity (e.g. a jump impulse). Clamped to the
    /// terminal velocity.
    pub fn set_vertical_velocity(&mut self, entity: EntityId, velocity: f32) -> Result<(), SimError> {
        let terminal = self.config.terminal_velocity;
        self.store.get_mut(entity)?.vertical_velocity = velocity.clamp(-terminal, terminal);
        Ok(())
    }

    /// Whether the last gravity sweep ended touching the ground.
    pub fn is_grounded(&self, entity: EntityId) -> Result<bool, SimError> {
        Ok(self.store.get(entity)?.grounded)
    }

    /// Integrate gravity for one entity over `dt` seconds.
    ///
    /// The velocity is accelerated, clamped to the terminal velocity, swept
    /// through the character controller, and then replaced by the velocity
    /// the sweep actually achieved. An entity blocked by the floor therefore
    /// does not keep accumulating downward speed.
    pub fn apply_gravity(&mut self, entity: EntityId, dt: f32) -> Result<(), SimError> {
        let terminal = self.config.terminal_velocity;
        let gravity = self.config.gravity;

        let component = self.store.get_mut(entity)?;
        if !component.affected_by_gravity {
            return Ok(());
        }
        let velocity = (component.vertical_velocity + gravity * dt).clamp(-terminal, terminal);
        component.vertical_velocity = velocity;

        let sweep = self.sweep(entity, vector![0.0, velocity * dt, 0.0], dt)?;
        self.commit(sweep.body, vector![0.0, sweep.translation.y, 0.0]);

        let component = self.store.get_mut(entity)?;
        component.grounded = sweep.grounded;
        if dt > 0.0 {
            component.vertical_velocity = (sweep.translation.y / dt).clamp(-terminal, terminal);
        }
        Ok(())
    }

    /// [`apply_gravity`](Self::apply_gravity) for every physics entity.
    pub fn apply_all_gravity(&mut self, dt: f32) -> Result<(), SimError> {
        for entity in self.store.ids().to_vec() {
            self.apply_gravity(entity, dt)?;
        }
        Ok(())
    }

    // -- characters ---------------------------------------------------------

    /// Give `entity` a kinematic body with a ball collider and a character
    /// controller.
    ///
    /// The controller climbs slopes up to `max_slope_climb_deg`, steps over
    /// ledges up to `autostep_max_height`, and does not snap to the ground.
    /// `skin_offset` is the gap the controller keeps between the ball and
    /// obstacles.
    pub fn create_character_controller_with_sphere(
        &mut self,
        entity: EntityId,
        position: Vec3,
        radius: f32,
        skin_offset: f32,
    ) -> Result<(), SimError> {
        self.store.get(entity)?;

        let controller = KinematicCharacterController {
            offset: CharacterLength::Absolute(skin_offset),
            max_slope_climb_angle: self.config.max_slope_climb_deg.to_radians(),
            autostep: Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(self.config.autostep_max_height),
                min_width: CharacterLength::Absolute(self.config.autostep_min_width),
                include_dynamic_bodies: true,
            }),
            snap_to_ground: self
                .config
                .snap_to_ground
                .then_some(CharacterLength::Absolute(0.2)),
            ..KinematicCharacterController::default()
        };

        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(to_vector(position))
            .lock_rotations()
            .linear_damping(0.0)
            .angular_damping(0.0)
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::ball(radius).friction(0.0).build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        let component = self.store.get_mut(entity)?;
        component.bodies.push(body_handle);
        component.colliders.push(collider_handle);
        component.characters.push(controller);
        component.previous_position = position;

        debug!(entity = %entity, ?position, radius, "character controller created");
        Ok(())
    }

    /// Sweep `desired` against the world and commit the resolved
    /// displacement. Returns the displacement actually applied.
    pub fn try_move_character_controller(
        &mut self,
        entity: EntityId,
        desired: Vec3,
    ) -> Result<Vec3, SimError> {
        let dt = self.integration_params.dt;
        let sweep = self.sweep(entity, to_vector(desired), dt)?;
        self.commit(sweep.body, sweep.translation);
        Ok(from_vector(&sweep.translation))
    }

    fn sweep(&self, entity: EntityId, desired: Vector<Real>, dt: Real) -> Result<Sweep, SimError> {
        let component = self.store.get(entity)?;
        let controller = component
            .characters
            .first()
            .ok_or(SimError::MissingCharacterController { entity })?;
        let body_handle = *component
            .bodies
            .first()
            .ok_or(SimError::MissingCharacterController { entity })?;
        let collider_handle = *component
            .colliders
            .first()
            .ok_or(SimError::MissingCollider { entity })?;

        let body = self
            .rigid_body_set
            .get(body_handle)
            .ok_or(SimError::MissingCharacterController { entity })?;
        let collider = self
            .collider_set
            .get(collider_handle)
            .ok_or(SimError::UnknownCollider {
                collider: collider_handle,
            })?;

        // Start from the body so a teleport since the last step is honoured.
        let shape_pos = match collider.position_wrt_parent() {
            Some(local) => body.position() * local,
            None => *body.position(),
        };

        let movement = controller.move_shape(
            dt,
            &self.rigid_body_set,
            &self.collider_set,
            &self.query_pipeline,
            collider.shape(),
            &shape_pos,
            desired,
            QueryFilter::default()
                .exclude_rigid_body(body_handle)
                .exclude_sensors(),
            |_| {},
        );

        Ok(Sweep {
            body: body_handle,
            translation: movement.translation,
            grounded: movement.grounded,
        })
    }

    fn commit(&mut self, body_handle: RigidBodyHandle, delta: Vector<Real>) {
        if let Some(body) = self.rigid_body_set.get_mut(body_handle) {
            let next = body.translation() + delta;
            body.set_next_kinematic_translation(next);
        }
    }

    // -- colliders ----------------------------------------------------------

    /// Add a box of full extents `size` centred at `position`. Sensor boxes
    /// only report overlaps and never block characters.
    pub fn add_box_collider(
        &mut self,
        entity: EntityId,
        size: Vec3,
        position: Vec3,
        rotation: Option<Quat>,
        sensor: bool,
    ) -> Result<ColliderHandle, SimError> {
        self.store.get(entity)?;

        let half = size * 0.5;
        let mut builder = ColliderBuilder::cuboid(half.x, half.y, half.z)
            .translation(to_vector(position))
            .sensor(sensor);
        if let Some(rotation) = rotation {
            builder = builder.rotation(to_rotation(rotation).scaled_axis());
        }
        self.attach_static(entity, builder.build())
    }

    /// Add a static triangle mesh whose vertices are offset by `position`.
    pub fn add_mesh_collider(
        &mut self,
        entity: EntityId,
        vertices: &[Vec3],
        indices: &[u32],
        position: Vec3,
        sensor: bool,
    ) -> Result<ColliderHandle, SimError> {
        self.store.get(entity)?;

        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(SimError::InvalidMesh {
                reason: format!("index count {} is not a positive multiple of 3", indices.len()),
            });
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(SimError::InvalidMesh {
                reason: format!("index {bad} out of range for {} vertices", vertices.len()),
            });
        }

        let points: Vec<Point<Real>> = vertices.iter().map(|v| to_point(*v)).collect();
        let triangles: Vec<[u32; 3]> = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();

        let collider = ColliderBuilder::trimesh(points, triangles)
            .translation(to_vector(position))
            .sensor(sensor)
            .build();
        self.attach_static(entity, collider)
    }

    /// Add one static mesh collider per mesh node under `root`, placed at the
    /// node's accumulated translation.
    pub fn add_colliders_from_object(
        &mut self,
        entity: EntityId,
        root: &SceneNode,
    ) -> Result<Vec<ColliderHandle>, SimError> {
        let mut meshes = Vec::new();
        root.traverse(|node, world| {
            if let Some(mesh) = &node.mesh {
                meshes.push((mesh.clone(), world));
            }
        });

        meshes
            .into_iter()
            .map(|(mesh, world)| self.add_mesh_collider(entity, &mesh.vertices, &mesh.indices, world, false))
            .collect()
    }

    fn attach_static(&mut self, entity: EntityId, collider: Collider) -> Result<ColliderHandle, SimError> {
        let handle = self.collider_set.insert(collider);
        self.store.get_mut(entity)?.colliders.push(handle);
        Ok(handle)
    }

    /// All colliders of `entity`, in insertion order.
    pub fn colliders(&self, entity: EntityId) -> Result<Vec<ColliderHandle>, SimError> {
        Ok(self.store.get(entity)?.colliders.clone())
    }

    /// The entity's sensor colliders, in insertion order.
    pub fn sensors(&self, entity: EntityId) -> Result<Vec<ColliderHandle>, SimError> {
        Ok(self
            .store
            .get(entity)?
            .colliders
            .iter()
            .copied()
            .filter(|h| self.collider_set.get(*h).is_some_and(|c| c.is_sensor()))
            .collect())
    }

    /// World-space centre of a collider.
    pub fn collider_position(&self, collider: ColliderHandle) -> Result<Vec3, SimError> {
        self.collider_set
            .get(collider)
            .map(|c| from_vector(c.translation()))
            .ok_or(SimError::UnknownCollider { collider })
    }

    /// Whether `target`'s primary collider, held where it is, overlaps the
    /// `sensor` collider owned by `entity`.
    ///
    /// A target without colliders overlaps nothing. An entity is never its
    /// own target.
    pub fn is_sensor_colliding_with_target(
        &self,
        entity: EntityId,
        sensor: ColliderHandle,
        target: EntityId,
    ) -> Result<bool, SimError> {
        let owner = self.store.get(entity)?;
        if !owner.colliders.contains(&sensor) {
            return Err(SimError::UnknownCollider { collider: sensor });
        }
        let sensor_collider = self
            .collider_set
            .get(sensor)
            .ok_or(SimError::UnknownCollider { collider: sensor })?;

        if target == entity {
            return Ok(false);
        }
        let Some(target_collider) = self
            .store
            .get(target)?
            .colliders
            .first()
            .and_then(|h| self.collider_set.get(*h))
        else {
            return Ok(false);
        };

        let result = rapier3d::parry::query::intersection_test(
            sensor_collider.position(),
            sensor_collider.shape(),
            target_collider.position(),
            target_collider.shape(),
        );
        Ok(overlap_or_warn(result, sensor, target))
    }
}

/// An unsupported shape pair counts as no overlap, but is reported.
fn overlap_or_warn(result: Result<bool, Unsupported>, sensor: ColliderHandle, target: EntityId) -> bool {
    match result {
        Ok(hit) => hit,
        Err(Unsupported) => {
            warn!(?sensor, %target, "overlap test unsupported for this shape pair; treating as no overlap");
            false
        }
    }
}

struct Sweep {
    body: RigidBodyHandle,
    translation: Vector<Real>,
    grounded: bool,
}

impl SimulationRepository for PhysicsRepository {
    fn create_component(&mut self, entity: EntityId) {
        self.store.insert(entity, PhysicsComponent::default());
    }

    /// Remove the component and everything it created in the world.
    fn remove_component(&mut self, entity: EntityId) {
        let Some(component) = self.store.remove(entity) else {
            return;
        };
        for handle in component.colliders {
            self.collider_set
                .remove(handle, &mut self.island_manager, &mut self.rigid_body_set, false);
        }
        for handle in component.bodies {
            self.rigid_body_set.remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
        }
        self.query_pipeline.update(&self.collider_set);
        debug!(entity = %entity, "physics component removed");
    }

    fn has_component(&self, entity: EntityId) -> bool {
        self.store.contains(entity)
    }

    fn entities(&self) -> Vec<EntityId> {
        self.store.ids().to_vec()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
