//! Minimal scene-graph description consumed for collider extraction.
//!
//! The rendering library owns the real scene graph. Level loaders convert the
//! parts the simulation cares about (node translations and triangle meshes)
//! into a [`SceneNode`] tree and hand it to
//! [`PhysicsRepository::add_colliders_from_object`](crate::physics::PhysicsRepository::add_colliders_from_object).

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Indexed triangle mesh in the node's local space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,
    /// Flat triangle list; length must be a multiple of three.
    pub indices: Vec<u32>,
}

/// One node of a scene hierarchy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    /// Offset relative to the parent node.
    pub translation: Vec3,
    pub mesh: Option<MeshData>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshData) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first walk yielding each node with its accumulated world
    /// translation.
    pub fn traverse(&self, mut visit: impl FnMut(&SceneNode, Vec3)) {
        fn walk(node: &SceneNode, origin: Vec3, visit: &mut dyn FnMut(&SceneNode, Vec3)) {
            let world = origin + node.translation;
            visit(node, world);
            for child in &node.children {
                walk(child, world, visit);
            }
        }
        walk(self, Vec3::ZERO, &mut visit);
    }

    /// First node in depth-first order with the given name.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}

impl MeshData {
    /// Axis-aligned box of the given full size centred on the origin.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        let vertices = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // back
            4, 5, 6, 4, 6, 7, // front
            0, 1, 5, 0, 5, 4, // bottom
            3, 7, 6, 3, 6, 2, // top
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        Self { vertices, indices }
    }
}
