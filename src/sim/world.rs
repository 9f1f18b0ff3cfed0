//! Boundary to the rigid-body engine
//!
//! The game never integrates physics itself. It adds and removes bodies through
//! [`PhysicsWorld`], reads their position/velocity back, and starts or stops the
//! engine's step runner. Collision-start batches are pushed into the session by
//! whoever owns the engine loop.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::tiers::Tier;

/// Engine-assigned body identity. Stable for the body's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Static boundary geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaticShape {
    /// Axis-aligned rectangle
    Rect { center: Vec2, size: Vec2 },
}

/// Contact material overrides; `None` on a spawn means engine defaults
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
}

/// Everything the engine needs to create a monster body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceSpawn {
    pub position: Vec2,
    pub radius: f32,
    pub tier: Tier,
    pub material: Option<Material>,
}

/// Snapshot of a body read back from the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub is_static: bool,
}

/// Two bodies whose contact started during the last step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl CollisionPair {
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        Self { a, b }
    }
}

/// Capabilities the game needs from a physics engine
pub trait PhysicsWorld {
    /// Add immovable boundary geometry
    fn add_static(&mut self, shape: StaticShape) -> BodyHandle;

    /// Add a dynamic circular monster body
    fn add_piece(&mut self, spawn: PieceSpawn) -> BodyHandle;

    /// Remove bodies; unknown handles are ignored
    fn remove_bodies(&mut self, handles: &[BodyHandle]);

    /// Current state of a body, `None` once removed
    fn body(&self, handle: BodyHandle) -> Option<BodyState>;

    /// Start stepping
    fn start(&mut self);

    /// Stop stepping (bodies stay where they are)
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// A body stored by [`MemoryWorld`]
#[derive(Debug, Clone)]
pub struct MemoryBody {
    pub state: BodyState,
    pub radius: f32,
    pub tier: Option<Tier>,
    pub material: Option<Material>,
}

/// In-memory world without dynamics
///
/// Bodies stay wherever they were spawned or last placed with
/// [`MemoryWorld::place`]. Used for headless sessions and tests, where the
/// caller scripts motion and collisions.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    bodies: BTreeMap<BodyHandle, MemoryBody>,
    next_id: u32,
    running: bool,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, body: MemoryBody) -> BodyHandle {
        self.next_id += 1;
        let handle = BodyHandle(self.next_id);
        self.bodies.insert(handle, body);
        handle
    }

    /// Move a body and set its velocity; returns false for unknown handles
    pub fn place(&mut self, handle: BodyHandle, position: Vec2, velocity: Vec2) -> bool {
        match self.bodies.get_mut(&handle) {
            Some(body) => {
                body.state.position = position;
                body.state.velocity = velocity;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&MemoryBody> {
        self.bodies.get(&handle)
    }

    /// Dynamic bodies, ordered by handle
    pub fn pieces(&self) -> impl Iterator<Item = (BodyHandle, &MemoryBody)> {
        self.bodies
            .iter()
            .filter(|(_, b)| !b.state.is_static)
            .map(|(h, b)| (*h, b))
    }

    pub fn piece_count(&self) -> usize {
        self.pieces().count()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

impl PhysicsWorld for MemoryWorld {
    fn add_static(&mut self, shape: StaticShape) -> BodyHandle {
        let StaticShape::Rect { center, size } = shape;
        self.insert(MemoryBody {
            state: BodyState {
                position: center,
                velocity: Vec2::ZERO,
                is_static: true,
            },
            radius: size.max_element() / 2.0,
            tier: None,
            material: None,
        })
    }

    fn add_piece(&mut self, spawn: PieceSpawn) -> BodyHandle {
        self.insert(MemoryBody {
            state: BodyState {
                position: spawn.position,
                velocity: Vec2::ZERO,
                is_static: false,
            },
            radius: spawn.radius,
            tier: Some(spawn.tier),
            material: spawn.material,
        })
    }

    fn remove_bodies(&mut self, handles: &[BodyHandle]) {
        for handle in handles {
            self.bodies.remove(handle);
        }
    }

    fn body(&self, handle: BodyHandle) -> Option<BodyState> {
        self.bodies.get(&handle).map(|b| b.state)
    }

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_world_lifecycle() {
        let mut world = MemoryWorld::new();
        let wall = world.add_static(StaticShape::Rect {
            center: Vec2::new(200.0, 630.0),
            size: Vec2::new(400.0, 60.0),
        });
        let piece = world.add_piece(PieceSpawn {
            position: Vec2::new(100.0, 0.0),
            radius: 15.0,
            tier: Tier::FIRST,
            material: None,
        });
        assert_ne!(wall, piece);
        assert_eq!(world.piece_count(), 1);
        assert!(world.body(wall).unwrap().is_static);

        assert!(world.place(piece, Vec2::new(100.0, 300.0), Vec2::new(0.0, 2.0)));
        assert_eq!(world.body(piece).unwrap().velocity.y, 2.0);

        world.remove_bodies(&[piece, BodyHandle(999)]);
        assert!(world.body(piece).is_none());
        assert!(!world.place(piece, Vec2::ZERO, Vec2::ZERO));
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_runner_flag() {
        let mut world = MemoryWorld::new();
        assert!(!world.is_running());
        world.start();
        assert!(world.is_running());
        world.stop();
        assert!(!world.is_running());
    }
}
