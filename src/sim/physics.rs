//! Boundary between the merge core and a rigid-body engine
//!
//! The engine owns body identity, position and velocity. The core only
//! creates, moves (while held), releases and removes bodies, and consumes
//! the list of pairs that began touching on each step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::Material;

/// Engine-assigned body handle, stable for the body's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a dynamic body is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyMode {
    /// Positioned by the player; ignores gravity
    Held,
    /// Free body subject to the simulation
    Dynamic,
}

/// Static board geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryKind {
    Floor,
    LeftWall,
    RightWall,
    /// Non-solid trigger line; reports contacts but never blocks
    CeilingSensor,
}

/// An axis-aligned static rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub kind: BoundaryKind,
    pub center: Vec2,
    pub size: Vec2,
    pub material: Material,
}

impl Boundary {
    pub fn is_sensor(&self) -> bool {
        self.kind == BoundaryKind::CeilingSensor
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.size * 0.5
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.size * 0.5
    }
}

/// Two bodies that began touching during a step. Order is arbitrary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactPair {
    pub a: BodyId,
    pub b: BodyId,
}

impl ContactPair {
    pub fn new(a: BodyId, b: BodyId) -> Self {
        Self { a, b }
    }

    /// Whether `id` is one side of the pair
    pub fn involves(&self, id: BodyId) -> bool {
        self.a == id || self.b == id
    }

    /// The side that is not `id`
    pub fn other(&self, id: BodyId) -> Option<BodyId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// The operations the core needs from a 2D physics engine.
pub trait PhysicsWorld {
    /// Register static board geometry
    fn add_boundary(&mut self, boundary: Boundary) -> BodyId;

    /// Create a circular body
    fn add_circle(&mut self, pos: Vec2, radius: f32, material: Material, mode: BodyMode) -> BodyId;

    /// Switch a body between player control and free simulation
    fn set_mode(&mut self, id: BodyId, mode: BodyMode);

    /// Teleport a body (used for held pieces)
    fn set_position(&mut self, id: BodyId, pos: Vec2);

    fn position(&self, id: BodyId) -> Option<Vec2>;

    /// Remove a body. Returns false if it was already gone.
    fn remove(&mut self, id: BodyId) -> bool;

    /// Advance the simulation and report pairs that began touching
    fn step(&mut self, dt: f32) -> Vec<ContactPair>;

    /// Pairs involving `id` that are touching right now
    fn touching(&self, id: BodyId) -> Vec<ContactPair>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_pair_other() {
        let pair = ContactPair::new(BodyId(1), BodyId(2));
        assert!(pair.involves(BodyId(2)));
        assert_eq!(pair.other(BodyId(1)), Some(BodyId(2)));
        assert_eq!(pair.other(BodyId(2)), Some(BodyId(1)));
        assert_eq!(pair.other(BodyId(3)), None);
    }

    #[test]
    fn test_boundary_extents() {
        let b = Boundary {
            kind: BoundaryKind::Floor,
            center: Vec2::new(180.0, 600.0),
            size: Vec2::new(440.0, 40.0),
            material: Material::FLOOR,
        };
        assert_eq!(b.min(), Vec2::new(-40.0, 580.0));
        assert_eq!(b.max(), Vec2::new(400.0, 620.0));
        assert!(!b.is_sensor());
    }
}
