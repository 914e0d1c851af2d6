//! Headless stand-in physics engine
//!
//! Just enough world to drive the core without a real rigid-body solver:
//! dynamic circles fall straight down under gravity and come to rest on
//! solid boundaries or on circles beneath them. No lateral motion, no
//! bounce, no friction. Contacts are reported on the step where two shapes
//! first come within `CONTACT_SLOP` of each other.
//!
//! Iteration is in body-id order so runs are reproducible.

use std::collections::BTreeSet;

use glam::Vec2;

use super::physics::{BodyId, BodyMode, Boundary, ContactPair, PhysicsWorld};
use crate::tuning::Material;

/// Default downward acceleration (pixels/s²)
pub const SANDBOX_GRAVITY: f32 = 1000.0;
/// Shapes closer than this count as touching
pub const CONTACT_SLOP: f32 = 0.5;

#[derive(Debug, Clone)]
enum Shape {
    Circle { radius: f32, mode: BodyMode },
    Rect(Boundary),
}

#[derive(Debug, Clone)]
struct SandboxBody {
    id: BodyId,
    pos: Vec2,
    vel_y: f32,
    shape: Shape,
}

impl SandboxBody {
    fn is_falling(&self) -> bool {
        matches!(
            self.shape,
            Shape::Circle {
                mode: BodyMode::Dynamic,
                ..
            }
        )
    }
}

#[derive(Debug, Clone)]
pub struct SandboxWorld {
    gravity: f32,
    bodies: Vec<SandboxBody>,
    touching: BTreeSet<(BodyId, BodyId)>,
    next_id: u32,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self::with_gravity(SANDBOX_GRAVITY)
    }

    pub fn with_gravity(gravity: f32) -> Self {
        Self {
            gravity,
            bodies: Vec::new(),
            touching: BTreeSet::new(),
            next_id: 1,
        }
    }

    fn alloc_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id).ok()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of circular bodies (pieces) in the world
    pub fn circle_count(&self) -> usize {
        self.bodies
            .iter()
            .filter(|b| matches!(b.shape, Shape::Circle { .. }))
            .count()
    }

    pub fn radius(&self, id: BodyId) -> Option<f32> {
        let idx = self.index_of(id)?;
        match self.bodies[idx].shape {
            Shape::Circle { radius, .. } => Some(radius),
            Shape::Rect(_) => None,
        }
    }

    pub fn mode(&self, id: BodyId) -> Option<BodyMode> {
        let idx = self.index_of(id)?;
        match self.bodies[idx].shape {
            Shape::Circle { mode, .. } => Some(mode),
            Shape::Rect(_) => None,
        }
    }

    /// Lowest y a falling circle may occupy given what is beneath it
    fn rest_limit(&self, idx: usize) -> f32 {
        let body = &self.bodies[idx];
        let Shape::Circle { radius, .. } = body.shape else {
            return f32::INFINITY;
        };
        let mut limit = f32::INFINITY;

        for (j, other) in self.bodies.iter().enumerate() {
            if j == idx {
                continue;
            }
            match &other.shape {
                Shape::Rect(rect) => {
                    if rect.is_sensor() {
                        continue;
                    }
                    let (min, max) = (rect.min(), rect.max());
                    if body.pos.x >= min.x && body.pos.x <= max.x && min.y >= body.pos.y {
                        limit = limit.min(min.y - radius);
                    }
                }
                Shape::Circle { radius: r2, .. } => {
                    if other.pos.y <= body.pos.y {
                        continue;
                    }
                    let reach = radius + r2;
                    let dx = other.pos.x - body.pos.x;
                    if dx.abs() < reach {
                        limit = limit.min(other.pos.y - (reach * reach - dx * dx).sqrt());
                    }
                }
            }
        }
        limit
    }

    fn integrate(&mut self, dt: f32) {
        let mut order: Vec<usize> = (0..self.bodies.len())
            .filter(|&i| self.bodies[i].is_falling())
            .collect();
        // Lowest bodies settle first so stacks resolve bottom-up
        order.sort_by(|&a, &b| {
            self.bodies[b]
                .pos
                .y
                .partial_cmp(&self.bodies[a].pos.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(self.bodies[a].id.cmp(&self.bodies[b].id))
        });

        for idx in order {
            let limit = self.rest_limit(idx);
            let body = &mut self.bodies[idx];
            body.vel_y += self.gravity * dt;
            let target = body.pos.y + body.vel_y * dt;
            if target >= limit {
                body.pos.y = limit;
                body.vel_y = 0.0;
            } else {
                body.pos.y = target;
            }
        }
    }

    fn shapes_touch(a: &SandboxBody, b: &SandboxBody) -> bool {
        match (&a.shape, &b.shape) {
            (Shape::Circle { radius: ra, .. }, Shape::Circle { radius: rb, .. }) => {
                a.pos.distance(b.pos) <= ra + rb + CONTACT_SLOP
            }
            (Shape::Circle { radius, .. }, Shape::Rect(rect))
            | (Shape::Rect(rect), Shape::Circle { radius, .. }) => {
                let center = if matches!(a.shape, Shape::Circle { .. }) {
                    a.pos
                } else {
                    b.pos
                };
                let closest = center.clamp(rect.min(), rect.max());
                center.distance(closest) <= radius + CONTACT_SLOP
            }
            (Shape::Rect(_), Shape::Rect(_)) => false,
        }
    }

    fn detect_contacts(&self) -> BTreeSet<(BodyId, BodyId)> {
        let mut current = BTreeSet::new();
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                if Self::shapes_touch(a, b) {
                    current.insert((a.id, b.id));
                }
            }
        }
        current
    }
}

impl PhysicsWorld for SandboxWorld {
    fn add_boundary(&mut self, boundary: Boundary) -> BodyId {
        let id = self.alloc_id();
        self.bodies.push(SandboxBody {
            id,
            pos: boundary.center,
            vel_y: 0.0,
            shape: Shape::Rect(boundary),
        });
        id
    }

    fn add_circle(&mut self, pos: Vec2, radius: f32, _material: Material, mode: BodyMode) -> BodyId {
        let id = self.alloc_id();
        self.bodies.push(SandboxBody {
            id,
            pos,
            vel_y: 0.0,
            shape: Shape::Circle { radius, mode },
        });
        id
    }

    fn set_mode(&mut self, id: BodyId, mode: BodyMode) {
        let Some(idx) = self.index_of(id) else { return };
        let body = &mut self.bodies[idx];
        if let Shape::Circle { mode: current, .. } = &mut body.shape {
            *current = mode;
            body.vel_y = 0.0;
        }
    }

    fn set_position(&mut self, id: BodyId, pos: Vec2) {
        if let Some(idx) = self.index_of(id) {
            self.bodies[idx].pos = pos;
        }
    }

    fn position(&self, id: BodyId) -> Option<Vec2> {
        self.index_of(id).map(|idx| self.bodies[idx].pos)
    }

    fn remove(&mut self, id: BodyId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.bodies.remove(idx);
        self.touching.retain(|&(a, b)| a != id && b != id);
        true
    }

    fn step(&mut self, dt: f32) -> Vec<ContactPair> {
        self.integrate(dt);
        let current = self.detect_contacts();
        let began = current
            .difference(&self.touching)
            .map(|&(a, b)| ContactPair::new(a, b))
            .collect();
        self.touching = current;
        began
    }

    fn touching(&self, id: BodyId) -> Vec<ContactPair> {
        self.touching
            .iter()
            .map(|&(a, b)| ContactPair::new(a, b))
            .filter(|pair| pair.involves(id))
            .collect()
    }
}
