//! Live piece bookkeeping
//!
//! The physics engine owns identity and position; this registry owns the
//! side-channel metadata per body (tier, spawn grace, held) and the merge
//! cooldown map. Cooldown entries are timestamped and swept on access.

use std::collections::BTreeMap;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::{BodyId, BodyMode, PhysicsWorld};
use super::tier::TierTable;
use crate::tuning::Material;

/// Core-owned metadata for one piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceMeta {
    pub tier: usize,
    /// Exempt from the loss check until cleared
    pub spawn_grace: bool,
    /// Under player control, not yet released
    pub held: bool,
}

/// A live piece as seen by the core
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Piece {
    pub id: BodyId,
    pub tier: usize,
    pub pos: Vec2,
    pub spawn_grace: bool,
}

/// How a new piece enters the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    /// New falling piece at the top, held by the player and in spawn grace
    Falling,
    /// Product of a merge, free from the start
    Merged,
}

#[derive(Debug, Clone)]
pub struct PieceRegistry {
    pieces: BTreeMap<BodyId, PieceMeta>,
    cooldowns: BTreeMap<BodyId, Duration>,
    cooldown: Duration,
    material: Material,
}

impl PieceRegistry {
    pub fn new(cooldown: Duration, material: Material) -> Self {
        Self {
            pieces: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
            cooldown,
            material,
        }
    }

    /// Create a body for a new piece and start tracking it
    pub fn spawn<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        tiers: &TierTable,
        tier: usize,
        pos: Vec2,
        kind: SpawnKind,
    ) -> Piece {
        let (mode, spawn_grace, held) = match kind {
            SpawnKind::Falling => (BodyMode::Held, true, true),
            SpawnKind::Merged => (BodyMode::Dynamic, false, false),
        };
        let id = world.add_circle(pos, tiers.radius_of(tier), self.material, mode);
        self.pieces.insert(
            id,
            PieceMeta {
                tier,
                spawn_grace,
                held,
            },
        );
        log::debug!("Spawned {} tier {} at ({:.1}, {:.1})", id, tier, pos.x, pos.y);
        Piece {
            id,
            tier,
            pos,
            spawn_grace,
        }
    }

    /// Detach a piece from the world. Idempotent.
    pub fn remove<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, id: BodyId) -> bool {
        let tracked = self.pieces.remove(&id).is_some();
        let in_world = world.remove(id);
        tracked || in_world
    }

    /// Remove every tracked piece and forget all cooldowns
    pub fn clear<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        for id in std::mem::take(&mut self.pieces).into_keys() {
            world.remove(id);
        }
        self.cooldowns.clear();
    }

    pub fn meta(&self, id: BodyId) -> Option<&PieceMeta> {
        self.pieces.get(&id)
    }

    pub fn is_live(&self, id: BodyId) -> bool {
        self.pieces.contains_key(&id)
    }

    /// Snapshot of a live piece with its engine position
    pub fn piece<W: PhysicsWorld + ?Sized>(&self, world: &W, id: BodyId) -> Option<Piece> {
        let meta = self.pieces.get(&id)?;
        let pos = world.position(id)?;
        Some(Piece {
            id,
            tier: meta.tier,
            pos,
            spawn_grace: meta.spawn_grace,
        })
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.pieces.keys().copied()
    }

    /// End the spawn grace window. No-op for pieces already gone.
    pub fn clear_spawn_grace(&mut self, id: BodyId) {
        if let Some(meta) = self.pieces.get_mut(&id) {
            meta.spawn_grace = false;
        }
    }

    /// Hand a held piece over to the simulation
    pub fn release<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, id: BodyId) -> bool {
        match self.pieces.get_mut(&id) {
            Some(meta) if meta.held => {
                meta.held = false;
                world.set_mode(id, BodyMode::Dynamic);
                true
            }
            _ => false,
        }
    }

    pub fn mark_cooldown(&mut self, id: BodyId, now: Duration) {
        self.cooldowns.insert(id, now);
    }

    /// Whether `id` was consumed by a merge less than the cooldown ago
    pub fn is_cooling_down(&mut self, id: BodyId, now: Duration) -> bool {
        self.sweep_cooldowns(now);
        self.cooldowns.contains_key(&id)
    }

    /// Drop cooldown entries whose window has elapsed
    pub fn sweep_cooldowns(&mut self, now: Duration) {
        let window = self.cooldown;
        self.cooldowns
            .retain(|_, inserted| now.saturating_sub(*inserted) < window);
    }

    pub fn cooldown_len(&self) -> usize {
        self.cooldowns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sandbox::SandboxWorld;
    use crate::tuning::Tuning;

    fn setup() -> (SandboxWorld, PieceRegistry, TierTable) {
        let tuning = Tuning::default();
        (
            SandboxWorld::new(),
            PieceRegistry::new(tuning.timing.merge_cooldown(), tuning.piece_material),
            TierTable::from_defs(&tuning.tiers),
        )
    }

    #[test]
    fn test_falling_spawn_is_held_with_grace() {
        let (mut world, mut reg, tiers) = setup();
        let piece = reg.spawn(&mut world, &tiers, 2, Vec2::new(100.0, 40.0), SpawnKind::Falling);
        assert!(piece.spawn_grace);
        let meta = reg.meta(piece.id).unwrap();
        assert_eq!(meta.tier, 2);
        assert!(meta.held);
        assert_eq!(world.radius(piece.id), Some(24.0));
        assert_eq!(world.mode(piece.id), Some(BodyMode::Held));

        reg.clear_spawn_grace(piece.id);
        assert!(!reg.meta(piece.id).unwrap().spawn_grace);
    }

    #[test]
    fn test_merged_spawn_is_free() {
        let (mut world, mut reg, tiers) = setup();
        let piece = reg.spawn(&mut world, &tiers, 1, Vec2::new(100.0, 300.0), SpawnKind::Merged);
        assert!(!piece.spawn_grace);
        assert!(!reg.meta(piece.id).unwrap().held);
        assert_eq!(world.mode(piece.id), Some(BodyMode::Dynamic));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (mut world, mut reg, tiers) = setup();
        let piece = reg.spawn(&mut world, &tiers, 0, Vec2::new(50.0, 50.0), SpawnKind::Merged);
        assert!(reg.remove(&mut world, piece.id));
        assert!(!reg.remove(&mut world, piece.id));
        assert!(!reg.is_live(piece.id));
        assert_eq!(world.circle_count(), 0);
    }

    #[test]
    fn test_release_only_once() {
        let (mut world, mut reg, tiers) = setup();
        let piece = reg.spawn(&mut world, &tiers, 0, Vec2::new(50.0, 40.0), SpawnKind::Falling);
        assert!(reg.release(&mut world, piece.id));
        assert!(!reg.release(&mut world, piece.id));
        assert_eq!(world.mode(piece.id), Some(BodyMode::Dynamic));
    }

    #[test]
    fn test_cooldown_expires_after_window() {
        let (_, mut reg, _) = setup();
        let id = BodyId(9);
        let t0 = Duration::from_millis(1000);
        reg.mark_cooldown(id, t0);
        assert!(reg.is_cooling_down(id, t0));
        assert!(reg.is_cooling_down(id, t0 + Duration::from_millis(149)));
        assert!(!reg.is_cooling_down(id, t0 + Duration::from_millis(150)));
        assert_eq!(reg.cooldown_len(), 0);
    }

    #[test]
    fn test_cooldown_outlives_removal() {
        let (mut world, mut reg, tiers) = setup();
        let piece = reg.spawn(&mut world, &tiers, 0, Vec2::new(50.0, 50.0), SpawnKind::Merged);
        let now = Duration::from_millis(10);
        reg.mark_cooldown(piece.id, now);
        reg.remove(&mut world, piece.id);
        assert!(reg.is_cooling_down(piece.id, now));
    }

    #[test]
    fn test_clear_removes_everything() {
        let (mut world, mut reg, tiers) = setup();
        for x in [40.0, 80.0, 120.0] {
            reg.spawn(&mut world, &tiers, 0, Vec2::new(x, 300.0), SpawnKind::Merged);
        }
        reg.mark_cooldown(BodyId(1), Duration::ZERO);
        reg.clear(&mut world);
        assert!(reg.is_empty());
        assert_eq!(reg.cooldown_len(), 0);
        assert_eq!(world.circle_count(), 0);
    }
}
