//! Merge resolution
//!
//! Two live, equal-tier pieces fuse into one piece of the next tier at their
//! midpoint. Fusing into the terminal tier pays a bonus and produces nothing.
//! Every precondition failure is a silent no-op: the engine may keep
//! reporting contacts for bodies that were consumed earlier in the tick.

use std::time::Duration;

use glam::Vec2;

use super::physics::{BodyId, PhysicsWorld};
use super::registry::{Piece, PieceRegistry, SpawnKind};
use super::state::Progress;
use super::tier::TierTable;

/// Why a merge request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SamePiece,
    NotLive(BodyId),
    CoolingDown(BodyId),
    Held(BodyId),
    TierMismatch { a: usize, b: usize },
    /// Two terminal pieces touching; cannot happen while the terminal tier
    /// is never materialised
    TerminalPair,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// A new piece of the next tier now exists
    Merged {
        consumed: [BodyId; 2],
        piece: Piece,
        awarded: u64,
    },
    /// The pair fused into the terminal tier and left the board
    Terminal {
        consumed: [BodyId; 2],
        pos: Vec2,
        awarded: u64,
    },
    Skipped(SkipReason),
}

impl MergeOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, MergeOutcome::Skipped(_))
    }
}

#[derive(Debug, Clone)]
pub struct MergeResolver {
    terminal_bonus_multiplier: u64,
}

impl MergeResolver {
    pub fn new(terminal_bonus_multiplier: u64) -> Self {
        Self {
            terminal_bonus_multiplier,
        }
    }

    pub fn resolve<W: PhysicsWorld + ?Sized>(
        &self,
        world: &mut W,
        registry: &mut PieceRegistry,
        tiers: &TierTable,
        progress: &mut Progress,
        a: BodyId,
        b: BodyId,
        now: Duration,
    ) -> MergeOutcome {
        let (tier, pos_a, pos_b) = match check_pair(world, registry, tiers, a, b, now) {
            Ok(found) => found,
            Err(reason) => {
                log::debug!("Merge {} + {} skipped: {:?}", a, b, reason);
                return MergeOutcome::Skipped(reason);
            }
        };

        registry.mark_cooldown(a, now);
        registry.mark_cooldown(b, now);
        registry.remove(world, a);
        registry.remove(world, b);

        let mid = (pos_a + pos_b) * 0.5;
        let next = tier + 1;

        let base = match tiers.tier_at(next) {
            Ok(t) => t.score_value,
            Err(err) => {
                log::error!("Merge of tier {} has no successor ({}); paying own value", tier, err);
                tiers.tier_at(tier).map(|t| t.score_value).unwrap_or(0)
            }
        };
        let mut awarded = base;
        progress.highest_tier = progress.highest_tier.max(next);

        if tiers.is_terminal(next) {
            awarded += base * self.terminal_bonus_multiplier;
            progress.score += awarded;
            log::info!(
                "Terminal tier {} reached at ({:.1}, {:.1}), +{}",
                tiers.display_name(next),
                mid.x,
                mid.y,
                awarded
            );
            return MergeOutcome::Terminal {
                consumed: [a, b],
                pos: mid,
                awarded,
            };
        }

        progress.score += awarded;
        let piece = registry.spawn(world, tiers, next, mid, SpawnKind::Merged);
        log::debug!("Merged {} + {} into {} (tier {}), +{}", a, b, piece.id, next, awarded);
        MergeOutcome::Merged {
            consumed: [a, b],
            piece,
            awarded,
        }
    }
}

/// Validate a merge request; on success returns the shared tier and both
/// positions read before anything is removed.
fn check_pair<W: PhysicsWorld + ?Sized>(
    world: &W,
    registry: &mut PieceRegistry,
    tiers: &TierTable,
    a: BodyId,
    b: BodyId,
    now: Duration,
) -> Result<(usize, Vec2, Vec2), SkipReason> {
    if a == b {
        return Err(SkipReason::SamePiece);
    }
    for id in [a, b] {
        if registry.is_cooling_down(id, now) {
            return Err(SkipReason::CoolingDown(id));
        }
    }
    let meta_a = *registry.meta(a).ok_or(SkipReason::NotLive(a))?;
    let meta_b = *registry.meta(b).ok_or(SkipReason::NotLive(b))?;
    for (id, meta) in [(a, meta_a), (b, meta_b)] {
        if meta.held {
            return Err(SkipReason::Held(id));
        }
    }
    if meta_a.tier != meta_b.tier {
        return Err(SkipReason::TierMismatch {
            a: meta_a.tier,
            b: meta_b.tier,
        });
    }
    if meta_a.tier >= tiers.terminal_index() {
        log::error!("Terminal-tier pieces {} and {} collided; the terminal tier should never exist on the board", a, b);
        debug_assert!(false, "terminal tier pieces must never be on the board");
        return Err(SkipReason::TerminalPair);
    }
    let pos_a = world.position(a).ok_or(SkipReason::NotLive(a))?;
    let pos_b = world.position(b).ok_or(SkipReason::NotLive(b))?;
    Ok((meta_a.tier, pos_a, pos_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sandbox::SandboxWorld;
    use crate::tuning::Tuning;

    struct Fixture {
        world: SandboxWorld,
        registry: PieceRegistry,
        tiers: TierTable,
        progress: Progress,
        resolver: MergeResolver,
    }

    impl Fixture {
        fn new() -> Self {
            let tuning = Tuning::default();
            Self {
                world: SandboxWorld::new(),
                registry: PieceRegistry::new(tuning.timing.merge_cooldown(), tuning.piece_material),
                tiers: TierTable::from_defs(&tuning.tiers),
                progress: Progress::default(),
                resolver: MergeResolver::new(tuning.terminal_bonus_multiplier),
            }
        }

        fn piece(&mut self, tier: usize, x: f32, y: f32) -> BodyId {
            self.registry
                .spawn(&mut self.world, &self.tiers, tier, Vec2::new(x, y), SpawnKind::Merged)
                .id
        }

        fn resolve(&mut self, a: BodyId, b: BodyId, now_ms: u64) -> MergeOutcome {
            self.resolver.resolve(
                &mut self.world,
                &mut self.registry,
                &self.tiers,
                &mut self.progress,
                a,
                b,
                Duration::from_millis(now_ms),
            )
        }
    }

    #[test]
    fn test_merge_tier_zero_into_one() {
        let mut fx = Fixture::new();
        let a = fx.piece(0, 100.0, 500.0);
        let b = fx.piece(0, 120.0, 520.0);

        let outcome = fx.resolve(a, b, 0);
        let MergeOutcome::Merged { piece, awarded, consumed } = outcome else {
            panic!("expected a merge, got {:?}", outcome);
        };
        assert_eq!(consumed, [a, b]);
        assert_eq!(piece.tier, 1);
        assert_eq!(piece.pos, Vec2::new(110.0, 510.0));
        assert!(!piece.spawn_grace);
        assert_eq!(awarded, 3);
        assert_eq!(fx.progress.score, 3);
        assert_eq!(fx.progress.highest_tier, 1);
        assert!(!fx.registry.is_live(a));
        assert!(!fx.registry.is_live(b));
        assert_eq!(fx.registry.len(), 1);
        assert_eq!(fx.world.circle_count(), 1);
    }

    #[test]
    fn test_every_tier_awards_successor_value() {
        for tier in 0..6 {
            let mut fx = Fixture::new();
            let a = fx.piece(tier, 100.0, 300.0);
            let b = fx.piece(tier, 140.0, 300.0);
            let outcome = fx.resolve(a, b, 0);
            assert!(matches!(outcome, MergeOutcome::Merged { .. }));
            let expected = fx.tiers.tier_at(tier + 1).unwrap().score_value;
            assert_eq!(fx.progress.score, expected);
        }
    }

    #[test]
    fn test_merge_into_terminal_tier() {
        let mut fx = Fixture::new();
        let a = fx.piece(6, 100.0, 300.0);
        let b = fx.piece(6, 180.0, 300.0);

        let outcome = fx.resolve(a, b, 0);
        assert_eq!(
            outcome,
            MergeOutcome::Terminal {
                consumed: [a, b],
                pos: Vec2::new(140.0, 300.0),
                awarded: 400,
            }
        );
        assert_eq!(fx.progress.score, 100 + 3 * 100);
        assert_eq!(fx.progress.highest_tier, 7);
        assert!(fx.registry.is_empty());
        assert_eq!(fx.world.circle_count(), 0);
    }

    #[test]
    fn test_second_resolution_is_noop() {
        let mut fx = Fixture::new();
        let a = fx.piece(0, 100.0, 500.0);
        let b = fx.piece(0, 130.0, 500.0);

        assert!(!fx.resolve(a, b, 0).is_skipped());
        let again = fx.resolve(a, b, 20);
        assert_eq!(again, MergeOutcome::Skipped(SkipReason::CoolingDown(a)));
        let reversed = fx.resolve(b, a, 40);
        assert!(reversed.is_skipped());
        assert_eq!(fx.progress.score, 3);
        assert_eq!(fx.registry.len(), 1);
    }

    #[test]
    fn test_consumed_piece_with_fresh_neighbour() {
        // A touches both B and C in one tick: only the first pairing resolves
        let mut fx = Fixture::new();
        let a = fx.piece(0, 100.0, 500.0);
        let b = fx.piece(0, 130.0, 500.0);
        let c = fx.piece(0, 70.0, 500.0);

        assert!(!fx.resolve(a, b, 0).is_skipped());
        assert_eq!(fx.resolve(a, c, 0), MergeOutcome::Skipped(SkipReason::CoolingDown(a)));
        assert!(fx.registry.is_live(c));
        assert_eq!(fx.progress.score, 3);
    }

    #[test]
    fn test_removed_piece_after_cooldown_is_not_live() {
        let mut fx = Fixture::new();
        let a = fx.piece(0, 100.0, 500.0);
        let b = fx.piece(0, 130.0, 500.0);
        let c = fx.piece(0, 70.0, 500.0);
        fx.resolve(a, b, 0);
        assert_eq!(fx.resolve(a, c, 500), MergeOutcome::Skipped(SkipReason::NotLive(a)));
    }

    #[test]
    fn test_tier_mismatch_is_noop() {
        let mut fx = Fixture::new();
        let a = fx.piece(0, 100.0, 500.0);
        let b = fx.piece(1, 130.0, 500.0);
        assert_eq!(
            fx.resolve(a, b, 0),
            MergeOutcome::Skipped(SkipReason::TierMismatch { a: 0, b: 1 })
        );
        assert_eq!(fx.registry.len(), 2);
        assert_eq!(fx.progress.score, 0);
    }

    #[test]
    fn test_held_piece_does_not_merge() {
        let mut fx = Fixture::new();
        let a = fx.piece(0, 100.0, 500.0);
        let held = fx
            .registry
            .spawn(&mut fx.world, &fx.tiers, 0, Vec2::new(100.0, 40.0), SpawnKind::Falling)
            .id;
        assert_eq!(fx.resolve(a, held, 0), MergeOutcome::Skipped(SkipReason::Held(held)));
    }

    #[test]
    fn test_self_pair_is_noop() {
        let mut fx = Fixture::new();
        let a = fx.piece(0, 100.0, 500.0);
        assert_eq!(fx.resolve(a, a, 0), MergeOutcome::Skipped(SkipReason::SamePiece));
    }
}
