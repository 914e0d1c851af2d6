//! Collision classification
//!
//! Turns the engine's raw "began touching" pairs into domain events. Only
//! two kinds matter: a settled piece reaching the ceiling sensor, and two
//! released pieces of the same tier touching. Everything else is noise.

use super::physics::{BodyId, ContactPair};
use super::registry::PieceRegistry;
use super::tier::TierTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEvent {
    /// A piece outside its spawn grace touched the ceiling sensor
    Loss { piece: BodyId },
    /// Two released pieces of equal tier touched
    MergeCandidate { a: BodyId, b: BodyId },
}

/// Classify one tick's contact pairs, preserving arrival order
pub fn classify(
    pairs: &[ContactPair],
    registry: &PieceRegistry,
    tiers: &TierTable,
    ceiling: BodyId,
) -> Vec<CollisionEvent> {
    pairs
        .iter()
        .filter_map(|pair| classify_pair(pair, registry, tiers, ceiling))
        .collect()
}

fn classify_pair(
    pair: &ContactPair,
    registry: &PieceRegistry,
    tiers: &TierTable,
    ceiling: BodyId,
) -> Option<CollisionEvent> {
    if let Some(other) = pair.other(ceiling) {
        // Bodies without metadata are walls, the floor, or already consumed
        let meta = registry.meta(other)?;
        if meta.spawn_grace || meta.held {
            return None;
        }
        return Some(CollisionEvent::Loss { piece: other });
    }

    let meta_a = registry.meta(pair.a)?;
    let meta_b = registry.meta(pair.b)?;
    if meta_a.held || meta_b.held {
        return None;
    }
    if meta_a.tier == meta_b.tier && tiers.is_valid(meta_a.tier) {
        return Some(CollisionEvent::MergeCandidate {
            a: pair.a,
            b: pair.b,
        });
    }
    None
}
