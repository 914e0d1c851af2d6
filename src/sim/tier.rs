//! The fixed evolution ladder
//!
//! Tiers are totally ordered by index; the last one is terminal and has no
//! successor. The table never changes after construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tuning::TierDef;

/// Tier lookups outside the table. Unreachable while the simulation's own
/// invariants hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TierError {
    #[error("tier index {index} out of range (table has {count} tiers)")]
    OutOfRange { index: usize, count: usize },
}

/// One immutable rung of the ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub index: usize,
    pub radius: f32,
    /// Awarded when two pieces of the previous tier produce this one
    pub score_value: u64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    /// Build from tuning data. Callers validate tuning first, so `defs` has
    /// at least two entries.
    pub fn from_defs(defs: &[TierDef]) -> Self {
        debug_assert!(defs.len() >= 2, "tier table needs a terminal tier and a predecessor");
        let tiers = defs
            .iter()
            .enumerate()
            .map(|(index, def)| Tier {
                index,
                radius: def.radius,
                score_value: def.score,
                name: def.name.clone(),
                color: def.color.clone(),
            })
            .collect();
        Self { tiers }
    }

    #[inline]
    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// Index of the absorbing top tier
    #[inline]
    pub fn terminal_index(&self) -> usize {
        self.tiers.len() - 1
    }

    #[inline]
    pub fn is_terminal(&self, index: usize) -> bool {
        index == self.terminal_index()
    }

    #[inline]
    pub fn is_valid(&self, index: usize) -> bool {
        index < self.tiers.len()
    }

    pub fn tier_at(&self, index: usize) -> Result<&Tier, TierError> {
        self.tiers.get(index).ok_or(TierError::OutOfRange {
            index,
            count: self.tiers.len(),
        })
    }

    /// Radius for a tier, clamped into the table
    pub fn radius_of(&self, index: usize) -> f32 {
        self.clamped(index).radius
    }

    /// Display name for presentation. Out-of-range indices clamp instead of
    /// failing so a HUD can never take the session down.
    pub fn display_name(&self, index: usize) -> &str {
        &self.clamped(index).name
    }

    fn clamped(&self, index: usize) -> &Tier {
        match self.tiers.get(index) {
            Some(tier) => tier,
            None => {
                log::warn!("Tier {} out of range, clamping for display", index);
                &self.tiers[self.terminal_index().min(index)]
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }
}
