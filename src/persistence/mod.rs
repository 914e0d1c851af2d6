//! Profile persistence
//!
//! The profile is a small JSON blob: personal records plus settings.
//! Loading never fails; every field that is missing or unreadable falls back
//! to its default on its own, so one corrupted value does not wipe the rest.

pub mod storage;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use storage::{MemoryStorage, Storage, StorageError};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;

use crate::settings::Settings;

/// Storage key for the profile blob
pub const PROFILE_KEY: &str = "tierfall_profile";

/// Records and preferences that outlive a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub best_score: u64,
    pub lifetime_highest_tier: usize,
    #[serde(flatten)]
    pub settings: Settings,
}

impl Profile {
    /// Parse a stored blob, recovering field by field
    pub fn from_json(json: &str) -> Self {
        let value: Value = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Profile blob unreadable ({}), using defaults", e);
                return Self::default();
            }
        };
        let Some(obj) = value.as_object() else {
            log::warn!("Profile blob is not an object, using defaults");
            return Self::default();
        };

        let defaults = Self::default();
        Self {
            best_score: field(obj, "bestScore", Value::as_u64, defaults.best_score),
            lifetime_highest_tier: field(
                obj,
                "lifetimeHighestTier",
                |v| v.as_u64().and_then(|n| usize::try_from(n).ok()),
                defaults.lifetime_highest_tier,
            ),
            settings: Settings {
                sound_enabled: field(
                    obj,
                    "soundEnabled",
                    Value::as_bool,
                    defaults.settings.sound_enabled,
                ),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load from storage. Missing or broken data yields defaults.
    pub fn load<S: Storage + ?Sized>(storage: &S) -> Self {
        match storage.read(PROFILE_KEY) {
            Ok(Some(json)) => {
                let profile = Self::from_json(&json);
                log::info!(
                    "Loaded profile (best {}, lifetime tier {})",
                    profile.best_score,
                    profile.lifetime_highest_tier
                );
                profile
            }
            Ok(None) => {
                log::info!("No profile found, starting fresh");
                Self::default()
            }
            Err(e) => {
                log::warn!("Profile storage unavailable ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save<S: Storage + ?Sized>(&self, storage: &mut S) -> Result<(), StorageError> {
        storage.write(PROFILE_KEY, &self.to_json()?)?;
        log::info!("Profile saved");
        Ok(())
    }

    /// Fold a finished session into the records. Returns true on a new best
    /// score.
    pub fn record_session(&mut self, score: u64, highest_tier: usize) -> bool {
        let new_best = score > self.best_score;
        self.best_score = self.best_score.max(score);
        self.lifetime_highest_tier = self.lifetime_highest_tier.max(highest_tier);
        new_best
    }
}

fn field<T>(obj: &Map<String, Value>, key: &str, parse: impl Fn(&Value) -> Option<T>, default: T) -> T {
    match obj.get(key) {
        None => default,
        Some(raw) => parse(raw).unwrap_or_else(|| {
            log::warn!("Profile field {} has invalid value {}, using default", key, raw);
            default
        }),
    }
}
