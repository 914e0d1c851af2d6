//! Tierfall - merge falling-bubbles arcade core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tiers, spawning, merges, game state)
//! - `tuning`: Data-driven game balance
//! - `persistence`: Profile blob and key-value storage backends
//! - `app`: Frame driver tying session, physics world, storage and audio together
//! - `platform`: Browser/native platform hooks

pub mod app;
pub mod audio;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use app::App;
pub use persistence::Profile;
pub use settings::Settings;
pub use tuning::{ConfigError, Tuning};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Board dimensions (y grows downward)
    pub const BOARD_WIDTH: f32 = 360.0;
    pub const BOARD_HEIGHT: f32 = 620.0;
    /// Centre line of the ceiling sensor
    pub const CEILING_Y: f32 = 60.0;
    pub const CEILING_THICKNESS: f32 = 10.0;
    /// Falling pieces appear this far above the ceiling line
    pub const SPAWN_ABOVE_CEILING: f32 = 20.0;
    /// Gap kept between a spawned piece and the side walls
    pub const WALL_MARGIN: f32 = 6.0;
    /// Pointer x is clamped this far inside the board
    pub const POINTER_MARGIN: f32 = 20.0;
    pub const WALL_THICKNESS: f32 = 40.0;
    /// Centre line of the floor slab
    pub const FLOOR_Y: f32 = BOARD_HEIGHT - 20.0;

    /// Score above which the late-game spawn weights apply
    pub const LATE_GAME_SCORE: u64 = 800;
    /// Extra multiple of the terminal tier's score awarded on reaching it
    pub const TERMINAL_BONUS_MULTIPLIER: u64 = 3;

    /// Timings (milliseconds)
    pub const SPAWN_GRACE_MS: u64 = 300;
    pub const MERGE_COOLDOWN_MS: u64 = 150;
    pub const DROP_SETTLE_MS: u64 = 300;
}
