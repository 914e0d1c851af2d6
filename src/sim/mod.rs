//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body ID)
//! - No rendering or platform dependencies
//!
//! The rigid-body engine sits behind `PhysicsWorld`; `SandboxWorld` is a
//! headless implementation good enough for tests and the native demo.

pub mod collision;
pub mod merge;
pub mod physics;
pub mod registry;
pub mod sandbox;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod tier;
pub mod timers;

pub use collision::{CollisionEvent, classify};
pub use merge::{MergeOutcome, MergeResolver, SkipReason};
pub use physics::{BodyId, BodyMode, Boundary, BoundaryKind, ContactPair, PhysicsWorld};
pub use registry::{Piece, PieceMeta, PieceRegistry, SpawnKind};
pub use sandbox::SandboxWorld;
pub use spawn::SpawnSelector;
pub use state::{Boundaries, GameEvent, GamePhase, GameSession, Progress};
pub use tick::{TickInput, tick};
pub use tier::{Tier, TierError, TierTable};
pub use timers::{Scheduler, Timer, TimerAction};
