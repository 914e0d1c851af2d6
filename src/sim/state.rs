//! Game session state and transitions
//!
//! `GameSession` owns everything a play-through mutates: phase, score,
//! piece registry, pending timers and the persisted records. The physics
//! world is passed in by the caller on every call that needs it.

use std::time::Duration;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionEvent, classify};
use super::merge::{MergeOutcome, MergeResolver};
use super::physics::{BodyId, Boundary, BoundaryKind, ContactPair, PhysicsWorld};
use super::registry::{PieceRegistry, SpawnKind};
use super::spawn::SpawnSelector;
use super::tier::TierTable;
use super::timers::{Scheduler, TimerAction};
use crate::persistence::Profile;
use crate::tuning::{ConfigError, Material, Tuning};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Idle, waiting for the play command
    Start,
    /// Pieces are being dropped
    Playing,
    /// Run ended, waiting for restart
    GameOver,
}

/// Score and progress for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub score: u64,
    pub highest_tier: usize,
}

/// Signals for presentation and persistence adapters. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted { session: u32 },
    PieceSpawned { id: BodyId, tier: usize, pos: Vec2 },
    NextTier { tier: usize },
    PieceDropped { id: BodyId, tier: usize },
    MergeResolved { id: BodyId, tier: usize, pos: Vec2 },
    TerminalReached { pos: Vec2 },
    ScoreChanged { score: u64 },
    LossDetected {
        final_score: u64,
        session_tier: String,
        best_score: u64,
        lifetime_tier: String,
        new_best: bool,
    },
    SettingsChanged { sound_enabled: bool },
}

impl GameEvent {
    /// Whether the profile must be written after this event
    pub fn requires_save(&self) -> bool {
        matches!(
            self,
            GameEvent::LossDetected { .. } | GameEvent::SettingsChanged { .. }
        )
    }
}

/// Static bodies making up the well
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundaries {
    pub floor: BodyId,
    pub left_wall: BodyId,
    pub right_wall: BodyId,
    pub ceiling: BodyId,
}

pub struct GameSession {
    pub phase: GamePhase,
    /// Epoch of the current play-through; bumped on every start/restart
    pub session_id: u32,
    pub progress: Progress,
    pub profile: Profile,
    /// The one piece still under player control
    pub current_piece: Option<BodyId>,
    pub current_tier: usize,
    /// Tier queued for the piece after the current one
    pub next_tier: usize,
    pub drop_enabled: bool,
    /// Pointer x, already clamped to the board
    pub target_x: f32,
    pub clock: Duration,
    pub time_ticks: u64,
    tuning: Tuning,
    tiers: TierTable,
    spawner: SpawnSelector,
    resolver: MergeResolver,
    registry: PieceRegistry,
    timers: Scheduler,
    rng: Pcg32,
    boundaries: Boundaries,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Validate tuning and build the well in `world`
    pub fn new<W: PhysicsWorld + ?Sized>(
        world: &mut W,
        tuning: Tuning,
        profile: Profile,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        tuning.validate()?;
        let boundaries = build_well(world, &tuning);
        let tiers = TierTable::from_defs(&tuning.tiers);

        Ok(Self {
            phase: GamePhase::Start,
            session_id: 0,
            progress: Progress::default(),
            profile,
            current_piece: None,
            current_tier: 0,
            next_tier: 0,
            drop_enabled: false,
            target_x: tuning.board.width / 2.0,
            clock: Duration::ZERO,
            time_ticks: 0,
            spawner: SpawnSelector::new(&tuning),
            resolver: MergeResolver::new(tuning.terminal_bonus_multiplier),
            registry: PieceRegistry::new(tuning.timing.merge_cooldown(), tuning.piece_material),
            timers: Scheduler::new(),
            rng: Pcg32::seed_from_u64(seed),
            boundaries,
            events: Vec::new(),
            tiers,
            tuning,
        })
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn registry(&self) -> &PieceRegistry {
        &self.registry
    }

    pub fn boundaries(&self) -> Boundaries {
        self.boundaries
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start → Playing
    pub fn play<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        if self.phase != GamePhase::Start {
            log::debug!("Play ignored in {:?}", self.phase);
            return;
        }
        self.begin_session(world);
    }

    /// GameOver → Playing
    pub fn restart<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        if self.phase != GamePhase::GameOver {
            log::debug!("Restart ignored in {:?}", self.phase);
            return;
        }
        self.begin_session(world);
    }

    fn begin_session<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        self.session_id += 1;
        self.timers.cancel_all();
        self.registry.clear(world);

        self.progress = Progress::default();
        self.current_piece = None;
        self.drop_enabled = true;
        self.target_x = self.tuning.board.width / 2.0;
        self.phase = GamePhase::Playing;
        self.next_tier = self.spawner.pick_tier(0, &mut self.rng);

        log::info!("Session {} started", self.session_id);
        self.events.push(GameEvent::SessionStarted {
            session: self.session_id,
        });
        self.events.push(GameEvent::ScoreChanged { score: 0 });
        self.spawn_falling_piece(world);
    }

    /// Move the drop target. The held piece follows.
    pub fn set_target<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, x: f32) {
        if self.phase != GamePhase::Playing || !self.drop_enabled {
            return;
        }
        let board = &self.tuning.board;
        self.target_x = x.max(board.pointer_margin).min(board.width - board.pointer_margin);

        if let Some(id) = self.current_piece {
            let pos = Vec2::new(self.spawn_x(self.current_tier), board.spawn_y());
            world.set_position(id, pos);
        }
    }

    /// Hand the held piece to physics and start the settle delay
    pub fn release<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        if self.phase != GamePhase::Playing || !self.drop_enabled {
            log::debug!("Release ignored (phase {:?}, input {})", self.phase, self.drop_enabled);
            return;
        }
        let Some(id) = self.current_piece.take() else {
            return;
        };
        let released = self.registry.release(world, id);
        if released {
            log::debug!("Dropped {} (tier {})", id, self.current_tier);
            self.events.push(GameEvent::PieceDropped {
                id,
                tier: self.current_tier,
            });
            // Grace covers the fall, so it runs from the drop, not the spawn
            self.timers.schedule(
                self.clock + self.tuning.timing.spawn_grace(),
                self.session_id,
                TimerAction::ClearSpawnGrace(id),
            );
        }
        self.drop_enabled = false;
        self.timers.schedule(
            self.clock + self.tuning.timing.drop_settle(),
            self.session_id,
            TimerAction::EnableDrop,
        );

        // Contacts that began while held were ignored and won't be reported again
        if released {
            let pairs = world.touching(id);
            self.handle_contacts(world, &pairs);
        }
    }

    /// Flip sound on/off. Valid in every phase.
    pub fn toggle_sound(&mut self) {
        let sound_enabled = self.profile.settings.toggle_sound();
        log::info!("Sound {}", if sound_enabled { "on" } else { "off" });
        self.events.push(GameEvent::SettingsChanged { sound_enabled });
    }

    /// Advance session time: fire due timers, then step physics and act on
    /// the contacts it reports. The world is frozen outside Playing.
    pub fn advance<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, dt: f32) {
        self.clock += Duration::try_from_secs_f32(dt).unwrap_or_default();
        self.time_ticks += 1;
        self.run_timers(world);

        if self.phase != GamePhase::Playing {
            return;
        }
        let pairs = world.step(dt);
        self.handle_contacts(world, &pairs);
    }

    /// Act on one tick's worth of began-touching pairs
    pub fn handle_contacts<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, pairs: &[ContactPair]) {
        let events = classify(pairs, &self.registry, &self.tiers, self.boundaries.ceiling);
        for event in events {
            if self.phase != GamePhase::Playing {
                break;
            }
            match event {
                CollisionEvent::Loss { piece } => {
                    log::info!("Piece {} breached the ceiling", piece);
                    self.game_over();
                }
                CollisionEvent::MergeCandidate { a, b } => self.merge(world, a, b),
            }
        }
    }

    fn merge<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, a: BodyId, b: BodyId) {
        let outcome = self.resolver.resolve(
            world,
            &mut self.registry,
            &self.tiers,
            &mut self.progress,
            a,
            b,
            self.clock,
        );
        match outcome {
            MergeOutcome::Merged { piece, .. } => {
                self.events.push(GameEvent::MergeResolved {
                    id: piece.id,
                    tier: piece.tier,
                    pos: piece.pos,
                });
            }
            MergeOutcome::Terminal { pos, .. } => {
                self.events.push(GameEvent::TerminalReached { pos });
            }
            MergeOutcome::Skipped(_) => return,
        }
        self.events.push(GameEvent::ScoreChanged {
            score: self.progress.score,
        });
    }

    /// Playing → GameOver
    fn game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        self.drop_enabled = false;
        self.current_piece = None;

        let new_best = self
            .profile
            .record_session(self.progress.score, self.progress.highest_tier);
        log::info!(
            "Game over: score {} (best {}{}), tier {}",
            self.progress.score,
            self.profile.best_score,
            if new_best { ", new record" } else { "" },
            self.tiers.display_name(self.progress.highest_tier)
        );
        self.events.push(GameEvent::LossDetected {
            final_score: self.progress.score,
            session_tier: self.tiers.display_name(self.progress.highest_tier).to_string(),
            best_score: self.profile.best_score,
            lifetime_tier: self
                .tiers
                .display_name(self.profile.lifetime_highest_tier)
                .to_string(),
            new_best,
        });
    }

    fn run_timers<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        for timer in self.timers.take_due(self.clock) {
            if timer.session != self.session_id {
                log::debug!(
                    "Discarding stale {:?} from session {}",
                    timer.action,
                    timer.session
                );
                continue;
            }
            match timer.action {
                TimerAction::ClearSpawnGrace(id) => self.registry.clear_spawn_grace(id),
                TimerAction::EnableDrop => {
                    if self.phase == GamePhase::Playing {
                        self.drop_enabled = true;
                        self.spawn_falling_piece(world);
                    }
                }
            }
        }
    }

    /// Bring in the queued tier at the top and draw a new queued tier
    fn spawn_falling_piece<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        self.current_tier = self.next_tier;
        self.next_tier = self.spawner.pick_tier(self.progress.score, &mut self.rng);

        let pos = Vec2::new(self.spawn_x(self.current_tier), self.tuning.board.spawn_y());
        let piece = self
            .registry
            .spawn(world, &self.tiers, self.current_tier, pos, SpawnKind::Falling);
        self.current_piece = Some(piece.id);

        self.events.push(GameEvent::PieceSpawned {
            id: piece.id,
            tier: piece.tier,
            pos,
        });
        self.events.push(GameEvent::NextTier {
            tier: self.next_tier,
        });
    }

    /// Target x clamped so a piece of `tier` clears both walls
    fn spawn_x(&self, tier: usize) -> f32 {
        let board = &self.tuning.board;
        let inset = self.tiers.radius_of(tier) + board.wall_margin;
        self.target_x.max(inset).min(board.width - inset)
    }
}

fn build_well<W: PhysicsWorld + ?Sized>(world: &mut W, tuning: &Tuning) -> Boundaries {
    let b = &tuning.board;
    let wall = b.wall_thickness;
    let floor = world.add_boundary(Boundary {
        kind: BoundaryKind::Floor,
        center: Vec2::new(b.width / 2.0, b.floor_y),
        size: Vec2::new(b.width + wall * 2.0, wall),
        material: Material::FLOOR,
    });
    let left_wall = world.add_boundary(Boundary {
        kind: BoundaryKind::LeftWall,
        center: Vec2::new(-wall / 2.0, b.height / 2.0),
        size: Vec2::new(wall, b.height),
        material: Material::WALL,
    });
    let right_wall = world.add_boundary(Boundary {
        kind: BoundaryKind::RightWall,
        center: Vec2::new(b.width + wall / 2.0, b.height / 2.0),
        size: Vec2::new(wall, b.height),
        material: Material::WALL,
    });
    let ceiling = world.add_boundary(Boundary {
        kind: BoundaryKind::CeilingSensor,
        center: Vec2::new(b.width / 2.0, b.ceiling_y),
        size: Vec2::new(b.width, b.ceiling_thickness),
        material: Material::WALL,
    });
    Boundaries {
        floor,
        left_wall,
        right_wall,
        ceiling,
    }
}
