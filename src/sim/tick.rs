//! Fixed timestep simulation tick
//!
//! Applies one tick's input commands to the session, then advances timers
//! and physics by `dt`.

use super::physics::PhysicsWorld;
use super::state::GameSession;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Start the first session (Start screen)
    pub play: bool,
    /// Start a new session (GameOver screen)
    pub restart: bool,
    /// Pointer x in board coordinates
    pub target_x: Option<f32>,
    /// Drop the held piece (click/tap/space)
    pub release: bool,
    pub toggle_sound: bool,
}

/// Advance the session by one fixed timestep
pub fn tick<W: PhysicsWorld + ?Sized>(session: &mut GameSession, world: &mut W, input: &TickInput, dt: f32) {
    if input.play {
        session.play(world);
    }
    if input.restart {
        session.restart(world);
    }
    if input.toggle_sound {
        session.toggle_sound();
    }
    if let Some(x) = input.target_x {
        session.set_target(world, x);
    }
    if input.release {
        session.release(world);
    }

    session.advance(world, dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::persistence::Profile;
    use crate::sim::physics::PhysicsWorld;
    use crate::sim::sandbox::SandboxWorld;
    use crate::sim::state::{GameEvent, GamePhase};
    use crate::tuning::Tuning;

    /// Tuning where every spawn is the smallest tier
    fn smallest_only() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.early_weights = vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        tuning.late_weights = tuning.early_weights.clone();
        tuning
    }

    fn start(tuning: Tuning, seed: u64) -> (SandboxWorld, GameSession) {
        let mut world = SandboxWorld::new();
        let mut session = GameSession::new(&mut world, tuning, Profile::default(), seed).unwrap();
        let play = TickInput {
            play: true,
            ..Default::default()
        };
        tick(&mut session, &mut world, &play, SIM_DT);
        (world, session)
    }

    fn idle(world: &mut SandboxWorld, session: &mut GameSession, ticks: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            tick(session, world, &TickInput::default(), SIM_DT);
            events.extend(session.drain_events());
        }
        events
    }

    fn release() -> TickInput {
        TickInput {
            release: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_start_to_playing() {
        let mut world = SandboxWorld::new();
        let mut session = GameSession::new(&mut world, Tuning::default(), Profile::default(), 1).unwrap();

        tick(&mut session, &mut world, &TickInput::default(), SIM_DT);
        assert_eq!(session.phase, GamePhase::Start);

        // Restart and release mean nothing before the first session
        let input = TickInput {
            restart: true,
            release: true,
            target_x: Some(50.0),
            ..Default::default()
        };
        tick(&mut session, &mut world, &input, SIM_DT);
        assert_eq!(session.phase, GamePhase::Start);
        assert_eq!(session.target_x, 180.0);
        assert!(session.drain_events().is_empty());

        let play = TickInput {
            play: true,
            ..Default::default()
        };
        tick(&mut session, &mut world, &play, SIM_DT);
        assert_eq!(session.phase, GamePhase::Playing);
        assert!(session.current_piece.is_some());
    }

    #[test]
    fn test_held_piece_follows_pointer_and_stays_put() {
        let (mut world, mut session) = start(Tuning::default(), 3);
        let id = session.current_piece.unwrap();
        let input = TickInput {
            target_x: Some(120.0),
            ..Default::default()
        };
        tick(&mut session, &mut world, &input, SIM_DT);
        idle(&mut world, &mut session, 60);
        assert_eq!(world.position(id).map(|p| (p.x, p.y)), Some((120.0, 40.0)));
    }

    #[test]
    fn test_release_locks_input_until_next_piece() {
        let (mut world, mut session) = start(smallest_only(), 5);
        tick(&mut session, &mut world, &release(), SIM_DT);
        assert!(!session.drop_enabled);

        // Releasing again during the settle delay does nothing
        for _ in 0..30 {
            tick(&mut session, &mut world, &release(), SIM_DT);
        }
        assert!(session.current_piece.is_none());
        assert_eq!(session.registry().len(), 1);

        idle(&mut world, &mut session, 10);
        assert!(session.drop_enabled);
        assert!(session.current_piece.is_some());
        assert_eq!(session.registry().len(), 2);
    }

    #[test]
    fn test_two_smallest_pieces_merge() {
        let (mut world, mut session) = start(smallest_only(), 9);
        session.drain_events();
        tick(&mut session, &mut world, &release(), SIM_DT);
        while !session.drop_enabled {
            tick(&mut session, &mut world, &TickInput::default(), SIM_DT);
        }
        tick(&mut session, &mut world, &release(), SIM_DT);

        let events = idle(&mut world, &mut session, 240);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::MergeResolved { tier: 1, .. }))
        );
        assert!(events.contains(&GameEvent::ScoreChanged { score: 3 }));
        assert_eq!(session.progress.score, 3);
        assert_eq!(session.progress.highest_tier, 1);
        assert_eq!(session.phase, GamePhase::Playing);
        // Merged piece plus the next held piece
        assert_eq!(session.registry().len(), 2);
        assert_eq!(world.circle_count(), 2);
    }

    #[test]
    fn test_merge_product_at_ceiling_ends_session() {
        let mut tuning = smallest_only();
        // Floor top at y=110 so a two-piece stack reaches the ceiling sensor
        tuning.board.floor_y = 130.0;
        let (mut world, mut session) = start(tuning, 11);

        let mut events = Vec::new();
        for _ in 0..240 {
            tick(&mut session, &mut world, &release(), SIM_DT);
            events.extend(session.drain_events());
            if session.phase == GamePhase::GameOver {
                break;
            }
        }

        assert_eq!(session.phase, GamePhase::GameOver);
        assert_eq!(session.progress.score, 3);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::LossDetected { final_score: 3, new_best: true, .. }
        )));

        // Frozen: nothing moves, commands other than restart are ignored
        let before: Vec<_> = session
            .registry()
            .ids()
            .map(|id| world.position(id))
            .collect();
        idle(&mut world, &mut session, 60);
        let after: Vec<_> = session
            .registry()
            .ids()
            .map(|id| world.position(id))
            .collect();
        assert_eq!(before, after);

        let restart = TickInput {
            restart: true,
            ..Default::default()
        };
        tick(&mut session, &mut world, &restart, SIM_DT);
        assert_eq!(session.phase, GamePhase::Playing);
        assert_eq!(session.progress.score, 0);
        assert_eq!(session.profile.best_score, 3);
    }

    #[test]
    fn test_toggle_sound_in_any_phase() {
        let mut world = SandboxWorld::new();
        let mut session = GameSession::new(&mut world, Tuning::default(), Profile::default(), 1).unwrap();
        let toggle = TickInput {
            toggle_sound: true,
            ..Default::default()
        };
        tick(&mut session, &mut world, &toggle, SIM_DT);
        assert!(!session.profile.settings.sound_enabled);
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::SettingsChanged { sound_enabled: false }]
        );
    }

    #[test]
    fn test_determinism() {
        // Same seed and inputs give the same piece sequence
        let run = |seed| {
            let (mut world, mut session) = start(Tuning::default(), seed);
            let mut tiers = vec![session.current_tier];
            for i in 0..600 {
                let input = TickInput {
                    target_x: Some(60.0 + (i % 240) as f32),
                    release: i % 40 == 0,
                    ..Default::default()
                };
                tick(&mut session, &mut world, &input, SIM_DT);
                for event in session.drain_events() {
                    if let GameEvent::PieceSpawned { tier, .. } = event {
                        tiers.push(tier);
                    }
                }
            }
            (tiers, session.progress, session.phase)
        };

        assert_eq!(run(42), run(42));
    }
}
