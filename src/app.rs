//! Frame driver
//!
//! Owns the session together with its collaborators (physics world, profile
//! storage, audio sink) and turns variable frame times into fixed ticks.
//! Persistence and audio react to the events each tick produces.

use crate::audio::{AudioSink, SoundEffect};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::persistence::{Profile, Storage};
use crate::sim::{GameEvent, GameSession, PhysicsWorld, TickInput, tick};
use crate::tuning::{ConfigError, Tuning};

/// Frames longer than this are clamped so a stalled tab doesn't fast-forward
const MAX_FRAME_DT: f32 = 0.1;

pub struct App<W, S, A> {
    session: GameSession,
    world: W,
    storage: S,
    audio: A,
    accumulator: f32,
    /// Commands waiting for the next tick
    input: TickInput,
}

impl<W: PhysicsWorld, S: Storage, A: AudioSink> App<W, S, A> {
    /// Load the profile and set up a session waiting on the start screen
    pub fn boot(tuning: Tuning, mut world: W, storage: S, audio: A, seed: u64) -> Result<Self, ConfigError> {
        let profile = Profile::load(&storage);
        let session = GameSession::new(&mut world, tuning, profile, seed)?;
        log::info!("Tierfall ready (seed {})", seed);
        Ok(Self {
            session,
            world,
            storage,
            audio,
            accumulator: 0.0,
            input: TickInput::default(),
        })
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Run as many fixed ticks as `frame_dt` covers, returning the events
    /// they produced in order.
    pub fn update(&mut self, frame_dt: f32, input: &TickInput) -> Vec<GameEvent> {
        self.queue(input);
        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.session, &mut self.world, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.play = false;
            self.input.restart = false;
            self.input.release = false;
            self.input.toggle_sound = false;

            for event in self.session.drain_events() {
                self.react(&event);
                events.push(event);
            }
        }
        events
    }

    fn queue(&mut self, input: &TickInput) {
        self.input.play |= input.play;
        self.input.restart |= input.restart;
        self.input.release |= input.release;
        self.input.toggle_sound |= input.toggle_sound;
        if input.target_x.is_some() {
            self.input.target_x = input.target_x;
        }
    }

    fn react(&mut self, event: &GameEvent) {
        if event.requires_save() {
            if let Err(e) = self.session.profile.save(&mut self.storage) {
                log::warn!("Failed to save profile: {}", e);
            }
        }
        if !self.session.profile.settings.sound_enabled {
            return;
        }
        if let Some(effect) = SoundEffect::for_event(event) {
            self.audio.play(effect);
        }
    }
}
