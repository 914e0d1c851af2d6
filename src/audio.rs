//! Sound effects
//!
//! Game events map to a handful of effects; a sink decides how to play them.
//! On the web the sink synthesises them with the Web Audio API, no asset
//! files needed. Natively they are only logged.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Held piece let go
    Drop,
    /// Two pieces fused; carries the resulting tier
    Merge(usize),
    /// Terminal tier reached
    Terminal,
    /// Session lost
    GameOver,
    /// Session lost with a new best score
    HighScore,
}

impl SoundEffect {
    /// Effect to play for an event, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::PieceDropped { .. } => Some(SoundEffect::Drop),
            GameEvent::MergeResolved { tier, .. } => Some(SoundEffect::Merge(*tier)),
            GameEvent::TerminalReached { .. } => Some(SoundEffect::Terminal),
            GameEvent::LossDetected { new_best: true, .. } => Some(SoundEffect::HighScore),
            GameEvent::LossDetected { .. } => Some(SoundEffect::GameOver),
            _ => None,
        }
    }
}

/// Something that can play effects
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Sink that only logs what would have played
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        log::debug!("Sound: {:?}", effect);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundEffect};

    /// Master level applied to every effect
    const VOLUME: f32 = 0.8;

    /// Procedural Web Audio synth
    pub struct WebAudio {
        ctx: Option<AudioContext>,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // Fails outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Short pitch sweep
        fn sweep(&self, ctx: &AudioContext, from: f32, to: f32, len: f64, osc_type: OscillatorType, level: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
                return;
            };
            let t = ctx.current_time();
            gain.gain().set_value_at_time(VOLUME * level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + len)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + len)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + len + 0.05).ok();
        }

        /// Notes played one after another
        fn arpeggio(&self, ctx: &AudioContext, notes: &[f32], spacing: f64, osc_type: OscillatorType) {
            for (i, freq) in notes.iter().enumerate() {
                let Some((osc, gain)) = self.create_osc(ctx, *freq, osc_type) else {
                    continue;
                };
                let t = ctx.current_time() + i as f64 * spacing;
                gain.gain().set_value_at_time(VOLUME * 0.25, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + spacing * 2.0)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + spacing * 2.5).ok();
            }
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, effect: SoundEffect) {
            let Some(ctx) = &self.ctx else { return };

            // Browsers keep the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Drop => self.sweep(ctx, 220.0, 120.0, 0.12, OscillatorType::Triangle, 0.3),
                SoundEffect::Merge(tier) => {
                    // Bigger tiers pop lower
                    let base = 900.0 / (1.0 + tier as f32 * 0.25);
                    self.sweep(ctx, base, base * 1.5, 0.1, OscillatorType::Sine, 0.35);
                }
                SoundEffect::Terminal => {
                    self.arpeggio(ctx, &[500.0, 630.0, 750.0, 1000.0, 1260.0], 0.07, OscillatorType::Triangle)
                }
                SoundEffect::GameOver => self.arpeggio(ctx, &[400.0, 350.0, 300.0, 200.0], 0.2, OscillatorType::Sine),
                SoundEffect::HighScore => {
                    self.arpeggio(ctx, &[500.0, 600.0, 700.0, 800.0, 1000.0], 0.08, OscillatorType::Triangle)
                }
            }
        }
    }
}
