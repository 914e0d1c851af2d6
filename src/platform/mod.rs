//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logger and panic hook setup
//! - The JS-facing game handle (web)

#[cfg(not(target_arch = "wasm32"))]
pub use native::init_logging;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    /// env_logger with `info` as the default level; `RUST_LOG` overrides
    pub fn init_logging() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebGame;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::prelude::*;

    use crate::app::App;
    use crate::audio::WebAudio;
    use crate::persistence::LocalStorage;
    use crate::sim::{GamePhase, SandboxWorld, TickInput};
    use crate::tuning::Tuning;

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }
        log::info!("Tierfall core loaded");
    }

    /// Game handle driven by the page's animation loop
    #[wasm_bindgen]
    pub struct WebGame {
        app: App<SandboxWorld, LocalStorage, WebAudio>,
        input: TickInput,
    }

    #[wasm_bindgen]
    impl WebGame {
        /// `tuning_json` may be empty to use the built-in table
        #[wasm_bindgen(constructor)]
        pub fn new(tuning_json: &str, seed: u64) -> Result<WebGame, JsError> {
            let tuning = if tuning_json.trim().is_empty() {
                Tuning::default()
            } else {
                Tuning::from_json(tuning_json)?
            };
            let app = App::boot(tuning, SandboxWorld::new(), LocalStorage, WebAudio::new(), seed)?;
            Ok(Self {
                app,
                input: TickInput::default(),
            })
        }

        pub fn play(&mut self) {
            self.input.play = true;
        }

        pub fn restart(&mut self) {
            self.input.restart = true;
        }

        pub fn release(&mut self) {
            self.input.release = true;
        }

        pub fn toggle_sound(&mut self) {
            self.input.toggle_sound = true;
        }

        /// Pointer x in board coordinates
        pub fn pointer_move(&mut self, x: f32) {
            self.input.target_x = Some(x);
        }

        /// Advance by one animation frame; returns the frame's events as JSON
        pub fn update(&mut self, dt_ms: f32) -> Result<String, JsError> {
            let input = std::mem::take(&mut self.input);
            let events = self.app.update(dt_ms / 1000.0, &input);
            Ok(serde_json::to_string(&events)?)
        }

        pub fn score(&self) -> u64 {
            self.app.session().progress.score
        }

        pub fn best_score(&self) -> u64 {
            self.app.session().profile.best_score
        }

        pub fn phase(&self) -> String {
            match self.app.session().phase {
                GamePhase::Start => "start",
                GamePhase::Playing => "playing",
                GamePhase::GameOver => "gameOver",
            }
            .to_string()
        }
    }
}
