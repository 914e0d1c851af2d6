//! Tierfall entry point
//!
//! Natively this runs a headless autoplay session against the sandbox world
//! and the on-disk profile. Usage: `tierfall [tuning.json] [seed]`.
//! The web build is driven through `platform::WebGame` instead.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::path::PathBuf;

    use tierfall::App;
    use tierfall::audio::LogAudio;
    use tierfall::consts::BOARD_WIDTH;
    use tierfall::persistence::FileStorage;
    use tierfall::sim::{GameEvent, GamePhase, SandboxWorld, TickInput};
    use tierfall::tuning::Tuning;

    tierfall::platform::init_logging();
    log::info!("Tierfall (native) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next().map(PathBuf::from) {
        Some(path) => match Tuning::load(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Cannot use tuning {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345);

    let storage = FileStorage::default_location();
    log::info!("Profile directory: {}", storage.dir().display());

    let mut app = match App::boot(tuning, SandboxWorld::new(), storage, LogAudio, seed) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Invalid tuning: {}", e);
            std::process::exit(1);
        }
    };

    const FRAME_DT: f32 = 1.0 / 60.0;
    const MAX_FRAMES: u32 = 60 * 60 * 10;

    let mut input = TickInput {
        play: true,
        ..Default::default()
    };
    let mut merges = 0u32;
    for frame in 0..MAX_FRAMES {
        // Sweep the pointer back and forth across the board
        let sweep = (frame as f32 * 0.02).sin() * 0.5 + 0.5;
        input.target_x = Some(sweep * BOARD_WIDTH);
        input.release = frame % 20 == 0;

        for event in app.update(FRAME_DT, &input) {
            match event {
                GameEvent::MergeResolved { .. } | GameEvent::TerminalReached { .. } => merges += 1,
                GameEvent::LossDetected {
                    final_score,
                    session_tier,
                    best_score,
                    lifetime_tier,
                    new_best,
                } => {
                    log::info!(
                        "Final score {} (best {}{}), reached {} (lifetime {})",
                        final_score,
                        best_score,
                        if new_best { ", new record!" } else { "" },
                        session_tier,
                        lifetime_tier
                    );
                }
                _ => {}
            }
        }
        input.play = false;

        if app.session().phase == GamePhase::GameOver {
            break;
        }
    }

    let session = app.session();
    log::info!(
        "Demo finished after {} ticks: {} merges, score {}, phase {:?}",
        session.time_ticks,
        merges,
        session.progress.score,
        session.phase
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::start, this is just to satisfy the compiler
}
