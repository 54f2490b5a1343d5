//! Bubble Burst headless demo
//!
//! Runs the threaded engine with an auto-aiming player feeding pointer events
//! from the main thread, then prints the last frame as JSON.
//!
//! Usage: `bubble-burst [--config <PATH>] [--seconds <SECS>]`

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::Parser;

use bubble_burst::sim::{BubbleKind, GamePhase};
use bubble_burst::{Engine, EngineConfig, Frame, PointerKind};

#[derive(Parser, Debug)]
#[command(name = "bubble-burst")]
struct Args {
    /// Engine config as JSON. Defaults are used when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// How long the demo player runs, in seconds.
    #[arg(long, value_name = "SECS", default_value = "10", value_parser = parse_seconds)]
    seconds: Duration,
}

/// Non-negative, finite, and small enough for a `Duration`
fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let seconds: f32 = raw.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f32(seconds).map_err(|e| format!("{raw}: {e}"))
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    log::info!("Bubble Burst (headless) starting...");

    let config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("Invalid config {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };
    let seconds = args.seconds;

    let latest: Arc<Mutex<Option<Frame>>> = Arc::new(Mutex::new(None));
    let games_over = Arc::new(AtomicU64::new(0));

    let sink = {
        let latest = Arc::clone(&latest);
        move |frame: &Frame| {
            if let Ok(mut slot) = latest.lock() {
                *slot = Some(frame.clone());
            }
        }
    };
    let on_game_over = {
        let games_over = Arc::clone(&games_over);
        move |score: u64| {
            log::info!("Game over! Final score: {}", score);
            games_over.fetch_add(1, Ordering::Relaxed);
        }
    };

    let mut engine = match Engine::new(config, sink) {
        Ok(engine) => engine.with_game_over(on_game_over),
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "{}x{} grid, {} colors, running for {:?}",
        engine.config().columns,
        engine.config().rows,
        engine.config().color_count,
        seconds
    );
    engine.start();

    // Too far out to represent means run until killed
    let deadline = Instant::now().checked_add(seconds);
    let mut last_turn = None;
    while deadline.is_none_or(|d| Instant::now() < d) {
        std::thread::sleep(Duration::from_millis(16));
        let frame = match latest.lock() {
            Ok(slot) => slot.clone(),
            Err(_) => break,
        };
        let Some(frame) = frame else { continue };

        if frame.phase == GamePhase::GameOver {
            engine.restart();
            last_turn = None;
            continue;
        }
        if !frame.is_aiming() || last_turn == Some(frame.turn) {
            continue;
        }
        last_turn = Some(frame.turn);

        let (x, y) = pick_target(&frame);
        engine.on_pointer_event(PointerKind::Down, x, y);
        engine.on_pointer_event(PointerKind::Up, x, y);
    }

    engine.stop();

    let frame = latest.lock().ok().and_then(|slot| slot.clone());
    if let Some(frame) = frame {
        log::info!(
            "Finished: score {}, turn {}, {} games over",
            frame.score,
            frame.turn,
            games_over.load(Ordering::Relaxed)
        );
        match serde_json::to_string_pretty(&frame) {
            Ok(json) => println!("{}", json),
            Err(err) => log::error!("Failed to serialize frame: {}", err),
        }
    }
    ExitCode::SUCCESS
}

/// Aim at the lowest tile matching the loaded color, else straight up
fn pick_target(frame: &Frame) -> (f32, f32) {
    let launcher = frame.layout.launcher;
    let color = match frame.loaded.map(|b| b.kind) {
        Some(BubbleKind::Normal(color)) => Some(color),
        _ => None,
    };

    let target = frame
        .tiles
        .iter()
        .filter(|t| color.is_none_or(|c| t.color == c))
        .filter(|t| t.y < launcher.y)
        .max_by(|a, b| a.y.total_cmp(&b.y));

    match target {
        Some(tile) => (tile.x, tile.y),
        None => (launcher.x, launcher.y - frame.layout.tile_height * 4.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["bubble-burst"]).unwrap();
        assert!(args.config.is_none());
        assert_eq!(args.seconds, Duration::from_secs(10));
    }

    #[test]
    fn test_config_path_kept_whatever_its_extension() {
        let args =
            Args::try_parse_from(["bubble-burst", "--config", "/tmp/bad.cfg", "--seconds", "0.2"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/bad.cfg")));
        assert_eq!(args.seconds, Duration::from_secs_f32(0.2));
    }

    #[test]
    fn test_bad_seconds_rejected() {
        for bad in ["-1", "inf", "NaN", "1e30", "soon"] {
            assert!(
                Args::try_parse_from(["bubble-burst", "--seconds", bad]).is_err(),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn test_stray_positional_rejected() {
        assert!(Args::try_parse_from(["bubble-burst", "-1"]).is_err());
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let path = std::env::temp_dir().join("bubble-burst-invalid-columns.cfg");
        std::fs::write(&path, r#"{"columns":1}"#).unwrap();
        assert!(EngineConfig::load(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
