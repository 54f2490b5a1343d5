//! Threaded engine host
//!
//! One worker thread per session owns the [`GameState`] outright. Every other
//! thread talks to it through a command queue that the worker drains at the
//! top of each loop iteration, so input never races the simulation. Pause and
//! stop are atomic flags the worker polls; stop joins the worker and parks the
//! session so `start` can pick it back up.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::{ConfigError, EngineConfig};
use crate::consts::*;
use crate::frame::Frame;
use crate::input::{InputAdapter, PointerEvent, PointerKind};
use crate::sim::{GameEvent, GameState, TickInput, apply_input, tick};

/// Receives one snapshot per loop iteration
pub trait FrameSink: Send {
    fn present(&mut self, frame: &Frame);
}

impl<F> FrameSink for F
where
    F: FnMut(&Frame) + Send,
{
    fn present(&mut self, frame: &Frame) {
        self(frame)
    }
}

/// Called with the final score when a game ends
pub type GameOverCallback = Box<dyn FnMut(u64) + Send>;

/// Messages from the host to the worker
#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Pointer(PointerEvent),
    Resize { width: f32, height: f32 },
    Restart,
}

#[derive(Debug, Default)]
struct Flags {
    stop: AtomicBool,
    paused: AtomicBool,
}

/// Everything the worker owns while running
struct Session {
    state: GameState,
    commands: Receiver<Command>,
    adapter: InputAdapter,
    sink: Box<dyn FrameSink>,
    on_game_over: Option<GameOverCallback>,
    game_over_reported: bool,
}

impl Session {
    /// Apply queued commands in arrival order
    ///
    /// Each pointer event is translated against the state left by the ones
    /// before it, so a release that fires locks out later events in the batch.
    fn drain_commands(&mut self, accept_input: bool) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Pointer(event) => {
                    if !accept_input {
                        continue;
                    }
                    if let Some(intent) = self.adapter.handle(event, &self.state) {
                        apply_input(&mut self.state, &intent);
                    }
                }
                Command::Resize { width, height } => {
                    self.state.set_surface_size(width, height);
                }
                Command::Restart => {
                    self.state.restart();
                    self.adapter = InputAdapter::new();
                    self.game_over_reported = false;
                    log::info!("Game restarted");
                }
            }
        }
    }

    fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            log::trace!("{:?}", event);
            if let GameEvent::GameOver { score } = *event {
                if self.game_over_reported {
                    continue;
                }
                self.game_over_reported = true;
                if let Some(callback) = self.on_game_over.as_mut() {
                    callback(score);
                }
            }
        }
    }

    /// Fixed-cadence loop: drain, update, snapshot, sleep
    fn run(mut self, flags: Arc<Flags>) -> Self {
        log::info!("Engine worker started");
        let mut last = Instant::now();

        while !flags.stop.load(Ordering::Acquire) {
            let now = Instant::now();
            // Clamp so a stall (suspend, debugger) doesn't fling the projectile
            let dt = now.duration_since(last).as_secs_f32().min(MAX_FRAME_DT);
            last = now;

            let paused = flags.paused.load(Ordering::Acquire);
            self.drain_commands(!paused);
            if !paused {
                let events = tick(&mut self.state, &TickInput::default(), dt);
                self.dispatch(&events);
            }

            let frame = Frame::capture(&self.state, paused);
            self.sink.present(&frame);

            thread::sleep(Duration::from_millis(LOOP_SLEEP_MS));
        }

        log::info!("Engine worker stopped");
        self
    }
}

/// Host-side handle for one game session
pub struct Engine {
    config: EngineConfig,
    commands: Sender<Command>,
    flags: Arc<Flags>,
    worker: Option<JoinHandle<Session>>,
    /// Session waiting while the worker is not running
    parked: Option<Session>,
}

impl Engine {
    /// Build a stopped engine with a freshly generated level
    pub fn new(config: EngineConfig, sink: impl FrameSink + 'static) -> Result<Self, ConfigError> {
        config.validate()?;
        let (commands, receiver) = mpsc::channel();
        let session = Session {
            state: GameState::new(&config),
            commands: receiver,
            adapter: InputAdapter::new(),
            sink: Box::new(sink),
            on_game_over: None,
            game_over_reported: false,
        };
        Ok(Self {
            config,
            commands,
            flags: Arc::new(Flags::default()),
            worker: None,
            parked: Some(session),
        })
    }

    /// Register the game-over callback (fires once per game)
    ///
    /// Must be called while the engine is stopped; the callback travels with
    /// the parked session.
    pub fn with_game_over(mut self, callback: impl FnMut(u64) + Send + 'static) -> Self {
        match self.parked.as_mut() {
            Some(session) => session.on_game_over = Some(Box::new(callback)),
            None => log::warn!("No parked session; game-over callback dropped"),
        }
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused.load(Ordering::Acquire)
    }

    /// Spawn the worker. No-op if already running.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        let Some(mut session) = self.parked.take() else {
            log::error!("Cannot start: session was lost");
            return;
        };
        // Gestures queued while stopped are stale
        session.drain_commands(false);

        self.flags.stop.store(false, Ordering::Release);
        let flags = Arc::clone(&self.flags);
        let spawned = thread::Builder::new()
            .name("bubble-burst-sim".into())
            .spawn(move || session.run(flags));
        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                log::info!("Engine started");
            }
            Err(err) => log::error!("Failed to spawn engine worker: {}", err),
        }
    }

    /// Freeze the simulation; the loop keeps presenting frames
    pub fn pause(&self) {
        if !self.flags.paused.swap(true, Ordering::AcqRel) {
            log::info!("Engine paused");
        }
    }

    pub fn resume(&self) {
        if self.flags.paused.swap(false, Ordering::AcqRel) {
            log::info!("Engine resumed");
        }
    }

    /// Signal the worker and wait for it to finish its current iteration
    pub fn stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        self.flags.stop.store(true, Ordering::Release);
        match handle.join() {
            Ok(session) => {
                self.parked = Some(session);
                log::info!("Engine stopped");
            }
            Err(_) => log::error!("Engine worker panicked; session discarded"),
        }
    }

    /// New surface size; the board is kept and only pixel geometry changes
    pub fn set_surface_size(&self, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0) {
            log::warn!("Ignoring invalid surface size {}x{}", width, height);
            return;
        }
        self.send(Command::Resize { width, height });
    }

    /// Queue a pointer sample for the worker
    pub fn on_pointer_event(&self, kind: PointerKind, x: f32, y: f32) {
        self.send(Command::Pointer(PointerEvent::new(kind, x, y)));
    }

    /// Start a new game with a fresh level
    pub fn restart(&self) {
        self.send(Command::Restart);
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::warn!("Engine session gone, dropping {:?}", command);
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{BubbleKind, GamePhase};

    fn session(config: &EngineConfig) -> (Session, Sender<Command>) {
        let (tx, rx) = mpsc::channel();
        let session = Session {
            state: GameState::new(config),
            commands: rx,
            adapter: InputAdapter::new(),
            sink: Box::new(|_: &Frame| {}),
            on_game_over: None,
            game_over_reported: false,
        };
        (session, tx)
    }

    #[test]
    fn test_drain_applies_gesture() {
        let config = EngineConfig {
            seed: Some(3),
            ..Default::default()
        };
        let (mut session, tx) = session(&config);
        let l = session.state.layout.launcher;
        tx.send(Command::Pointer(PointerEvent::new(PointerKind::Down, l.x, l.y - 50.0)))
            .unwrap();
        tx.send(Command::Pointer(PointerEvent::new(PointerKind::Up, l.x - 50.0, l.y - 50.0)))
            .unwrap();

        session.drain_commands(true);
        assert_eq!(session.state.phase, GamePhase::Shooting);
        assert!((session.state.projectile.angle - 135.0).abs() < 1e-3);
    }

    #[test]
    fn test_events_after_release_do_not_touch_the_shot() {
        let config = EngineConfig {
            seed: Some(3),
            ..Default::default()
        };
        let (mut session, tx) = session(&config);
        let l = session.state.layout.launcher;
        let button = session.state.layout.area_clear_button;
        let loaded = session.state.loaded.kind;
        let charges = session.state.powerups.area_clear;

        tx.send(Command::Pointer(PointerEvent::new(PointerKind::Down, l.x + 100.0, l.y - 100.0)))
            .unwrap();
        tx.send(Command::Pointer(PointerEvent::new(PointerKind::Up, l.x + 100.0, l.y - 100.0)))
            .unwrap();
        tx.send(Command::Pointer(PointerEvent::new(PointerKind::Move, l.x - 100.0, l.y - 100.0)))
            .unwrap();
        tx.send(Command::Pointer(PointerEvent::new(PointerKind::Down, button.x, button.y)))
            .unwrap();

        session.drain_commands(true);
        assert_eq!(session.state.phase, GamePhase::Shooting);
        assert_eq!(session.state.projectile.kind, loaded);
        assert!(matches!(session.state.projectile.kind, BubbleKind::Normal(_)));
        assert!((session.state.projectile.angle - 45.0).abs() < 1e-3);
        assert!((session.state.aim_angle - 45.0).abs() < 1e-3);
        assert_eq!(session.state.powerups.area_clear, charges);
    }

    #[test]
    fn test_powerup_then_release_arms_the_shot() {
        let config = EngineConfig {
            seed: Some(3),
            ..Default::default()
        };
        let (mut session, tx) = session(&config);
        let l = session.state.layout.launcher;
        let button = session.state.layout.area_clear_button;
        let charges = session.state.powerups.area_clear;

        tx.send(Command::Pointer(PointerEvent::new(PointerKind::Down, button.x, button.y)))
            .unwrap();
        tx.send(Command::Pointer(PointerEvent::new(PointerKind::Down, l.x, l.y - 100.0)))
            .unwrap();
        tx.send(Command::Pointer(PointerEvent::new(PointerKind::Up, l.x, l.y - 100.0)))
            .unwrap();

        session.drain_commands(true);
        assert_eq!(session.state.projectile.kind, BubbleKind::AreaClear);
        assert_eq!(session.state.powerups.area_clear, charges - 1);
    }

    #[test]
    fn test_drain_drops_input_when_paused_but_applies_resize() {
        let config = EngineConfig {
            seed: Some(3),
            ..Default::default()
        };
        let (mut session, tx) = session(&config);
        let l = session.state.layout.launcher;
        tx.send(Command::Pointer(PointerEvent::new(PointerKind::Down, l.x, l.y - 50.0)))
            .unwrap();
        tx.send(Command::Resize {
            width: 960.0,
            height: 1600.0,
        })
        .unwrap();

        let before = session.state.layout.tile_width;
        session.drain_commands(false);
        assert_eq!(session.state.phase, GamePhase::Ready);
        assert!((session.state.aim_angle - 90.0).abs() < 1e-3);
        assert!(session.state.layout.tile_width > before);
    }

    #[test]
    fn test_game_over_callback_without_session_is_dropped() {
        let config = EngineConfig {
            seed: Some(3),
            ..Default::default()
        };
        let mut engine = Engine::new(config, |_: &Frame| {}).unwrap();
        engine.parked = None;
        let mut engine = engine.with_game_over(|_score: u64| {});
        assert!(engine.parked.is_none());
        engine.start();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_game_over_dispatched_once() {
        use std::sync::Mutex;

        let config = EngineConfig {
            seed: Some(3),
            ..Default::default()
        };
        let (mut session, _tx) = session(&config);
        let calls = Arc::new(Mutex::new(Vec::<u64>::new()));
        let sink = Arc::clone(&calls);
        session.on_game_over = Some(Box::new(move |score: u64| sink.lock().unwrap().push(score)));

        session.dispatch(&[GameEvent::GameOver { score: 900 }]);
        session.dispatch(&[GameEvent::GameOver { score: 900 }]);
        assert_eq!(*calls.lock().unwrap(), vec![900]);
    }
}
