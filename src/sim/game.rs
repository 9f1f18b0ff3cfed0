//! Session controller
//!
//! [`MonsterGame`] owns the [`GameState`] and is the only thing that mutates
//! it. Three kinds of callbacks drive it, never concurrently:
//! - input: [`MonsterGame::handle_input`]
//! - engine: [`MonsterGame::on_collision_start`] once per step with contacts
//! - time: [`MonsterGame::advance`], which fires due timers
//!
//! Collaborator failures (audio, storage) are logged here and go no further.

use glam::Vec2;
use thiserror::Error;

use super::drop::{DropController, DroppedPiece};
use super::merge::{self, MergeEvent};
use super::registry::BodyRegistry;
use super::settle::{self, SettleVerdict};
use super::state::{GameState, PendingDrop};
use super::timers::{Scheduler, TimerId, TimerTask};
use super::world::{BodyHandle, CollisionPair, PhysicsWorld, StaticShape};
use crate::audio::{AudioSink, SoundEffect};
use crate::consts::WALL_THICKNESS;
use crate::persistence::BestScoreStore;
use crate::platform::{ContainerRect, InputEvent};
use crate::presentation::Presentation;
use crate::settings::Settings;
use crate::tuning::{Tuning, TuningError};

/// Shown to the player when startup fails
pub const FATAL_NOTICE: &str = "The game failed to start. Check the console log for details.";

#[derive(Debug, Error)]
pub enum InitError {
    #[error("game container not found")]
    MissingContainer,
    #[error("invalid tuning: {0}")]
    Tuning(#[from] TuningError),
}

/// Startup parameters, read once
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: u64,
    /// `None` when the host could not find its play container
    pub container: Option<ContainerRect>,
    pub tuning: Tuning,
    pub settings: Settings,
}

impl GameConfig {
    pub fn new(seed: u64, container: Option<ContainerRect>) -> Self {
        Self {
            seed,
            container,
            tuning: Tuning::default(),
            settings: Settings::default(),
        }
    }
}

/// The external collaborators a session talks to
pub struct Host<W, P, A, S> {
    pub world: W,
    pub presentation: P,
    pub audio: A,
    pub store: S,
}

/// One play session on top of a physics engine
pub struct MonsterGame<W, P, A, S> {
    state: GameState,
    tuning: Tuning,
    settings: Settings,
    drops: DropController,
    registry: BodyRegistry,
    scheduler: Scheduler,
    world: W,
    presentation: P,
    audio: A,
    store: S,
}

impl<W, P, A, S> MonsterGame<W, P, A, S>
where
    W: PhysicsWorld,
    P: Presentation,
    A: AudioSink,
    S: BestScoreStore,
{
    /// Build the container walls, start the engine and hang the first piece
    ///
    /// A missing container is fatal: the player gets a single notice and the
    /// engine is never started.
    pub fn new(config: GameConfig, host: Host<W, P, A, S>) -> Result<Self, InitError> {
        let Host {
            mut world,
            mut presentation,
            mut audio,
            store,
        } = host;

        let Some(container) = config.container else {
            log::error!("Critical initialization error: game container not found");
            presentation.show_fatal_notice(FATAL_NOTICE);
            return Err(InitError::MissingContainer);
        };
        if let Err(e) = config.tuning.validate() {
            log::error!("Critical initialization error: {}", e);
            presentation.show_fatal_notice(FATAL_NOTICE);
            return Err(e.into());
        }
        let container = container.or_default_size();

        let best = load_best(&store);
        let mut drops = DropController::new(config.seed, container);
        let next = drops.draw_tier(&config.tuning);
        let mut state = GameState::new(config.seed, next, best);
        state.continuous_mode = config.settings.continuous_drop;
        state.music_enabled = config.settings.music_enabled;
        audio.set_enabled(state.music_enabled);

        let mut registry = BodyRegistry::new();
        for wall in walls(&container) {
            let handle = world.add_static(wall);
            registry.register_static(handle);
        }
        presentation.update_score_display(0, best);

        let mut game = Self {
            state,
            tuning: config.tuning,
            settings: config.settings,
            drops,
            registry,
            scheduler: Scheduler::new(),
            world,
            presentation,
            audio,
            store,
        };
        game.world.start();
        game.prepare_next();

        log::info!(
            "Game initialized (seed {}, container {}x{})",
            config.seed,
            container.width,
            container.height
        );
        Ok(game)
    }

    // === Drop lifecycle ===

    /// Hang the queued piece and queue another; no-op after game over
    pub fn prepare_next(&mut self) -> Option<PendingDrop> {
        let pending = self.drops.prepare_next(&mut self.state, &self.tuning)?;
        self.presentation.show_next_preview(self.state.next_tier.spec());
        self.presentation.show_pending_preview(pending.spec());
        self.presentation.move_pending_preview(pending.target_x);
        Some(pending)
    }

    /// Aim the hanging piece at a client x
    pub fn set_target_x(&mut self, client_x: f32) -> Option<f32> {
        let x = self.drops.set_target_x(&mut self.state, client_x)?;
        self.presentation.move_pending_preview(x);
        Some(x)
    }

    /// Drop the hanging piece, if a drop is allowed right now
    pub fn drop_piece(&mut self) -> Option<DroppedPiece> {
        let dropped = self.drops.drop(
            &mut self.state,
            &mut self.world,
            &mut self.registry,
            &mut self.scheduler,
            &self.tuning,
        )?;
        self.presentation.clear_pending_preview();
        self.play(SoundEffect::Drop);
        Some(dropped)
    }

    /// Begin press-and-hold dropping; a no-op if a cycle is already armed
    fn start_continuous_drop(&mut self) {
        if self.drops.is_continuous_active() {
            return;
        }
        self.run_continuous_cycle();
    }

    /// One hold-to-drop cycle: drop if possible, then re-arm
    fn run_continuous_cycle(&mut self) {
        if !self.state.pointer_held || !self.state.continuous_mode || self.state.game_over {
            self.drops.stop_continuous(&mut self.scheduler);
            return;
        }
        if !self.state.drop_in_flight {
            self.drop_piece();
        }
        self.drops.arm_continuous(&mut self.scheduler, &self.tuning);
    }

    // === Engine callbacks ===

    /// Resolve one collision-start batch from the engine
    pub fn on_collision_start(&mut self, pairs: &[CollisionPair]) -> Vec<MergeEvent> {
        if self.state.game_over {
            return Vec::new();
        }

        let events = merge::resolve_collisions(pairs, &mut self.world, &mut self.registry);
        for event in &events {
            self.state.merges += 1;
            self.add_score(event.points);
            self.play(SoundEffect::Merge);
            self.presentation.show_fusion_effect(event.position, &event.tier.spec().visual);
            if self.tuning.arm_merged_pieces {
                settle::arm(&mut self.scheduler, event.spawned, &self.tuning);
            }
        }
        events
    }

    /// Award points; ignored once the game is over
    pub fn add_score(&mut self, points: u64) {
        if self.state.game_over {
            return;
        }
        let update = self.state.scoreboard.add(points, &mut self.store);
        if update.new_best {
            log::debug!("New best score {}", update.best);
        }
        self.presentation.update_score_display(update.score, update.best);
    }

    // === Time ===

    /// Move the clock forward, firing every timer that comes due on the way
    pub fn advance(&mut self, dt_ms: u64) {
        let until = self.scheduler.now_ms().saturating_add(dt_ms);
        while let Some((id, task)) = self.scheduler.pop_due(until) {
            self.fire(id, task);
        }
        self.scheduler.set_now(until);
    }

    fn fire(&mut self, id: TimerId, task: TimerTask) {
        match task {
            TimerTask::PrepareNext => {
                self.prepare_next();
            }
            TimerTask::SettleCheck(handle) => self.check_settled(handle),
            TimerTask::ContinuousDrop => {
                if self.drops.take_continuous_fire(id) {
                    self.run_continuous_cycle();
                }
            }
        }
    }

    fn check_settled(&mut self, handle: BodyHandle) {
        let verdict = settle::evaluate(self.state.game_over, self.world.body(handle), &self.tuning);
        match verdict {
            SettleVerdict::GameOver => self.trigger_game_over(),
            other => log::trace!("Settle check {:?}: {:?}", handle, other),
        }
    }

    fn trigger_game_over(&mut self) {
        if self.state.game_over {
            return;
        }
        self.state.game_over = true;
        self.drops.stop_continuous(&mut self.scheduler);
        self.world.stop();
        self.presentation.show_game_over(self.state.score());
        log::info!(
            "Game over: score {} (best {})",
            self.state.score(),
            self.state.best_score()
        );
    }

    // === Input ===

    /// Dispatch a player interaction
    pub fn handle_input(&mut self, event: InputEvent) {
        if event.is_gesture() {
            self.unlock_music();
        }

        match event {
            InputEvent::PointerMove { client_x } => {
                self.set_target_x(client_x);
            }
            InputEvent::PointerDown {
                client_x,
                on_overlay,
            } => {
                if on_overlay || self.state.game_over {
                    return;
                }
                self.state.pointer_held = true;
                self.set_target_x(client_x);
                if self.state.continuous_mode {
                    self.start_continuous_drop();
                } else if !self.state.drop_in_flight {
                    self.drop_piece();
                }
            }
            InputEvent::PointerUp | InputEvent::PointerLeave => {
                self.state.pointer_held = false;
                self.drops.stop_continuous(&mut self.scheduler);
            }
            InputEvent::Click { on_overlay } => {
                // Continuous mode drops from press/release instead
                if self.state.continuous_mode || on_overlay {
                    return;
                }
                if self.state.drop_in_flight || self.state.game_over {
                    return;
                }
                self.drop_piece();
            }
            InputEvent::ToggleContinuous => {
                self.toggle_continuous();
            }
            InputEvent::ToggleMusic => {
                self.toggle_music();
            }
            InputEvent::Restart => self.restart(),
        }
    }

    /// Flip continuous-drop mode; turning it off tears down the hold timer
    pub fn toggle_continuous(&mut self) -> bool {
        self.state.continuous_mode = !self.state.continuous_mode;
        self.settings.continuous_drop = self.state.continuous_mode;
        if !self.state.continuous_mode {
            self.drops.stop_continuous(&mut self.scheduler);
        }
        self.persist_settings();
        log::info!(
            "Continuous drop {}",
            if self.state.continuous_mode { "on" } else { "off" }
        );
        self.state.continuous_mode
    }

    /// Flip music (and sound effects)
    pub fn toggle_music(&mut self) -> bool {
        let on = !self.state.music_enabled;
        self.state.music_enabled = on;
        self.settings.music_enabled = on;
        self.audio.set_enabled(on);
        if on {
            if let Err(e) = self.audio.start_music() {
                log::info!("BGM play failed: {}", e);
            }
        } else {
            self.audio.stop_music();
        }
        self.persist_settings();
        on
    }

    fn persist_settings(&mut self) {
        if let Err(e) = self.store.save_settings(&self.settings) {
            log::warn!("Failed to save settings: {}", e);
        }
    }

    /// Browsers block audio until a user gesture; retry on each one until it plays
    fn unlock_music(&mut self) {
        if !self.state.music_enabled || self.audio.is_music_playing() {
            return;
        }
        match self.audio.start_music() {
            Ok(()) => log::info!("BGM started via user interaction"),
            Err(e) => log::info!("Initial BGM play failed (will retry): {}", e),
        }
    }

    fn play(&mut self, effect: SoundEffect) {
        if !self.state.music_enabled {
            return;
        }
        if let Err(e) = self.audio.play(effect) {
            log::info!("{:?} sound play failed: {}", effect, e);
        }
    }

    /// Start a new session in the same container; the best score carries over
    pub fn restart(&mut self) {
        let pieces = self.registry.clear_pieces();
        self.world.remove_bodies(&pieces);
        self.scheduler.clear();
        self.drops.reset_timer_slot();

        let stored = load_best(&self.store);
        self.state.scoreboard.reset(stored);
        self.state.game_over = false;
        self.state.drop_in_flight = false;
        self.state.pointer_held = false;
        self.state.pending = None;
        self.state.drops = 0;
        self.state.merges = 0;
        self.state.next_tier = self.drops.draw_tier(&self.tuning);

        self.presentation.update_score_display(0, self.state.best_score());
        self.world.start();
        self.prepare_next();
        log::info!("Restarted (best {})", self.state.best_score());
    }

    // === Accessors ===

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn score(&self) -> u64 {
        self.state.score()
    }

    pub fn best_score(&self) -> u64 {
        self.state.best_score()
    }

    pub fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Current preferences, including toggles made during play
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn container(&self) -> &ContainerRect {
        self.drops.container()
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    /// For hosts that step or script the engine directly
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Stored best score, 0 (and a warning) if storage fails
fn load_best<S: BestScoreStore + ?Sized>(store: &S) -> u64 {
    store.load_best_score().unwrap_or_else(|e| {
        log::warn!("Failed to load best score, starting from 0: {}", e);
        0
    })
}

/// Ground below the floor plus left and right walls, just outside the container
fn walls(container: &ContainerRect) -> [StaticShape; 3] {
    let (w, h) = (container.width, container.height);
    let t = WALL_THICKNESS;
    [
        StaticShape::Rect {
            center: Vec2::new(w / 2.0, h + t / 2.0),
            size: Vec2::new(w, t),
        },
        StaticShape::Rect {
            center: Vec2::new(-t / 2.0, h / 2.0),
            size: Vec2::new(t, h),
        },
        StaticShape::Rect {
            center: Vec2::new(w + t / 2.0, h / 2.0),
            size: Vec2::new(t, h),
        },
    ]
}
