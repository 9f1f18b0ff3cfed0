//! Monster Drop entry point
//!
//! The browser build exports `WebGame`: the host page
//! hands it a physics engine wrapper and a view, then forwards input, frame
//! time and collision batches. Natively this runs a short scripted session against the
//! in-memory world so the rules can be exercised from a terminal.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use glam::Vec2;
    use wasm_bindgen::prelude::*;

    use monster_drop::Settings;
    use monster_drop::audio::WebAudio;
    use monster_drop::persistence::LocalStore;
    use monster_drop::platform::{ContainerRect, InputEvent};
    use monster_drop::presentation::Presentation;
    use monster_drop::sim::{
        BodyHandle, BodyState, CollisionPair, GameConfig, Host, MonsterGame, PhysicsWorld,
        PieceSpawn, StaticShape, TierSpec, Visual,
    };

    // Objects supplied by the host page
    #[wasm_bindgen]
    extern "C" {
        /// Rigid-body engine wrapper
        pub type Engine;

        #[wasm_bindgen(method, js_name = addStatic)]
        fn add_static(this: &Engine, cx: f32, cy: f32, width: f32, height: f32) -> u32;

        #[wasm_bindgen(method, js_name = addPiece)]
        fn add_piece(
            this: &Engine,
            x: f32,
            y: f32,
            radius: f32,
            tier: u8,
            restitution: Option<f32>,
            friction: Option<f32>,
        ) -> u32;

        #[wasm_bindgen(method, js_name = removeBody)]
        fn remove_body(this: &Engine, handle: u32);

        /// `[x, y, vx, vy, isStatic]`, empty once the body is gone
        #[wasm_bindgen(method, js_name = bodyState)]
        fn body_state(this: &Engine, handle: u32) -> Vec<f32>;

        #[wasm_bindgen(method)]
        fn start(this: &Engine);

        #[wasm_bindgen(method)]
        fn stop(this: &Engine);

        #[wasm_bindgen(method, js_name = isRunning)]
        fn is_running(this: &Engine) -> bool;

        /// DOM side of the game: previews, effects, score and overlays
        pub type View;

        #[wasm_bindgen(method, js_name = showPendingPreview)]
        fn show_pending_preview(this: &View, tier: u8, radius: f32, color: &str, sprite: &str);

        #[wasm_bindgen(method, js_name = movePendingPreview)]
        fn move_pending_preview(this: &View, x: f32);

        #[wasm_bindgen(method, js_name = clearPendingPreview)]
        fn clear_pending_preview(this: &View);

        #[wasm_bindgen(method, js_name = showNextPreview)]
        fn show_next_preview(this: &View, tier: u8, radius: f32, color: &str, sprite: &str);

        #[wasm_bindgen(method, js_name = showFusionEffect)]
        fn show_fusion_effect(this: &View, x: f32, y: f32, color: &str);

        #[wasm_bindgen(method, js_name = updateScoreDisplay)]
        fn update_score_display(this: &View, score: f64, best: f64);

        #[wasm_bindgen(method, js_name = showGameOver)]
        fn show_game_over(this: &View, score: f64);

        #[wasm_bindgen(method, js_name = showFatalNotice)]
        fn show_fatal_notice(this: &View, message: &str);
    }

    struct JsWorld(Engine);

    impl PhysicsWorld for JsWorld {
        fn add_static(&mut self, shape: StaticShape) -> BodyHandle {
            let StaticShape::Rect { center, size } = shape;
            BodyHandle(self.0.add_static(center.x, center.y, size.x, size.y))
        }

        fn add_piece(&mut self, spawn: PieceSpawn) -> BodyHandle {
            let material = spawn.material;
            BodyHandle(self.0.add_piece(
                spawn.position.x,
                spawn.position.y,
                spawn.radius,
                spawn.tier.rank(),
                material.map(|m| m.restitution),
                material.map(|m| m.friction),
            ))
        }

        fn remove_bodies(&mut self, handles: &[BodyHandle]) {
            for handle in handles {
                self.0.remove_body(handle.0);
            }
        }

        fn body(&self, handle: BodyHandle) -> Option<BodyState> {
            match self.0.body_state(handle.0).as_slice() {
                &[x, y, vx, vy, is_static] => Some(BodyState {
                    position: Vec2::new(x, y),
                    velocity: Vec2::new(vx, vy),
                    is_static: is_static != 0.0,
                }),
                _ => None,
            }
        }

        fn start(&mut self) {
            self.0.start();
        }

        fn stop(&mut self) {
            self.0.stop();
        }

        fn is_running(&self) -> bool {
            self.0.is_running()
        }
    }

    struct JsPresentation(View);

    impl Presentation for JsPresentation {
        fn show_pending_preview(&mut self, tier: &TierSpec) {
            let color = tier.visual.color_hex();
            self.0.show_pending_preview(tier.tier.rank(), tier.radius, &color, tier.visual.sprite);
        }

        fn move_pending_preview(&mut self, x: f32) {
            self.0.move_pending_preview(x);
        }

        fn clear_pending_preview(&mut self) {
            self.0.clear_pending_preview();
        }

        fn show_next_preview(&mut self, tier: &TierSpec) {
            let color = tier.visual.color_hex();
            self.0.show_next_preview(tier.tier.rank(), tier.radius, &color, tier.visual.sprite);
        }

        fn show_fusion_effect(&mut self, position: Vec2, visual: &Visual) {
            self.0.show_fusion_effect(position.x, position.y, &visual.color_hex());
        }

        fn update_score_display(&mut self, score: u64, best: u64) {
            self.0.update_score_display(score as f64, best as f64);
        }

        fn show_game_over(&mut self, score: u64) {
            self.0.show_game_over(score as f64);
        }

        fn show_fatal_notice(&mut self, message: &str) {
            self.0.show_fatal_notice(message);
        }
    }

    /// Game session exported to the host page
    #[wasm_bindgen]
    pub struct WebGame {
        game: MonsterGame<JsWorld, JsPresentation, WebAudio, LocalStore>,
    }

    #[wasm_bindgen]
    impl WebGame {
        /// `container_left` is `undefined` when the page has no play container
        #[wasm_bindgen(constructor)]
        pub fn new(
            engine: Engine,
            view: View,
            container_left: Option<f32>,
            width: f32,
            height: f32,
        ) -> Result<WebGame, JsError> {
            let settings = Settings::load();
            let seed = js_sys::Date::now() as u64;
            let container = container_left.map(|left| ContainerRect::new(left, width, height));
            let config = GameConfig {
                settings: settings.clone(),
                ..GameConfig::new(seed, container)
            };
            let host = Host {
                world: JsWorld(engine),
                presentation: JsPresentation(view),
                audio: WebAudio::new(&settings),
                store: LocalStore,
            };
            let game = MonsterGame::new(config, host)?;
            Ok(Self { game })
        }

        #[wasm_bindgen(js_name = pointerMove)]
        pub fn pointer_move(&mut self, client_x: f32) {
            self.game.handle_input(InputEvent::PointerMove { client_x });
        }

        #[wasm_bindgen(js_name = pointerDown)]
        pub fn pointer_down(&mut self, client_x: f32, on_overlay: bool) {
            self.game.handle_input(InputEvent::PointerDown {
                client_x,
                on_overlay,
            });
        }

        #[wasm_bindgen(js_name = pointerUp)]
        pub fn pointer_up(&mut self) {
            self.game.handle_input(InputEvent::PointerUp);
        }

        #[wasm_bindgen(js_name = pointerLeave)]
        pub fn pointer_leave(&mut self) {
            self.game.handle_input(InputEvent::PointerLeave);
        }

        pub fn click(&mut self, on_overlay: bool) {
            self.game.handle_input(InputEvent::Click { on_overlay });
        }

        #[wasm_bindgen(js_name = toggleContinuous)]
        pub fn toggle_continuous(&mut self) {
            self.game.handle_input(InputEvent::ToggleContinuous);
        }

        #[wasm_bindgen(js_name = toggleMusic)]
        pub fn toggle_music(&mut self) {
            self.game.handle_input(InputEvent::ToggleMusic);
        }

        pub fn restart(&mut self) {
            self.game.handle_input(InputEvent::Restart);
        }

        /// Run timers up to `dt_ms` of elapsed page time
        pub fn advance(&mut self, dt_ms: f64) {
            self.game.advance(dt_ms.max(0.0) as u64);
        }

        /// Engine collision-start batch as flat `[a0, b0, a1, b1, ...]` handles
        #[wasm_bindgen(js_name = collisionStart)]
        pub fn collision_start(&mut self, handles: Vec<u32>) {
            let pairs: Vec<CollisionPair> = handles
                .chunks_exact(2)
                .map(|p| CollisionPair::new(BodyHandle(p[0]), BodyHandle(p[1])))
                .collect();
            self.game.on_collision_start(&pairs);
        }

        pub fn score(&self) -> f64 {
            self.game.score() as f64
        }

        #[wasm_bindgen(js_name = bestScore)]
        pub fn best_score(&self) -> f64 {
            self.game.best_score() as f64
        }

        #[wasm_bindgen(js_name = isGameOver)]
        pub fn is_game_over(&self) -> bool {
            self.game.is_game_over()
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    monster_drop::platform::init_logging();
    log::info!("Monster Drop core loaded");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use monster_drop::Settings;
    use monster_drop::audio::NullAudio;
    use monster_drop::persistence::FileStore;
    use monster_drop::platform::{self, ContainerRect};
    use monster_drop::presentation::LogPresentation;
    use monster_drop::sim::{GameConfig, Host, MemoryWorld, MonsterGame};

    platform::init_logging();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or_else(time_seed);
    log::info!("Monster Drop (native) starting with seed {}", seed);

    let store = FileStore::in_config_dir();
    log::info!("Best score file: {}", store.path().display());

    let config = GameConfig {
        settings: Settings::load(),
        ..GameConfig::new(seed, Some(ContainerRect::default()))
    };
    let host = Host {
        world: MemoryWorld::new(),
        presentation: LogPresentation,
        audio: NullAudio::new(),
        store,
    };
    let mut game = match MonsterGame::new(config, host) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    demo::run(&mut game);

    let state = game.state();
    println!(
        "\nDrops: {}  Merges: {}  Score: {}  Best: {}  Game over: {}",
        state.drops,
        state.merges,
        state.score(),
        state.best_score(),
        state.game_over
    );
    match serde_json::to_string_pretty(state) {
        Ok(json) => println!("{}", json),
        Err(e) => log::warn!("Failed to serialize state: {}", e),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn time_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Scripted session: the "engine" here is a hand-driven [`MemoryWorld`]
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;
    use monster_drop::audio::AudioSink;
    use monster_drop::consts::DEFAULT_CONTAINER_HEIGHT;
    use monster_drop::persistence::BestScoreStore;
    use monster_drop::platform::InputEvent;
    use monster_drop::presentation::Presentation;
    use monster_drop::sim::{
        BodyHandle, CollisionPair, MemoryWorld, MonsterGame, PhysicsWorld, Tier,
    };

    const LANES: [f32; 8] = [60.0, 110.0, 160.0, 210.0, 260.0, 310.0, 340.0, 200.0];

    pub fn run<P, A, S>(game: &mut MonsterGame<MemoryWorld, P, A, S>)
    where
        P: Presentation,
        A: AudioSink,
        S: BestScoreStore,
    {
        for round in 0..3 {
            for &lane in &LANES {
                drop_and_land(game, lane);
            }
            let merges = merge_neighbours(game);
            log::info!("Round {}: {} merges", round + 1, merges);
        }

        // Let the remaining settle checks run; everything is on the floor
        game.advance(2_000);
        log::info!("Score after play: {}", game.score());

        // Wedge one piece near the top and wait for the settle check
        game.handle_input(InputEvent::PointerMove { client_x: 200.0 });
        if let Some(piece) = game.drop_piece() {
            game.world_mut().place(piece.handle, Vec2::new(200.0, 10.0), Vec2::ZERO);
        }
        game.advance(2_000);
        if !game.is_game_over() {
            log::warn!("Expected the stacked piece to end the game");
        }
    }

    /// Aim, click, then rest the new piece on the floor
    fn drop_and_land<P, A, S>(game: &mut MonsterGame<MemoryWorld, P, A, S>, client_x: f32)
    where
        P: Presentation,
        A: AudioSink,
        S: BestScoreStore,
    {
        game.handle_input(InputEvent::PointerMove { client_x });
        game.handle_input(InputEvent::Click { on_overlay: false });
        let landed = game
            .registry()
            .pieces()
            .last()
            .map(|(handle, entry)| (handle, entry.tier));
        if let Some((handle, tier)) = landed {
            let y = DEFAULT_CONTAINER_HEIGHT - tier.spec().radius;
            let x = game.world().body(handle).map_or(client_x, |b| b.position.x);
            game.world_mut().place(handle, Vec2::new(x, y), Vec2::ZERO);
        }
        game.advance(1_000);
    }

    /// Report every same-tier pair as touching, one batch per pass
    fn merge_neighbours<P, A, S>(game: &mut MonsterGame<MemoryWorld, P, A, S>) -> usize
    where
        P: Presentation,
        A: AudioSink,
        S: BestScoreStore,
    {
        let mut total = 0;
        loop {
            let mut pieces: Vec<(BodyHandle, Tier)> = game
                .registry()
                .pieces()
                .map(|(handle, entry)| (handle, entry.tier))
                .collect();
            pieces.sort_by_key(|&(handle, tier)| (tier, handle));
            let pairs: Vec<CollisionPair> = pieces
                .windows(2)
                .filter(|w| w[0].1 == w[1].1)
                .map(|w| CollisionPair::new(w[0].0, w[1].0))
                .collect();
            let merged = game.on_collision_start(&pairs).len();
            if merged == 0 {
                return total;
            }
            total += merged;
        }
    }
}
