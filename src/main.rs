//! Gem Snap entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, Element, HtmlButtonElement, HtmlCanvasElement, HtmlInputElement, KeyboardEvent,
        MouseEvent, TouchEvent,
    };

    use gem_snap::audio::{AudioManager, SoundEffect};
    use gem_snap::consts::*;
    use gem_snap::leaderboard::{
        FetchOutcome, LeaderboardBackend, LeaderboardConfig, LeaderboardEntry, RestLeaderboard,
        format_age, now_ms,
    };
    use gem_snap::platform::{FrameLoop, ListenerHandle, PlayfieldRect};
    use gem_snap::renderer::{Scene, SdfRenderState};
    use gem_snap::sim::GemKind;
    use gem_snap::{GamePhase, Leaderboard, LocalLeaderboard, Runner, Settings};

    type Board = Leaderboard<Box<dyn LeaderboardBackend>>;

    /// Everything the page owns
    struct App {
        runner: Runner,
        render_state: Option<SdfRenderState>,
        settings: Settings,
        audio: AudioManager,
        board: Board,
        canvas: HtmlCanvasElement,
        frames: Option<FrameLoop>,
        /// Canvas pointer listeners, attached only while a run is live
        pointer: Vec<ListenerHandle>,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl App {
        fn new(seed: u64, canvas: HtmlCanvasElement, board: Board) -> Self {
            let settings = Settings::load();
            let mut audio = AudioManager::new();
            audio.apply_settings(&settings);
            Self {
                runner: Runner::new(seed),
                render_state: None,
                settings,
                audio,
                board,
                canvas,
                frames: None,
                pointer: Vec::new(),
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// One animation frame. Returns whether another frame is wanted.
        fn frame(&mut self, time: f64) -> bool {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            self.last_time = time;

            self.runner.update(dt);
            self.track_fps(time);
            self.handle_events();
            self.render(time);
            self.update_hud();

            if self.runner.wants_frames() {
                return true;
            }

            // Run ended: stop listening to the canvas and show the end screen
            self.pointer.clear();
            self.last_time = 0.0;
            self.show_screen();
            false
        }

        fn track_fps(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            // Calculate FPS from oldest to newest frame
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Toasts and sounds for everything the session reported
        fn handle_events(&mut self) {
            let Some(document) = document() else { return };
            for event in self.runner.game.drain_events() {
                toast(&document, &event.message());
                if let Some(effect) = SoundEffect::for_event(&event) {
                    self.audio.play(effect);
                }
            }
        }

        fn render(&mut self, time: f64) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            let (w, h) = render_state.size;
            let scene = Scene::build(
                &self.runner.field,
                &self.runner.game,
                &self.settings,
                w as f32,
                h as f32,
            );
            match render_state.render(&scene, time) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    render_state.reconfigure();
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = document() else { return };
            let hud = self.runner.game.hud();

            set_text(&document, "hud-score", &hud.score.to_string());
            set_text(
                &document,
                "hud-snaps",
                &format!("{}/{}", hud.snaps, SNAPS_TO_WIN),
            );
            set_text(&document, "hud-lives", &"\u{2665}".repeat(hud.lives as usize));
            set_text(
                &document,
                "hud-difficulty",
                &format!("Difficulty Level: {}", hud.difficulty),
            );
            for kind in GemKind::ALL {
                set_text(
                    &document,
                    &format!("count-{}", kind.css()),
                    &hud.counts[kind.index()].to_string(),
                );
                if let Some(el) = document.get_element_by_id(&format!("gem-{}", kind.css())) {
                    let _ = el
                        .class_list()
                        .toggle_with_force("collected", hud.counts[kind.index()] > 0);
                }
            }

            set_hidden(&document, "snap-btn", !hud.can_snap);
            set_hidden(&document, "hud-fps", !self.settings.show_fps);
            if self.settings.show_fps {
                set_text(&document, "hud-fps", &format!("{} FPS", self.fps));
            }
        }

        /// Show the overlay matching the session phase
        fn show_screen(&self) {
            let Some(document) = document() else { return };
            let phase = self.runner.game.phase;

            set_hidden(&document, "menu", phase != GamePhase::Menu);
            set_hidden(&document, "hud", phase != GamePhase::Playing);

            let ended = matches!(phase, GamePhase::GameOver | GamePhase::Victory);
            set_hidden(&document, "end-screen", !ended);
            set_hidden(&document, "leaderboard", phase == GamePhase::Playing);
            if ended {
                let title = if phase == GamePhase::Victory {
                    "Victory!"
                } else {
                    "Game Over"
                };
                set_text(&document, "end-title", title);
                set_text(&document, "final-score", &self.runner.game.score.to_string());
                set_text(&document, "final-snaps", &self.runner.game.snaps.to_string());
                set_hidden(&document, "submit-form", false);
                if let Some(input) = input_by_id(&document, "name-input") {
                    input.set_value("");
                }
                if let Some(btn) = button_by_id(&document, "submit-btn") {
                    btn.set_disabled(true);
                }
            }
        }

        fn resize_canvas(&mut self) {
            let Some(window) = web_sys::window() else { return };
            let dpr = window.device_pixel_ratio();
            let width = (self.canvas.client_width() as f64 * dpr) as u32;
            let height = (self.canvas.client_height() as f64 * dpr) as u32;
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            if let Some(render_state) = self.render_state.as_mut() {
                render_state.resize(width, height);
            }
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    fn input_by_id(document: &Document, id: &str) -> Option<HtmlInputElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn button_by_id(document: &Document, id: &str) -> Option<HtmlButtonElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    /// Short-lived notification
    fn toast(document: &Document, text: &str) {
        let Some(container) = document.get_element_by_id("toasts") else {
            return;
        };
        let Ok(el) = document.create_element("div") else {
            return;
        };
        el.set_class_name("toast");
        el.set_text_content(Some(text));
        if container.append_child(&el).is_err() {
            return;
        }
        let remove = Closure::once_into_js(move || el.remove());
        if let Some(window) = web_sys::window() {
            let _ = window
                .set_timeout_with_callback_and_timeout_and_arguments_0(remove.unchecked_ref(), 2500);
        }
    }

    /// Fill the leaderboard list
    fn render_leaderboard(outcome: &FetchOutcome) {
        let Some(document) = document() else { return };
        let Some(list) = document.get_element_by_id("leaderboard-list") else {
            return;
        };
        list.set_text_content(None);

        if outcome.error.is_some() {
            set_text(&document, "leaderboard-status", "Leaderboard unavailable");
        } else if outcome.entries.is_empty() {
            set_text(&document, "leaderboard-status", "No scores yet");
        } else {
            set_text(&document, "leaderboard-status", "");
        }

        let now = now_ms();
        for (rank, entry) in outcome.entries.iter().enumerate() {
            if let Some(row) = leaderboard_row(&document, rank + 1, entry, now) {
                let _ = list.append_child(&row);
            }
        }
    }

    fn leaderboard_row(
        document: &Document,
        rank: usize,
        entry: &LeaderboardEntry,
        now: f64,
    ) -> Option<Element> {
        let row = document.create_element("li").ok()?;
        let cells = [
            ("rank", format!("#{}", rank)),
            ("name", entry.player_name.clone()),
            ("score", entry.score.to_string()),
            ("snaps", format!("{} snaps", entry.snaps_completed)),
            ("age", format_age(&entry.created_at, now)),
        ];
        for (class, text) in cells {
            let cell = document.create_element("span").ok()?;
            cell.set_class_name(class);
            cell.set_text_content(Some(&text));
            row.append_child(&cell).ok()?;
        }
        Some(row)
    }

    fn refresh_leaderboard(board: &Board) {
        board.fetch_top(LEADERBOARD_SIZE, |outcome| render_leaderboard(&outcome));
    }

    /// Pick the remote leaderboard if the page configures one
    fn make_board() -> Board {
        let backend: Box<dyn LeaderboardBackend> = match LeaderboardConfig::from_document() {
            Some(config) => {
                log::info!("Using remote leaderboard at {}", config.endpoint);
                Box::new(RestLeaderboard::new(config))
            }
            None => {
                log::info!("No remote leaderboard configured, using LocalStorage");
                Box::new(LocalLeaderboard::load())
            }
        };
        Leaderboard::new(backend)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Gem Snap starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        set_hidden(&document, "loading", true);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let seed = js_sys::Date::now() as u64;
        let board = make_board();
        let app = Rc::new(RefCell::new(App::new(seed, canvas.clone(), board.clone())));
        app.borrow_mut().resize_canvas();

        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                let adapter = instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await;
                match adapter {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        let (w, h) = (canvas.width(), canvas.height());
                        match SdfRenderState::new(surface, &adapter, w, h).await {
                            Ok(mut render_state) => {
                                render_state.set_start_time(0.0);
                                app.borrow_mut().render_state = Some(render_state);
                            }
                            Err(e) => log::error!("Failed to create device: {}", e),
                        }
                    }
                    Err(e) => log::error!("Failed to get adapter: {}", e),
                }
            }
            Err(e) => log::error!("Failed to create surface: {}", e),
        }

        // Frame loop drives the app while a run is live
        {
            let frame_app = app.clone();
            let frames = FrameLoop::new(move |time| frame_app.borrow_mut().frame(time));
            app.borrow_mut().frames = Some(frames);
        }

        let listeners = setup_page_handlers(&app);
        // Page-level listeners live as long as the page
        std::mem::forget(listeners);

        {
            let mut a = app.borrow_mut();
            a.show_screen();
            a.update_hud();
            a.render(0.0);
        }
        refresh_leaderboard(&board);

        log::info!("Gem Snap running!");
    }

    /// Start (or restart) a run: attach pointer input and start frames
    fn start_run(app: &Rc<RefCell<App>>) {
        let pointer = pointer_handlers(app);
        let mut a = app.borrow_mut();
        a.audio.resume();
        if !a.runner.begin_quest() {
            return;
        }
        a.pointer = pointer;
        a.last_time = 0.0;
        a.show_screen();
        a.update_hud();
        if let Some(frames) = a.frames.as_ref() {
            frames.start();
        }
    }

    /// Leave the run and cancel the pending frame
    fn return_to_menu(app: &Rc<RefCell<App>>) {
        let mut a = app.borrow_mut();
        if let Some(frames) = a.frames.as_ref() {
            frames.stop();
        }
        a.runner.return_to_menu();
        a.pointer.clear();
        a.last_time = 0.0;
        a.show_screen();
        a.update_hud();
        a.render(0.0);
    }

    fn try_snap(app: &Rc<RefCell<App>>) {
        let mut a = app.borrow_mut();
        if a.runner.snap() {
            a.update_hud();
        }
    }

    fn pointer_handlers(app: &Rc<RefCell<App>>) -> Vec<ListenerHandle> {
        let canvas = app.borrow().canvas.clone();
        let mut handles = Vec::new();

        // Mouse move
        {
            let app = app.clone();
            let target = canvas.clone();
            let handle = ListenerHandle::attach(&canvas, "mousemove", move |event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    let rect = PlayfieldRect::of_element(&target);
                    app.borrow_mut()
                        .runner
                        .set_pointer_x(rect.pointer_x(event.client_x() as f32));
                }
            });
            handles.extend(handle.ok());
        }

        // Touch start/move: one finger steers, page must not scroll
        for name in ["touchstart", "touchmove"] {
            let app = app.clone();
            let target = canvas.clone();
            let handle = ListenerHandle::attach_active(&canvas, name, move |event| {
                event.prevent_default();
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                if let Some(touch) = event.touches().get(0) {
                    let rect = PlayfieldRect::of_element(&target);
                    app.borrow_mut()
                        .runner
                        .set_pointer_x(rect.pointer_x(touch.client_x() as f32));
                }
            });
            handles.extend(handle.ok());
        }

        handles
    }

    fn on_click(
        document: &Document,
        id: &str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Option<ListenerHandle> {
        let el = document.get_element_by_id(id)?;
        ListenerHandle::attach(&el, "click", handler).ok()
    }

    fn setup_page_handlers(app: &Rc<RefCell<App>>) -> Vec<ListenerHandle> {
        let Some(window) = web_sys::window() else {
            return Vec::new();
        };
        let Some(document) = window.document() else {
            return Vec::new();
        };
        let mut handles = Vec::new();

        for id in ["begin-btn", "play-again-btn"] {
            let app = app.clone();
            handles.extend(on_click(&document, id, move |_| start_run(&app)));
        }

        {
            let app = app.clone();
            handles.extend(on_click(&document, "menu-btn", move |_| return_to_menu(&app)));
        }

        {
            let app = app.clone();
            handles.extend(on_click(&document, "snap-btn", move |_| try_snap(&app)));
        }

        // Mute toggle
        {
            let app = app.clone();
            handles.extend(on_click(&document, "mute-btn", move |_| {
                let mut a = app.borrow_mut();
                let muted = a.settings.toggle_mute();
                a.settings.save();
                let settings = a.settings.clone();
                a.audio.apply_settings(&settings);
                if let Some(document) = document() {
                    set_text(&document, "mute-btn", if muted { "Unmute" } else { "Mute" });
                }
            }));
        }

        // Submit enabled only for a non-blank name
        if let Some(input) = document.get_element_by_id("name-input") {
            let handle = ListenerHandle::attach(&input, "input", move |_| {
                let Some(document) = document() else { return };
                let name = input_by_id(&document, "name-input")
                    .map(|i| i.value())
                    .unwrap_or_default();
                if let Some(btn) = button_by_id(&document, "submit-btn") {
                    btn.set_disabled(!Board::can_submit(&name));
                }
            });
            handles.extend(handle.ok());
        }

        {
            let app = app.clone();
            handles.extend(on_click(&document, "submit-btn", move |_| submit_score(&app)));
        }

        // Keyboard
        {
            let app = app.clone();
            let handle = ListenerHandle::attach(&window, "keydown", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                // Typing a name must not trigger shortcuts
                let typing = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                    .is_some();
                if typing {
                    return;
                }
                match event.key().as_str() {
                    " " => try_snap(&app),
                    "Enter" => {
                        let phase = app.borrow().runner.game.phase;
                        if phase == GamePhase::Menu {
                            start_run(&app);
                        }
                    }
                    "i" | "I" => {
                        let mut a = app.borrow_mut();
                        a.runner.input.autopilot = !a.runner.input.autopilot;
                        log::info!("Autopilot: {}", a.runner.input.autopilot);
                    }
                    _ => {}
                }
            });
            handles.extend(handle.ok());
        }

        // Keep the canvas backing store matched to its CSS size
        {
            let app = app.clone();
            let handle = ListenerHandle::attach(&window, "resize", move |_| {
                let mut a = app.borrow_mut();
                a.resize_canvas();
                if !a.runner.wants_frames() {
                    a.render(0.0);
                }
            });
            handles.extend(handle.ok());
        }

        handles
    }

    fn submit_score(app: &Rc<RefCell<App>>) {
        let Some(document) = document() else { return };
        let name = input_by_id(&document, "name-input")
            .map(|i| i.value())
            .unwrap_or_default();
        let (board, score, snaps) = {
            let a = app.borrow();
            (a.board.clone(), a.runner.game.score, a.runner.game.snaps)
        };

        if let Some(btn) = button_by_id(&document, "submit-btn") {
            btn.set_disabled(true);
        }

        let app = app.clone();
        let list_board = board.clone();
        board.submit(&name, score, u32::from(snaps), move |ok| {
            let Some(document) = document() else { return };
            if ok {
                set_hidden(&document, "submit-form", true);
                toast(&document, "Score submitted!");
                app.borrow().audio.play(SoundEffect::ScoreSubmitted);
                refresh_leaderboard(&list_board);
            } else {
                toast(&document, "Could not submit score, try again");
                if let Some(btn) = button_by_id(&document, "submit-btn") {
                    btn.set_disabled(!Board::can_submit(&name_now(&document)));
                }
            }
        });
    }

    fn name_now(document: &Document) -> String {
        input_by_id(document, "name-input")
            .map(|i| i.value())
            .unwrap_or_default()
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Gem Snap (native) starting...");
    log::info!("Native mode runs a headless autopilot session - use `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);
    headless::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use gem_snap::consts::*;
    use gem_snap::{GamePhase, Leaderboard, LocalLeaderboard, Runner};

    /// Give up after ten simulated minutes
    const MAX_TICKS: u32 = 60 * 60 * 10;

    pub fn run(seed: u64) {
        let mut runner = Runner::new(seed);
        runner.input.autopilot = true;
        runner.begin_quest();

        let mut ticks = 0;
        while runner.wants_frames() && ticks < MAX_TICKS {
            ticks += runner.update(SIM_DT);
            if runner.game.can_snap() {
                runner.snap();
            }
            for event in runner.game.drain_events() {
                log::info!("{}", event.message());
            }
        }

        let game = &runner.game;
        let outcome = match game.phase {
            GamePhase::Victory => "victory",
            GamePhase::GameOver => "game over",
            _ => "time limit",
        };
        println!(
            "Seed {}: {} after {:.1}s - score {}, snaps {}/{}",
            seed,
            outcome,
            ticks as f32 * SIM_DT,
            game.score,
            game.snaps,
            SNAPS_TO_WIN
        );

        let board = Leaderboard::new(LocalLeaderboard::new());
        board.submit("Autopilot", game.score, u32::from(game.snaps), |ok| {
            log::info!("Score stored: {}", ok);
        });
        board.fetch_top(LEADERBOARD_SIZE, |outcome| {
            for (rank, entry) in outcome.entries.iter().enumerate() {
                println!(
                    "#{} {} {} ({} snaps)",
                    rank + 1,
                    entry.player_name,
                    entry.score,
                    entry.snaps_completed
                );
            }
        });
    }
}
