//! Gem Snap - a falling-gem catcher arcade game
//!
//! Core modules:
//! - `sim`: Deterministic field simulation (falling gems, spawning, catches)
//! - `game`: Session state machine (menu, playing, game over, victory)
//! - `runner`: Fixed timestep driver tying the field to the session
//! - `leaderboard`: Top-10 score board (remote service or LocalStorage)
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Browser input and frame scheduling
//! - `audio`: Procedural sound effects
//! - `settings`: Player preferences

pub mod audio;
pub mod game;
pub mod leaderboard;
pub mod platform;
pub mod renderer;
pub mod runner;
pub mod settings;
pub mod sim;

pub use game::{Collection, Game, GameEvent, GamePhase, HudSnapshot};
pub use leaderboard::{Leaderboard, LeaderboardEntry, LeaderboardError, LocalLeaderboard};
pub use runner::Runner;
pub use settings::Settings;

/// Game configuration constants
///
/// The field is expressed in percent: x and y both run 0..100 across the
/// visible canvas, y growing downward.
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta accepted by the runner (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Collector x is clamped to this range
    pub const PLAYER_MIN_X: f32 = 5.0;
    pub const PLAYER_MAX_X: f32 = 95.0;
    /// Collector starts centered
    pub const PLAYER_START_X: f32 = 50.0;
    /// Collector width in percent of the field
    pub const PLAYER_WIDTH: f32 = 15.0;

    /// Gem footprint in percent of the field
    pub const GEM_SIZE: f32 = 10.0;
    /// Spawned gems enter just above the visible field
    pub const GEM_SPAWN_Y: f32 = -5.0;
    /// Spawn x range
    pub const GEM_SPAWN_MIN_X: f32 = 10.0;
    pub const GEM_SPAWN_MAX_X: f32 = 90.0;
    /// Rotation added to every gem each tick (degrees)
    pub const GEM_SPIN_PER_TICK: f32 = 2.0;
    /// Fall speed (percent per tick) = base + difficulty * step
    pub const GEM_BASE_SPEED: f32 = 0.3;
    pub const GEM_SPEED_PER_LEVEL: f32 = 0.1;

    /// Catch band (exclusive) near the bottom of the field
    pub const CATCH_BAND_TOP: f32 = 85.0;
    pub const CATCH_BAND_BOTTOM: f32 = 95.0;
    /// Gems below this line are misses
    pub const FALL_THROUGH_Y: f32 = 105.0;

    /// Spawn interval (ms) = base - difficulty * step, never below the floor
    pub const SPAWN_BASE_MS: f64 = 2000.0;
    pub const SPAWN_STEP_MS: f64 = 200.0;
    pub const MIN_SPAWN_INTERVAL_MS: f64 = 400.0;

    /// Difficulty bounds and score per level
    pub const MIN_DIFFICULTY: u32 = 1;
    pub const MAX_DIFFICULTY: u32 = 5;
    pub const SCORE_PER_LEVEL: u64 = 500;

    /// Session rules
    pub const START_LIVES: u8 = 3;
    pub const SNAPS_TO_WIN: u8 = 3;
    pub const COLLECT_SCORE: u64 = 100;
    pub const SNAP_SCORE: u64 = 1000;

    /// Snap burst timing
    pub const BURST_DURATION_MS: f64 = 3000.0;
    pub const BURST_FLASH_MS: f64 = 300.0;
    pub const BURST_PARTICLES: usize = 100;

    /// Leaderboard limits
    pub const MAX_NAME_CHARS: usize = 20;
    pub const LEADERBOARD_SIZE: usize = 10;
}

/// Clamp a collector x coordinate into its allowed range
#[inline]
pub fn clamp_player_x(x: f32) -> f32 {
    x.clamp(consts::PLAYER_MIN_X, consts::PLAYER_MAX_X)
}

/// Map a client-space coordinate through a rectangle's left edge and width
/// into percent of that rectangle
#[inline]
pub fn client_to_percent(client: f32, rect_left: f32, rect_width: f32) -> f32 {
    if rect_width <= 0.0 {
        return consts::PLAYER_START_X;
    }
    (client - rect_left) / rect_width * 100.0
}
