//! Field state and core simulation types

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::clamp_player_x;
use crate::consts::*;

/// The six gem kinds that fall onto the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GemKind {
    Sapphire,
    Topaz,
    Ruby,
    Amethyst,
    Emerald,
    Amber,
}

impl GemKind {
    /// Every kind, in display order
    pub const ALL: [GemKind; 6] = [
        GemKind::Sapphire,
        GemKind::Topaz,
        GemKind::Ruby,
        GemKind::Amethyst,
        GemKind::Emerald,
        GemKind::Amber,
    ];

    /// Position in [`GemKind::ALL`]
    pub fn index(self) -> usize {
        match self {
            GemKind::Sapphire => 0,
            GemKind::Topaz => 1,
            GemKind::Ruby => 2,
            GemKind::Amethyst => 3,
            GemKind::Emerald => 4,
            GemKind::Amber => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GemKind::Sapphire => "Sapphire",
            GemKind::Topaz => "Topaz",
            GemKind::Ruby => "Ruby",
            GemKind::Amethyst => "Amethyst",
            GemKind::Emerald => "Emerald",
            GemKind::Amber => "Amber",
        }
    }

    /// Linear RGB color used for the gem body and glow
    pub fn color(self) -> [f32; 3] {
        match self {
            GemKind::Sapphire => [0.231, 0.510, 0.965], // #3b82f6
            GemKind::Topaz => [0.918, 0.702, 0.031],    // #eab308
            GemKind::Ruby => [0.937, 0.267, 0.267],     // #ef4444
            GemKind::Amethyst => [0.659, 0.333, 0.969], // #a855f7
            GemKind::Emerald => [0.133, 0.773, 0.369],  // #22c55e
            GemKind::Amber => [0.976, 0.451, 0.086],    // #f97316
        }
    }

    /// CSS class suffix for HUD elements
    pub fn css(self) -> &'static str {
        match self {
            GemKind::Sapphire => "sapphire",
            GemKind::Topaz => "topaz",
            GemKind::Ruby => "ruby",
            GemKind::Amethyst => "amethyst",
            GemKind::Emerald => "emerald",
            GemKind::Amber => "amber",
        }
    }
}

/// A gem falling through the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallingGem {
    pub id: u32,
    pub kind: GemKind,
    /// Horizontal position (percent of field width)
    pub x: f32,
    /// Vertical position (percent of field height, may leave 0..100)
    pub y: f32,
    /// Fall speed (percent of field height per tick)
    pub speed: f32,
    /// Rotation (degrees)
    pub rotation: f32,
}

impl FallingGem {
    /// Fall speed for gems spawned at a difficulty level
    pub fn speed_for(difficulty: u32) -> f32 {
        let level = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
        GEM_BASE_SPEED + level as f32 * GEM_SPEED_PER_LEVEL
    }
}

/// The play field: live gems, collector position and spawn clock
#[derive(Debug, Clone)]
pub struct Field {
    /// Seed of the spawn RNG
    pub seed: u64,
    rng: Pcg32,
    /// Live gems (sorted by id)
    pub gems: Vec<FallingGem>,
    /// Collector x (percent, clamped)
    pub player_x: f32,
    /// Whether ticks advance the field
    pub playing: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated clock (ms) driving spawns
    pub clock_ms: f64,
    /// Clock reading of the last spawn (None: spawn on next tick)
    last_spawn_ms: Option<f64>,
    /// Next entity ID
    next_id: u32,
}

impl Field {
    /// Create an idle field with the given spawn seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            gems: Vec::new(),
            player_x: PLAYER_START_X,
            playing: false,
            time_ticks: 0,
            clock_ms: 0.0,
            last_spawn_ms: None,
            next_id: 1,
        }
    }

    /// Start or stop the field. Stopping drops every live gem.
    pub fn set_playing(&mut self, playing: bool) {
        if playing == self.playing {
            return;
        }
        self.playing = playing;
        if !playing {
            self.gems.clear();
        }
        self.last_spawn_ms = None;
    }

    /// Move the collector to a percent-space x (clamped)
    pub fn set_player_x(&mut self, x: f32) {
        if x.is_finite() {
            self.player_x = clamp_player_x(x);
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Milliseconds since the last spawn (None before the first one)
    pub fn since_last_spawn(&self) -> Option<f64> {
        self.last_spawn_ms.map(|t| self.clock_ms - t)
    }

    /// Spawn one gem of random kind at the top of the field
    pub fn spawn_gem(&mut self, difficulty: u32) -> u32 {
        let id = self.next_entity_id();
        let kind = GemKind::ALL[self.rng.random_range(0..GemKind::ALL.len())];
        let x = self.rng.random_range(GEM_SPAWN_MIN_X..GEM_SPAWN_MAX_X);
        self.gems.push(FallingGem {
            id,
            kind,
            x,
            y: GEM_SPAWN_Y,
            speed: FallingGem::speed_for(difficulty),
            rotation: 0.0,
        });
        self.last_spawn_ms = Some(self.clock_ms);
        id
    }
}
