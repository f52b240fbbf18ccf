//! Fixed timestep field tick
//!
//! Advances falling gems, spawns new ones and reports catches and misses.
//! Updating never touches rendering; the renderer only reads the field.

use super::collision::{catches, fell_through};
use super::state::{Field, GemKind};
use crate::consts::*;

/// Receiver of field outcomes. Each gem is reported at most once: it is
/// dropped from the field in the same step it is reported.
pub trait FieldListener {
    /// A gem touched the collector
    fn on_collect(&mut self, kind: GemKind);
    /// A gem fell off the bottom of the field
    fn on_miss(&mut self);
}

/// Recorded field outcome (for tests and headless runs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    Collected(GemKind),
    Missed,
}

impl FieldListener for Vec<FieldEvent> {
    fn on_collect(&mut self, kind: GemKind) {
        self.push(FieldEvent::Collected(kind));
    }

    fn on_miss(&mut self) {
        self.push(FieldEvent::Missed);
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Collector target x (percent, from mouse/touch position)
    pub pointer_x: Option<f32>,
    /// Idle/demo mode - AI moves the collector
    pub autopilot: bool,
}

/// Collector speed under autopilot (percent per tick)
const AUTOPILOT_SPEED: f32 = 1.5;

/// Milliseconds between spawns at a difficulty level
pub fn spawn_interval_ms(difficulty: u32) -> f64 {
    let level = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY) as f64;
    (SPAWN_BASE_MS - level * SPAWN_STEP_MS).max(MIN_SPAWN_INTERVAL_MS)
}

/// Advance the field by one fixed timestep
pub fn tick<L: FieldListener>(
    field: &mut Field,
    input: &TickInput,
    difficulty: u32,
    listener: &mut L,
) {
    if !field.playing {
        return;
    }

    if input.autopilot {
        steer_autopilot(field);
    } else if let Some(x) = input.pointer_x {
        field.set_player_x(x);
    }

    field.time_ticks += 1;
    field.clock_ms += SIM_DT as f64 * 1000.0;

    // Spawn
    let due = field
        .since_last_spawn()
        .is_none_or(|elapsed| elapsed > spawn_interval_ms(difficulty));
    if due {
        field.spawn_gem(difficulty);
    }

    // Fall, then resolve catches before misses
    let player_x = field.player_x;
    let gems = std::mem::take(&mut field.gems);
    field.gems.reserve(gems.len());
    for mut gem in gems {
        gem.y += gem.speed;
        gem.rotation = (gem.rotation + GEM_SPIN_PER_TICK) % 360.0;

        if catches(gem.x, gem.y, player_x) {
            listener.on_collect(gem.kind);
            continue;
        }
        if fell_through(gem.y) {
            listener.on_miss();
            continue;
        }
        field.gems.push(gem);
    }
}

/// Move the collector toward the next gem that will reach the catch band
fn steer_autopilot(field: &mut Field) {
    let target = field
        .gems
        .iter()
        .filter(|g| g.y < CATCH_BAND_BOTTOM)
        .max_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
        .map(|g| g.x);

    if let Some(target_x) = target {
        let delta = (target_x - field.player_x).clamp(-AUTOPILOT_SPEED, AUTOPILOT_SPEED);
        field.set_player_x(field.player_x + delta);
    }
}
