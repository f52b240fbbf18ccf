//! Fixed timestep frame driver
//!
//! The host calls [`Runner::update`] once per redraw callback with the wall
//! clock delta; the runner turns that into whole simulation ticks. Between
//! ticks the field is started or stopped to follow the session, so a field
//! that has been stopped never carries gems into the next run.

use crate::consts::*;
use crate::game::{Game, GamePhase};
use crate::sim::{Field, TickInput, tick};

/// Session plus field, advanced together
#[derive(Debug, Clone)]
pub struct Runner {
    pub game: Game,
    pub field: Field,
    pub input: TickInput,
    accumulator: f32,
}

impl Runner {
    pub fn new(seed: u64) -> Self {
        Self {
            game: Game::new(seed),
            field: Field::new(seed.rotate_left(17) ^ 0xA5A5_A5A5),
            input: TickInput::default(),
            accumulator: 0.0,
        }
    }

    /// Start (or restart) a run
    pub fn begin_quest(&mut self) -> bool {
        let started = self.game.begin_quest();
        self.accumulator = 0.0;
        self.sync_field();
        started
    }

    /// Trigger a snap if the collection allows it
    pub fn snap(&mut self) -> bool {
        let snapped = self.game.snap();
        self.sync_field();
        snapped
    }

    /// Abandon the run
    pub fn return_to_menu(&mut self) {
        self.game.return_to_menu();
        self.sync_field();
    }

    /// Point the collector at a percent-space x (clamped by the field)
    pub fn set_pointer_x(&mut self, x: f32) {
        self.input.pointer_x = Some(x);
        self.field.set_player_x(x);
    }

    /// Whether the host should keep scheduling frames
    pub fn wants_frames(&self) -> bool {
        self.game.phase == GamePhase::Playing
    }

    /// Run simulation ticks for a frame delta (seconds). Returns ticks run.
    pub fn update(&mut self, dt: f32) -> u32 {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.sync_field();
            let difficulty = self.game.difficulty();
            tick(&mut self.field, &self.input, difficulty, &mut self.game);
            self.game.advance(SIM_DT as f64 * 1000.0);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        self.sync_field();
        substeps
    }

    /// Start or stop the field to match the session
    fn sync_field(&mut self) {
        self.field.set_playing(self.game.field_active());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GemKind;

    #[test]
    fn test_update_runs_whole_ticks() {
        let mut runner = Runner::new(1);
        runner.begin_quest();
        assert_eq!(runner.update(SIM_DT * 2.5), 2);
        assert_eq!(runner.field.time_ticks, 2);
        // Leftover half tick carries into the next frame
        assert_eq!(runner.update(SIM_DT * 0.6), 1);
    }

    #[test]
    fn test_update_clamps_long_frames() {
        let mut runner = Runner::new(1);
        runner.begin_quest();
        // 0.1s of a 60 Hz clock, give or take float rounding
        let ticks = runner.update(5.0);
        assert!((5..=6).contains(&ticks));
        assert_eq!(runner.field.time_ticks, ticks as u64);
    }

    #[test]
    fn test_menu_does_not_tick_field() {
        let mut runner = Runner::new(1);
        runner.update(0.05);
        assert!(!runner.field.playing);
        assert_eq!(runner.field.time_ticks, 0);
        assert!(!runner.wants_frames());
    }

    #[test]
    fn test_game_over_clears_field() {
        let mut runner = Runner::new(1);
        runner.begin_quest();
        runner.update(SIM_DT);
        assert!(!runner.field.gems.is_empty());

        runner.game.miss();
        runner.game.miss();
        runner.game.miss();
        runner.update(SIM_DT);

        assert_eq!(runner.game.phase, GamePhase::GameOver);
        assert!(!runner.field.playing);
        assert!(runner.field.gems.is_empty());
        assert!(!runner.wants_frames());
    }

    #[test]
    fn test_snap_pauses_field_until_burst_ends() {
        let mut runner = Runner::new(1);
        runner.begin_quest();
        runner.update(SIM_DT);
        for kind in GemKind::ALL {
            runner.game.collect(kind);
        }

        assert!(runner.snap());
        assert!(!runner.field.playing);
        assert!(runner.field.gems.is_empty());

        // 3 seconds of frames finishes the burst
        for _ in 0..40 {
            runner.update(MAX_FRAME_DT);
        }
        assert!(runner.game.burst.is_none());
        assert!(runner.field.playing);
    }

    #[test]
    fn test_pointer_is_clamped() {
        let mut runner = Runner::new(1);
        runner.set_pointer_x(-50.0);
        assert_eq!(runner.field.player_x, PLAYER_MIN_X);
    }
}
