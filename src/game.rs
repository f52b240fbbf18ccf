//! Session state machine
//!
//! Owns score, lives, the per-kind collection and snap progress. The field
//! reports catches and misses through [`FieldListener`]; everything the
//! presentation layer needs (difficulty, whether a snap is possible) is
//! derived from the current state on every read.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{FieldListener, GemKind, SnapBurst};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing running
    Menu,
    /// Active gameplay
    Playing,
    /// Out of lives
    GameOver,
    /// All snaps done
    Victory,
}

/// Gems collected since the last snap, per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    counts: [u32; 6],
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: GemKind) {
        self.counts[kind.index()] += 1;
    }

    pub fn count(&self, kind: GemKind) -> u32 {
        self.counts[kind.index()]
    }

    /// True when every kind has been collected at least once
    pub fn is_complete(&self) -> bool {
        self.counts.iter().all(|&c| c > 0)
    }

    pub fn reset(&mut self) {
        self.counts = [0; 6];
    }

    /// (kind, count) pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (GemKind, u32)> + '_ {
        GemKind::ALL.iter().map(|&k| (k, self.count(k)))
    }
}

/// Notable things that happened, drained by the host each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    QuestStarted,
    GemCollected(GemKind),
    LifeLost { lives: u8 },
    GameOver,
    SnapStarted { snaps: u8 },
    SnapComplete,
    Victory,
}

impl GameEvent {
    /// Toast text for the event
    pub fn message(&self) -> String {
        match self {
            GameEvent::QuestStarted => "Collect all six gems!".to_string(),
            GameEvent::GemCollected(kind) => format!("{} collected!", kind.name()),
            GameEvent::LifeLost { lives } => format!("Missed! {} lives left", lives),
            GameEvent::GameOver => "Game Over!".to_string(),
            GameEvent::SnapStarted { snaps } => format!("SNAP! ({}/{})", snaps, SNAPS_TO_WIN),
            GameEvent::SnapComplete => "The snap is complete! +1000 points!".to_string(),
            GameEvent::Victory => "Victory! Every gem mastered!".to_string(),
        }
    }
}

/// Difficulty level for a score: one level per 500 points, capped at 5
pub fn difficulty_for(score: u64) -> u32 {
    let level = score / SCORE_PER_LEVEL + 1;
    level.min(MAX_DIFFICULTY as u64) as u32
}

/// Render-only view of the session for the HUD and canvas
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u8,
    pub snaps: u8,
    pub difficulty: u32,
    pub counts: [u32; 6],
    pub can_snap: bool,
    pub field_active: bool,
}

/// The game session
#[derive(Debug, Clone)]
pub struct Game {
    /// Seed for snap burst effects
    pub seed: u64,
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u8,
    /// Snaps completed (or in progress) this session
    pub snaps: u8,
    pub collection: Collection,
    /// Running snap effect; the field is paused while present
    pub burst: Option<SnapBurst>,
    events: Vec<GameEvent>,
}

impl Game {
    /// Create a session sitting at the menu
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            phase: GamePhase::Menu,
            score: 0,
            lives: START_LIVES,
            snaps: 0,
            collection: Collection::new(),
            burst: None,
            events: Vec::new(),
        }
    }

    /// Current difficulty (derived from score)
    pub fn difficulty(&self) -> u32 {
        difficulty_for(self.score)
    }

    /// Whether every gem kind has been collected since the last snap
    pub fn all_collected(&self) -> bool {
        self.collection.is_complete()
    }

    /// Whether the snap action would do anything right now
    pub fn can_snap(&self) -> bool {
        self.phase == GamePhase::Playing && self.burst.is_none() && self.all_collected()
    }

    /// Whether the field should be running
    pub fn field_active(&self) -> bool {
        self.phase == GamePhase::Playing && self.burst.is_none()
    }

    /// Snapshot for presentation
    pub fn hud(&self) -> HudSnapshot {
        let mut counts = [0; 6];
        for (kind, count) in self.collection.iter() {
            counts[kind.index()] = count;
        }
        HudSnapshot {
            phase: self.phase,
            score: self.score,
            lives: self.lives,
            snaps: self.snaps,
            difficulty: self.difficulty(),
            counts,
            can_snap: self.can_snap(),
            field_active: self.field_active(),
        }
    }

    /// Start a fresh run from the menu, game over or victory screens.
    /// Returns false if a run is already in progress.
    pub fn begin_quest(&mut self) -> bool {
        if self.phase == GamePhase::Playing {
            return false;
        }
        self.phase = GamePhase::Playing;
        self.score = 0;
        self.lives = START_LIVES;
        self.snaps = 0;
        self.collection.reset();
        self.burst = None;
        self.events.push(GameEvent::QuestStarted);
        log::info!("Quest started");
        true
    }

    /// Same reset as [`Game::begin_quest`], offered on the end screens
    pub fn play_again(&mut self) -> bool {
        self.begin_quest()
    }

    /// Abandon the session and go back to the title screen
    pub fn return_to_menu(&mut self) {
        self.phase = GamePhase::Menu;
        self.burst = None;
    }

    /// A gem reached the collector
    pub fn collect(&mut self, kind: GemKind) {
        if !self.field_active() {
            return;
        }
        self.score += COLLECT_SCORE;
        self.collection.add(kind);
        self.events.push(GameEvent::GemCollected(kind));
    }

    /// A gem fell through the field
    pub fn miss(&mut self) {
        if !self.field_active() {
            return;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.phase = GamePhase::GameOver;
            self.events.push(GameEvent::GameOver);
            log::info!("Game over: score {}, snaps {}", self.score, self.snaps);
        } else {
            self.events.push(GameEvent::LifeLost { lives: self.lives });
        }
    }

    /// Spend a full collection on a snap. No-op unless [`Game::can_snap`].
    pub fn snap(&mut self) -> bool {
        if !self.can_snap() {
            return false;
        }
        self.score += SNAP_SCORE;
        self.snaps += 1;
        self.collection.reset();
        let burst_seed = self.seed.wrapping_add(u64::from(self.snaps).wrapping_mul(0x9E37_79B9));
        self.burst = Some(SnapBurst::new(burst_seed));
        self.events.push(GameEvent::SnapStarted { snaps: self.snaps });
        log::info!("Snap {} of {}", self.snaps, SNAPS_TO_WIN);
        true
    }

    /// Finish the running snap effect
    pub fn complete_snap(&mut self) {
        if self.phase != GamePhase::Playing || self.burst.take().is_none() {
            return;
        }
        self.events.push(GameEvent::SnapComplete);
        if self.snaps >= SNAPS_TO_WIN {
            self.phase = GamePhase::Victory;
            self.events.push(GameEvent::Victory);
            log::info!("Victory: score {}", self.score);
        }
    }

    /// Advance time-based effects
    pub fn advance(&mut self, dt_ms: f64) {
        let done = self
            .burst
            .as_mut()
            .is_some_and(|burst| burst.advance(dt_ms));
        if done {
            self.complete_snap();
        }
    }

    /// Take all events queued since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl FieldListener for Game {
    fn on_collect(&mut self, kind: GemKind) {
        self.collect(kind);
    }

    fn on_miss(&mut self) {
        self.miss();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn playing() -> Game {
        let mut game = Game::new(1);
        game.begin_quest();
        game.drain_events();
        game
    }

    fn collect_all(game: &mut Game) {
        for kind in GemKind::ALL {
            game.collect(kind);
        }
    }

    fn finish_burst(game: &mut Game) {
        game.advance(BURST_DURATION_MS);
    }

    #[test]
    fn test_new_game_sits_at_menu() {
        let game = Game::new(1);
        assert_eq!(game.phase, GamePhase::Menu);
        assert!(!game.field_active());
    }

    #[test]
    fn test_difficulty_for_score() {
        assert_eq!(difficulty_for(0), 1);
        assert_eq!(difficulty_for(499), 1);
        assert_eq!(difficulty_for(500), 2);
        assert_eq!(difficulty_for(1600), 4);
        assert_eq!(difficulty_for(2000), 5);
        assert_eq!(difficulty_for(1_000_000), 5);
    }

    #[test]
    fn test_collect_scores_and_counts() {
        let mut game = playing();
        game.collect(GemKind::Ruby);
        game.collect(GemKind::Ruby);
        assert_eq!(game.score, 200);
        assert_eq!(game.collection.count(GemKind::Ruby), 2);
        assert_eq!(
            game.drain_events(),
            vec![
                GameEvent::GemCollected(GemKind::Ruby),
                GameEvent::GemCollected(GemKind::Ruby)
            ]
        );
    }

    #[test]
    fn test_full_quest_to_victory() {
        let mut game = playing();
        assert_eq!((game.score, game.lives, game.snaps), (0, 3, 0));

        collect_all(&mut game);
        assert_eq!(game.score, 600);
        assert!(game.collection.iter().all(|(_, c)| c == 1));

        assert!(game.snap());
        assert_eq!(game.score, 1600);
        assert_eq!(game.snaps, 1);
        assert!(game.collection.iter().all(|(_, c)| c == 0));
        finish_burst(&mut game);
        assert_eq!(game.phase, GamePhase::Playing);

        for _ in 0..2 {
            collect_all(&mut game);
            assert!(game.snap());
            finish_burst(&mut game);
        }

        assert_eq!(game.phase, GamePhase::Victory);
        assert_eq!(game.snaps, 3);
        assert_eq!(game.score, 3 * 1600);
        assert!(game.drain_events().ends_with(&[GameEvent::SnapComplete, GameEvent::Victory]));
    }

    #[test]
    fn test_victory_waits_for_burst() {
        let mut game = playing();
        for _ in 0..3 {
            collect_all(&mut game);
            game.snap();
            if game.snaps < 3 {
                finish_burst(&mut game);
            }
        }
        assert_eq!(game.phase, GamePhase::Playing);
        game.advance(BURST_DURATION_MS - 1.0);
        assert_eq!(game.phase, GamePhase::Playing);
        game.advance(1.0);
        assert_eq!(game.phase, GamePhase::Victory);
    }

    #[test]
    fn test_three_misses_end_the_game() {
        let mut game = playing();
        game.miss();
        assert_eq!((game.lives, game.phase), (2, GamePhase::Playing));
        game.miss();
        assert_eq!((game.lives, game.phase), (1, GamePhase::Playing));
        game.miss();
        assert_eq!((game.lives, game.phase), (0, GamePhase::GameOver));
        assert_eq!(game.score, 0);

        // Further misses are ignored
        game.miss();
        assert_eq!(game.lives, 0);
        let events = game.drain_events();
        assert_eq!(events.iter().filter(|e| **e == GameEvent::GameOver).count(), 1);
    }

    #[test]
    fn test_snap_without_full_collection_is_noop() {
        let mut game = playing();
        for kind in &GemKind::ALL[..5] {
            game.collect(*kind);
        }
        let before = (game.score, game.snaps, game.collection.clone());
        assert!(!game.snap());
        assert_eq!((game.score, game.snaps, game.collection.clone()), before);
        assert!(game.burst.is_none());
    }

    #[test]
    fn test_field_paused_during_burst() {
        let mut game = playing();
        collect_all(&mut game);
        game.snap();
        assert!(!game.field_active());

        // Events arriving while paused are dropped
        game.collect(GemKind::Topaz);
        game.miss();
        assert_eq!(game.collection.count(GemKind::Topaz), 0);
        assert_eq!(game.lives, 3);

        finish_burst(&mut game);
        assert!(game.field_active());
    }

    #[test]
    fn test_play_again_resets() {
        let mut game = playing();
        game.collect(GemKind::Amber);
        game.miss();
        game.miss();
        game.miss();
        assert_eq!(game.phase, GamePhase::GameOver);

        assert!(game.play_again());
        assert_eq!(game.phase, GamePhase::Playing);
        assert_eq!((game.score, game.lives, game.snaps), (0, 3, 0));
        assert_eq!(game.collection, Collection::new());
        // Already playing
        assert!(!game.begin_quest());
    }

    #[test]
    fn test_complete_snap_without_snap_is_noop() {
        let mut game = playing();
        game.complete_snap();
        assert!(game.drain_events().is_empty());
        assert_eq!(game.phase, GamePhase::Playing);
    }

    #[test]
    fn test_hud_snapshot() {
        let mut game = playing();
        game.collect(GemKind::Emerald);
        let hud = game.hud();
        assert_eq!(hud.score, 100);
        assert_eq!(hud.counts, [0, 0, 0, 0, 1, 0]);
        assert_eq!(hud.difficulty, 1);
        assert!(!hud.can_snap);
        assert!(hud.field_active);
    }

    #[test]
    fn test_return_to_menu() {
        let mut game = playing();
        game.return_to_menu();
        assert_eq!(game.phase, GamePhase::Menu);
        assert!(game.begin_quest());
    }

    #[derive(Debug, Clone)]
    enum Action {
        Collect(usize),
        Miss,
        Snap,
        Advance(f64),
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (0usize..6).prop_map(Action::Collect),
            Just(Action::Miss),
            Just(Action::Snap),
            (0.0f64..4000.0).prop_map(Action::Advance),
        ]
    }

    proptest! {
        #[test]
        fn prop_session_invariants(actions in prop::collection::vec(action(), 0..200)) {
            let mut game = playing();
            for action in actions {
                let was_playing = game.phase == GamePhase::Playing;
                let lives_before = game.lives;
                let complete_before = game.all_collected();
                let snapshot = (game.score, game.snaps, game.collection.clone());

                match action {
                    Action::Collect(i) => game.collect(GemKind::ALL[i]),
                    Action::Miss => game.miss(),
                    Action::Snap => {
                        let snapped = game.snap();
                        if !complete_before {
                            prop_assert!(!snapped);
                            prop_assert_eq!((game.score, game.snaps, game.collection.clone()), snapshot.clone());
                        }
                    }
                    Action::Advance(ms) => game.advance(ms),
                }

                prop_assert!(game.lives <= START_LIVES);
                prop_assert!(game.snaps <= SNAPS_TO_WIN);
                prop_assert!((1..=5).contains(&game.difficulty()));
                if was_playing && lives_before > 0 && game.lives == 0 {
                    prop_assert_eq!(game.phase, GamePhase::GameOver);
                }
                if game.phase == GamePhase::Playing {
                    prop_assert!(game.lives > 0);
                }
            }
        }
    }
}
