//! End-to-end session scenarios through the public API

use std::cell::RefCell;
use std::rc::Rc;

use gem_snap::consts::*;
use gem_snap::leaderboard::FetchOutcome;
use gem_snap::sim::{Field, FieldEvent, GemKind, TickInput, tick};
use gem_snap::{Game, GameEvent, GamePhase, Leaderboard, LocalLeaderboard, Runner};

/// Run frames until the snap burst is over
fn finish_burst(runner: &mut Runner) {
    for _ in 0..100 {
        if runner.game.burst.is_none() {
            return;
        }
        runner.update(MAX_FRAME_DT);
    }
    panic!("burst never finished");
}

#[test]
fn three_snaps_win_the_game() {
    let mut runner = Runner::new(11);
    assert!(runner.begin_quest());
    assert_eq!(runner.game.score, 0);
    assert_eq!(runner.game.lives, START_LIVES);

    for round in 1..=3u8 {
        for kind in GemKind::ALL {
            runner.game.collect(kind);
        }
        assert!(runner.game.all_collected());
        assert!(runner.snap());
        assert_eq!(runner.game.snaps, round);
        assert!(!runner.game.all_collected());
        finish_burst(&mut runner);
    }

    assert_eq!(runner.game.phase, GamePhase::Victory);
    assert_eq!(runner.game.score, 3 * (600 + 1000));
    assert!(!runner.wants_frames());
    assert!(runner.field.gems.is_empty());

    let events = runner.game.drain_events();
    assert_eq!(events.first(), Some(&GameEvent::QuestStarted));
    assert_eq!(events.last(), Some(&GameEvent::Victory));
}

#[test]
fn three_misses_end_the_game() {
    let mut game = Game::new(5);
    game.begin_quest();

    game.miss();
    assert_eq!(game.lives, 2);
    game.miss();
    assert_eq!(game.lives, 1);
    assert_eq!(game.phase, GamePhase::Playing);
    game.miss();

    assert_eq!(game.lives, 0);
    assert_eq!(game.phase, GamePhase::GameOver);
    assert_eq!(game.score, 0);

    // Further misses change nothing
    game.miss();
    assert_eq!(game.lives, 0);
}

#[test]
fn unattended_field_costs_lives_until_game_over() {
    let mut runner = Runner::new(21);
    runner.begin_quest();
    // Parked at the edge: most gems land out of reach
    runner.set_pointer_x(PLAYER_MIN_X);
    let mut ticks = 0;
    while runner.wants_frames() && ticks < 60 * 120 {
        ticks += runner.update(SIM_DT);
    }
    assert_eq!(runner.game.phase, GamePhase::GameOver);
    assert_eq!(runner.game.lives, 0);
    assert!(runner.field.gems.is_empty());
}

#[test]
fn gem_over_collector_is_collected_exactly_once() {
    let mut field = Field::new(8);
    field.set_playing(true);
    let input = TickInput::default();
    let mut events: Vec<FieldEvent> = Vec::new();

    tick(&mut field, &input, 1, &mut events);
    assert_eq!(field.gems.len(), 1);
    field.gems[0].x = field.player_x;
    field.gems[0].y = 88.0;

    for _ in 0..60 {
        tick(&mut field, &input, 1, &mut events);
    }

    // No second spawn is due within a second at difficulty 1
    assert_eq!(events, vec![FieldEvent::Collected(field_kind(&events))]);
    assert!(field.gems.is_empty());
}

fn field_kind(events: &[FieldEvent]) -> GemKind {
    match events.first() {
        Some(FieldEvent::Collected(kind)) => *kind,
        other => panic!("expected a collect, got {:?}", other),
    }
}

#[test]
fn submitted_names_are_trimmed_and_truncated() {
    let board = Leaderboard::new(LocalLeaderboard::new());
    board.submit("  Alice  ", 4200, 3, |ok| assert!(ok));
    board.submit(&"z".repeat(30), 10, 0, |ok| assert!(ok));

    let top = board.backend().top(LEADERBOARD_SIZE);
    assert_eq!(top[0].player_name, "Alice");
    assert_eq!(top[1].player_name, "z".repeat(MAX_NAME_CHARS));
}

#[test]
fn fetch_top_ten_of_fifteen() {
    let board = Leaderboard::new(LocalLeaderboard::new());
    for i in 0..15u64 {
        board.submit(&format!("player{i}"), 100 * (i % 5), 0, |_| {});
    }

    let result: Rc<RefCell<Option<FetchOutcome>>> = Rc::new(RefCell::new(None));
    let sink = result.clone();
    board.fetch_top(LEADERBOARD_SIZE, move |outcome| *sink.borrow_mut() = Some(outcome));
    let outcome = result.borrow_mut().take().expect("local backend answers at once");

    assert!(outcome.error.is_none());
    assert_eq!(outcome.entries.len(), 10);
    assert!(outcome.entries.windows(2).all(|w| w[0].score >= w[1].score));

    // Equal scores keep submission order
    let fours: Vec<_> = outcome
        .entries
        .iter()
        .filter(|e| e.score == 400)
        .map(|e| e.player_name.as_str())
        .collect();
    assert_eq!(fours, vec!["player4", "player9", "player14"]);
}
