//! Leaderboard kept in memory, persisted to LocalStorage on the web
//!
//! Used when the page has no remote leaderboard configured, and by the
//! native runner. Rows are kept in insertion order; listing sorts them by
//! score with a stable sort, so ties keep the order they were submitted in.

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};

use super::{FetchCallback, InsertCallback, LeaderboardBackend, LeaderboardEntry, NewEntry, now_ms};

/// Most rows kept in storage
const MAX_STORED_ROWS: usize = 100;

/// Serialized form in LocalStorage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredBoard {
    rows: Vec<LeaderboardEntry>,
    next_id: u64,
}

#[derive(Debug)]
pub struct LocalLeaderboard {
    rows: RefCell<Vec<LeaderboardEntry>>,
    next_id: Cell<u64>,
    persist: bool,
}

impl LocalLeaderboard {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "gem_snap_leaderboard";

    /// Create an empty in-memory leaderboard
    pub fn new() -> Self {
        Self {
            rows: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            persist: false,
        }
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    /// Top `limit` rows, highest score first
    pub fn top(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let mut rows = self.rows.borrow().clone();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        rows.truncate(limit);
        rows
    }

    /// Store a row, assigning id and timestamp
    pub fn push(&self, entry: NewEntry) -> LeaderboardEntry {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let row = LeaderboardEntry {
            id: id.to_string(),
            player_name: entry.player_name,
            score: entry.score,
            snaps_completed: entry.snaps_completed,
            created_at: format!("{}", now_ms().floor()),
        };

        {
            let mut rows = self.rows.borrow_mut();
            rows.push(row.clone());
            if rows.len() > MAX_STORED_ROWS {
                // Drop the lowest score, oldest first among equals
                if let Some(lowest) = rows
                    .iter()
                    .enumerate()
                    .min_by(|(ia, a), (ib, b)| a.score.cmp(&b.score).then(ia.cmp(ib)))
                    .map(|(i, _)| i)
                {
                    rows.remove(lowest);
                }
            }
        }

        if self.persist {
            self.save();
        }
        row
    }

    fn snapshot(&self) -> StoredBoard {
        StoredBoard {
            rows: self.rows.borrow().clone(),
            next_id: self.next_id.get(),
        }
    }

    /// Load the leaderboard from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        let mut board = Self::new();
        board.persist = true;

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(stored) = serde_json::from_str::<StoredBoard>(&json) {
                    log::info!("Loaded {} leaderboard rows", stored.rows.len());
                    board.next_id.set(stored.next_id.max(1));
                    *board.rows.borrow_mut() = stored.rows;
                    return board;
                }
            }
        }

        log::info!("No leaderboard found, starting fresh");
        board
    }

    /// Save the leaderboard to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(&self.snapshot()) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Leaderboard saved ({} rows)", self.len());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        log::debug!("Leaderboard not persisted on native ({} rows)", self.snapshot().rows.len());
    }
}

impl Default for LocalLeaderboard {
    fn default() -> Self {
        Self::new()
    }
}

impl LeaderboardBackend for LocalLeaderboard {
    fn list_top(&self, limit: usize, done: FetchCallback) {
        let rows = self.top(limit);
        done(Ok(rows));
    }

    fn insert(&self, entry: NewEntry, done: InsertCallback) {
        self.push(entry);
        done(Ok(()));
    }
}
