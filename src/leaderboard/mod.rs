//! Top-10 score leaderboard
//!
//! The scores themselves live in a backend: a remote PostgREST-style service
//! when the host page configures one, LocalStorage otherwise. Backends report
//! back through completion callbacks so network calls never block a frame.

pub mod local;
#[cfg(target_arch = "wasm32")]
pub mod rest;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::consts::{LEADERBOARD_SIZE, MAX_NAME_CHARS};

pub use local::LocalLeaderboard;
#[cfg(target_arch = "wasm32")]
pub use rest::RestLeaderboard;

/// A stored leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Server-assigned identifier
    pub id: String,
    pub player_name: String,
    pub score: u64,
    pub snaps_completed: u32,
    /// Server-assigned timestamp (opaque)
    pub created_at: String,
}

/// Insert payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub player_name: String,
    pub score: u64,
    pub snaps_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardError {
    /// Player name was blank after trimming
    EmptyName,
    /// Request never completed
    Transport(String),
    /// Service answered with a non-success status
    Status(u16),
    /// Response body could not be parsed
    Decode(String),
}

impl fmt::Display for LeaderboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "player name is empty"),
            Self::Transport(msg) => write!(f, "leaderboard request failed: {msg}"),
            Self::Status(code) => write!(f, "leaderboard service returned status {code}"),
            Self::Decode(msg) => write!(f, "leaderboard response unreadable: {msg}"),
        }
    }
}

impl std::error::Error for LeaderboardError {}

pub type FetchCallback = Box<dyn FnOnce(Result<Vec<LeaderboardEntry>, LeaderboardError>)>;
pub type InsertCallback = Box<dyn FnOnce(Result<(), LeaderboardError>)>;

/// Storage behind the leaderboard
pub trait LeaderboardBackend {
    /// List up to `limit` rows, highest score first
    fn list_top(&self, limit: usize, done: FetchCallback);
    /// Store one row
    fn insert(&self, entry: NewEntry, done: InsertCallback);
}

impl<T: LeaderboardBackend + ?Sized> LeaderboardBackend for Box<T> {
    fn list_top(&self, limit: usize, done: FetchCallback) {
        (**self).list_top(limit, done)
    }

    fn insert(&self, entry: NewEntry, done: InsertCallback) {
        (**self).insert(entry, done)
    }
}

/// Trim a player name and cut it to the allowed length.
/// Returns None when nothing is left.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let name: String = raw.trim().chars().take(MAX_NAME_CHARS).collect();
    if name.is_empty() { None } else { Some(name) }
}

/// Result of a fetch: never missing a list, plus the failure if there was one
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub entries: Vec<LeaderboardEntry>,
    pub error: Option<LeaderboardError>,
}

/// Connection settings for the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardConfig {
    /// Base URL, e.g. `https://project.example.co`
    pub endpoint: String,
    pub api_key: String,
    pub table: String,
}

impl LeaderboardConfig {
    /// Meta tag names read from the host page
    pub const ENDPOINT_META: &'static str = "gem-snap-leaderboard-url";
    pub const KEY_META: &'static str = "gem-snap-leaderboard-key";
    pub const DEFAULT_TABLE: &'static str = "leaderboard";

    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: Self::DEFAULT_TABLE.to_string(),
        }
    }

    /// Query URL for the top `limit` rows
    pub fn list_url(&self, limit: usize) -> String {
        format!(
            "{}/rest/v1/{}?select=*&order=score.desc&limit={}",
            self.endpoint, self.table, limit
        )
    }

    /// Insert URL
    pub fn insert_url(&self) -> String {
        format!("{}/rest/v1/{}", self.endpoint, self.table)
    }

    /// Read the configuration from `<meta>` tags (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn from_document() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        let read = |name: &str| -> Option<String> {
            let el = document
                .query_selector(&format!("meta[name='{}']", name))
                .ok()??;
            el.get_attribute("content").filter(|v| !v.trim().is_empty())
        };
        let endpoint = read(Self::ENDPOINT_META)?;
        let key = read(Self::KEY_META)?;
        Some(Self::new(&endpoint, &key))
    }
}

/// Client-side view of the leaderboard: validates submissions, keeps the
/// last fetched list and refreshes it after a successful insert.
pub struct Leaderboard<B> {
    backend: Rc<B>,
    entries: Rc<RefCell<Vec<LeaderboardEntry>>>,
    loading: Rc<Cell<bool>>,
}

impl<B> Clone for Leaderboard<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            entries: self.entries.clone(),
            loading: self.loading.clone(),
        }
    }
}

impl<B: LeaderboardBackend + 'static> Leaderboard<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Rc::new(backend),
            entries: Rc::new(RefCell::new(Vec::new())),
            loading: Rc::new(Cell::new(false)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Last successfully fetched rows
    pub fn entries(&self) -> Vec<LeaderboardEntry> {
        self.entries.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    /// Whether the submit control should be enabled for this name
    pub fn can_submit(name: &str) -> bool {
        sanitize_name(name).is_some()
    }

    /// Fetch the top `n` rows. Failures are logged and reported as an empty
    /// list alongside the error.
    pub fn fetch_top(&self, n: usize, done: impl FnOnce(FetchOutcome) + 'static) {
        self.loading.set(true);
        let entries = self.entries.clone();
        let loading = self.loading.clone();
        self.backend.list_top(
            n,
            Box::new(move |result| {
                loading.set(false);
                match result {
                    Ok(mut rows) => {
                        rows.truncate(n);
                        *entries.borrow_mut() = rows.clone();
                        done(FetchOutcome {
                            entries: rows,
                            error: None,
                        });
                    }
                    Err(err) => {
                        log::error!("Error fetching leaderboard: {}", err);
                        done(FetchOutcome {
                            entries: Vec::new(),
                            error: Some(err),
                        });
                    }
                }
            }),
        );
    }

    /// Re-fetch the standard top-10 into the cache
    pub fn refresh(&self) {
        self.fetch_top(LEADERBOARD_SIZE, |_| {});
    }

    /// Submit a score. Blank names are rejected without touching the backend.
    /// `done` receives whether the row was stored; the cached list is
    /// refreshed after a success.
    pub fn submit(
        &self,
        name: &str,
        score: u64,
        snaps_completed: u32,
        done: impl FnOnce(bool) + 'static,
    ) {
        let Some(player_name) = sanitize_name(name) else {
            log::warn!("Rejected score submission: {}", LeaderboardError::EmptyName);
            done(false);
            return;
        };

        let entry = NewEntry {
            player_name,
            score,
            snaps_completed,
        };
        let this = self.clone();
        self.backend.insert(
            entry,
            Box::new(move |result| match result {
                Ok(()) => {
                    log::info!("Score {} submitted", score);
                    this.refresh();
                    done(true);
                }
                Err(err) => {
                    log::error!("Error submitting score: {}", err);
                    done(false);
                }
            }),
        );
    }
}

/// Format a row timestamp relative to now.
///
/// Millisecond timestamps (local rows) become "N mins ago" style labels;
/// anything else (remote ISO timestamps) is cut to its date part.
pub fn format_age(created_at: &str, now_ms: f64) -> String {
    let Ok(timestamp) = created_at.parse::<f64>() else {
        return created_at.chars().take(10).collect();
    };

    let diff_mins = (now_ms - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i64;
        if days == 1 {
            "Yesterday".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as i64;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as i64;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}

/// Current time in ms since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
