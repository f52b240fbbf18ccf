//! Deterministic field simulation
//!
//! Falling gems, spawning, and catch detection live here. This module must be
//! pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies
//!
//! The field knows nothing about scoring or lives; it reports catches and
//! misses through [`FieldListener`].

pub mod burst;
pub mod collision;
pub mod state;
pub mod tick;

pub use burst::{BurstParticle, SnapBurst};
pub use collision::{catches, fell_through};
pub use state::{FallingGem, Field, GemKind};
pub use tick::{FieldEvent, FieldListener, TickInput, spawn_interval_ms, tick};
