//! Catch detection between falling gems and the collector
//!
//! Everything is axis-aligned in percent space: a gem is caught when it is
//! horizontally within half a collector plus half a gem of the collector
//! center while inside the catch band near the bottom of the field.

use crate::consts::*;

/// Horizontal distance under which a gem touches the collector
pub const CATCH_TOLERANCE: f32 = PLAYER_WIDTH / 2.0 + GEM_SIZE / 2.0;

/// Whether a gem at (`x`, `y`) is caught by a collector at `player_x`
#[inline]
pub fn catches(x: f32, y: f32, player_x: f32) -> bool {
    (x - player_x).abs() < CATCH_TOLERANCE && y > CATCH_BAND_TOP && y < CATCH_BAND_BOTTOM
}

/// Whether a gem at height `y` has fallen off the field
#[inline]
pub fn fell_through(y: f32) -> bool {
    y > FALL_THROUGH_Y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_directly_above_collector() {
        assert!(catches(50.0, 90.0, 50.0));
        assert!(catches(50.0, 85.1, 50.0));
        assert!(catches(50.0, 94.9, 50.0));
    }

    #[test]
    fn test_catch_band_is_exclusive() {
        assert!(!catches(50.0, 85.0, 50.0));
        assert!(!catches(50.0, 95.0, 50.0));
    }

    #[test]
    fn test_catch_horizontal_tolerance() {
        assert_eq!(CATCH_TOLERANCE, 12.5);
        assert!(catches(62.4, 90.0, 50.0));
        assert!(!catches(62.5, 90.0, 50.0));
        assert!(catches(37.6, 90.0, 50.0));
        assert!(!catches(30.0, 90.0, 50.0));
    }

    #[test]
    fn test_fell_through() {
        assert!(!fell_through(100.0));
        assert!(!fell_through(105.0));
        assert!(fell_through(105.01));
    }
}
