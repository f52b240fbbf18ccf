//! Snap burst particle effect
//!
//! Purely visual: 100 gem-colored particles that shrink and drift away while
//! a short flash fades. The orchestrator only cares about completion.
//! Randomness comes from a seeded RNG so the effect is reproducible.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::GemKind;
use crate::consts::*;

/// Seconds each particle takes to shrink away once its delay has passed
const PARTICLE_LIFETIME_S: f32 = 2.0;
/// Farthest a particle drifts (pixels)
const MAX_DRIFT_PX: f32 = 200.0;
/// Peak flash opacity
const FLASH_PEAK: f32 = 0.8;

/// A single burst particle
#[derive(Debug, Clone, PartialEq)]
pub struct BurstParticle {
    /// Start position (percent of screen)
    pub pos: Vec2,
    /// Diameter (pixels)
    pub size: f32,
    /// Palette entry
    pub kind: GemKind,
    /// Start delay (seconds)
    pub delay: f32,
    /// Total drift over the particle lifetime (pixels)
    pub drift: Vec2,
}

/// Rendered state of a particle at the current burst time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleFrame {
    /// Pixel offset from the start position
    pub offset: Vec2,
    /// Scale factor (1 at start, 0 when gone)
    pub scale: f32,
    /// Opacity
    pub alpha: f32,
}

/// The running snap effect
#[derive(Debug, Clone)]
pub struct SnapBurst {
    pub seed: u64,
    pub particles: Vec<BurstParticle>,
    /// Time since the burst started (ms)
    pub elapsed_ms: f64,
    finished: bool,
}

impl SnapBurst {
    /// Build a burst from a seed
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let particles = (0..BURST_PARTICLES)
            .map(|_| {
                let pos = Vec2::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0));
                let size = rng.random_range(5.0..25.0);
                let kind = GemKind::ALL[rng.random_range(0..GemKind::ALL.len())];
                let delay = rng.random_range(0.0..0.5);
                // One heading per particle keeps x and y drift consistent
                let heading = rng.random_range(0.0..std::f32::consts::TAU);
                let distance = rng.random_range(0.0..MAX_DRIFT_PX);
                BurstParticle {
                    pos,
                    size,
                    kind,
                    delay,
                    drift: Vec2::from_angle(heading) * distance,
                }
            })
            .collect();

        Self {
            seed,
            particles,
            elapsed_ms: 0.0,
            finished: false,
        }
    }

    /// Advance the effect. Returns true exactly once, on the step it ends.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        if self.finished {
            return false;
        }
        self.elapsed_ms += dt_ms.max(0.0);
        if self.elapsed_ms >= BURST_DURATION_MS {
            self.finished = true;
            return true;
        }
        false
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Full-screen flash opacity: ramps up then back down over the flash window
    pub fn flash_alpha(&self) -> f32 {
        if self.elapsed_ms >= BURST_FLASH_MS {
            return 0.0;
        }
        let t = (self.elapsed_ms / BURST_FLASH_MS) as f32;
        if t < 0.5 {
            FLASH_PEAK * t * 2.0
        } else {
            FLASH_PEAK * (1.0 - t) * 2.0
        }
    }

    /// Current animation state of a particle
    pub fn particle_frame(&self, particle: &BurstParticle) -> ParticleFrame {
        let seconds = (self.elapsed_ms / 1000.0) as f32;
        let t = ((seconds - particle.delay) / PARTICLE_LIFETIME_S).clamp(0.0, 1.0);
        // ease-out
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        ParticleFrame {
            offset: particle.drift * eased,
            scale: 1.0 - eased,
            alpha: 1.0 - eased,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_is_reproducible() {
        let a = SnapBurst::new(42);
        let b = SnapBurst::new(42);
        assert_eq!(a.particles, b.particles);
        assert_ne!(a.particles, SnapBurst::new(43).particles);
    }

    #[test]
    fn test_particle_ranges() {
        let burst = SnapBurst::new(7);
        assert_eq!(burst.particles.len(), BURST_PARTICLES);
        for p in &burst.particles {
            assert!((0.0..100.0).contains(&p.pos.x));
            assert!((0.0..100.0).contains(&p.pos.y));
            assert!((5.0..25.0).contains(&p.size));
            assert!((0.0..0.5).contains(&p.delay));
            assert!(p.drift.length() <= MAX_DRIFT_PX + 1e-3);
        }
    }

    #[test]
    fn test_drift_directions_cover_all_quadrants() {
        let burst = SnapBurst::new(11);
        let quadrant = |v: Vec2| (v.x >= 0.0, v.y >= 0.0);
        let mut seen = std::collections::HashSet::new();
        for p in &burst.particles {
            seen.insert(quadrant(p.drift));
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_advance_completes_once() {
        let mut burst = SnapBurst::new(1);
        assert!(!burst.advance(1000.0));
        assert!(!burst.advance(1999.0));
        assert!(burst.advance(1.0));
        assert!(burst.is_finished());
        assert!(!burst.advance(500.0));
    }

    #[test]
    fn test_flash_fades() {
        let mut burst = SnapBurst::new(1);
        assert_eq!(burst.flash_alpha(), 0.0);
        burst.advance(150.0);
        assert!((burst.flash_alpha() - FLASH_PEAK).abs() < 1e-4);
        burst.advance(200.0);
        assert_eq!(burst.flash_alpha(), 0.0);
    }

    #[test]
    fn test_particles_vanish_by_end() {
        let mut burst = SnapBurst::new(3);
        let first = burst.particles[0].clone();
        let start = burst.particle_frame(&first);
        assert_eq!(start.scale, 1.0);
        assert_eq!(start.offset, Vec2::ZERO);

        burst.advance(BURST_DURATION_MS);
        let end = burst.particle_frame(&first);
        assert_eq!(end.scale, 0.0);
        assert!((end.offset - first.drift).length() < 1e-3);
    }
}
