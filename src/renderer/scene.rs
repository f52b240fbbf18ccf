//! Draw data for one frame
//!
//! Turns the field and session into pixel-space sprites. Building a scene
//! only reads simulation state, so drawing can never change what the next
//! tick sees.

use glam::Vec2;

use crate::consts::{GEM_SIZE, PLAYER_WIDTH};
use crate::game::Game;
use crate::settings::Settings;
use crate::sim::Field;

/// Canvas height the particle and collector-height pixel sizes are tuned for
pub const REFERENCE_HEIGHT: f32 = 600.0;
/// Collector vertical position (fraction of canvas height)
pub const COLLECTOR_Y: f32 = 0.9;
/// Collector half height at the reference height (pixels)
pub const COLLECTOR_HALF_HEIGHT_PX: f32 = 20.0;
/// Jewel dots inset along the collector
pub const COLLECTOR_JEWELS: usize = 5;

const COLLECTOR_COLOR: [f32; 3] = [0.855, 0.647, 0.125];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GemSprite {
    pub center: Vec2,
    /// Circumradius (pixels)
    pub radius: f32,
    /// Radians, clockwise on screen
    pub rotation: f32,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectorSprite {
    pub center: Vec2,
    pub half_size: Vec2,
    pub color: [f32; 3],
}

impl CollectorSprite {
    /// Centers of the jewel dots, evenly spaced across the collector
    pub fn jewels(&self) -> [Vec2; COLLECTOR_JEWELS] {
        let step = self.half_size.x * 1.4 / (COLLECTOR_JEWELS - 1) as f32;
        let left = self.center.x - self.half_size.x * 0.7;
        std::array::from_fn(|i| Vec2::new(left + step * i as f32, self.center.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSprite {
    pub center: Vec2,
    pub radius: f32,
    pub color: [f32; 3],
    pub alpha: f32,
}

/// Everything drawn in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub resolution: Vec2,
    /// Canvas height relative to the reference height
    pub scale: f32,
    pub gems: Vec<GemSprite>,
    pub collector: CollectorSprite,
    pub particles: Vec<ParticleSprite>,
    /// Full-screen white flash opacity
    pub flash: f32,
}

impl Scene {
    pub fn build(field: &Field, game: &Game, settings: &Settings, width: f32, height: f32) -> Self {
        let resolution = Vec2::new(width.max(1.0), height.max(1.0));
        let scale = resolution.y / REFERENCE_HEIGHT;
        let to_px = |x: f32, y: f32| Vec2::new(x / 100.0 * resolution.x, y / 100.0 * resolution.y);
        // Horizontal extents share the catch test's percent-of-width units
        let width_px = |percent: f32| percent / 100.0 * resolution.x;

        let gems = field
            .gems
            .iter()
            .map(|gem| GemSprite {
                center: to_px(gem.x, gem.y),
                radius: width_px(GEM_SIZE / 2.0),
                rotation: if settings.effective_spin() {
                    gem.rotation.to_radians()
                } else {
                    0.0
                },
                color: gem.kind.color(),
            })
            .collect();

        let collector = CollectorSprite {
            center: Vec2::new(field.player_x / 100.0 * resolution.x, COLLECTOR_Y * resolution.y),
            half_size: Vec2::new(width_px(PLAYER_WIDTH / 2.0), COLLECTOR_HALF_HEIGHT_PX * scale),
            color: COLLECTOR_COLOR,
        };

        let mut particles = Vec::new();
        let mut flash = 0.0;
        if let Some(burst) = &game.burst {
            if settings.particles {
                particles = burst
                    .particles
                    .iter()
                    .map(|p| {
                        let frame = burst.particle_frame(p);
                        ParticleSprite {
                            center: to_px(p.pos.x, p.pos.y) + frame.offset * scale,
                            radius: p.size * 0.5 * frame.scale * scale,
                            color: p.kind.color(),
                            alpha: frame.alpha,
                        }
                    })
                    .filter(|p| p.alpha > 0.0 && p.radius > 0.0)
                    .collect();
            }
            if settings.effective_flash() {
                flash = burst.flash_alpha();
            }
        }

        Self {
            resolution,
            scale,
            gems,
            collector,
            particles,
            flash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GemKind;

    fn playing() -> (Field, Game) {
        let mut game = Game::new(3);
        game.begin_quest();
        let mut field = Field::new(3);
        field.set_playing(true);
        (field, game)
    }

    #[test]
    fn test_gems_map_to_pixels() {
        let (mut field, game) = playing();
        field.spawn_gem(1);
        field.gems[0].x = 50.0;
        field.gems[0].y = 25.0;
        field.gems[0].rotation = 90.0;

        let scene = Scene::build(&field, &game, &Settings::default(), 800.0, 600.0);
        let gem = scene.gems[0];
        assert_eq!(gem.center, Vec2::new(400.0, 150.0));
        assert!((gem.radius - 40.0).abs() < 1e-4);
        assert!((gem.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_sizes_scale_with_height() {
        let (field, game) = playing();
        let scene = Scene::build(&field, &game, &Settings::default(), 800.0, 1200.0);
        assert_eq!(scene.scale, 2.0);
        assert_eq!(scene.collector.half_size.y, 40.0);
        assert_eq!(scene.collector.center.y, 1080.0);
    }

    #[test]
    fn test_drawn_collector_matches_catch_reach() {
        use crate::sim::collision::CATCH_TOLERANCE;

        for (width, height) in [(800.0, 600.0), (1920.0, 1080.0), (400.0, 800.0)] {
            let (mut field, game) = playing();
            field.spawn_gem(1);
            let scene = Scene::build(&field, &game, &Settings::default(), width, height);

            let collector_pct = scene.collector.half_size.x / width * 100.0;
            let gem_pct = scene.gems[0].radius / width * 100.0;
            assert!((collector_pct - PLAYER_WIDTH / 2.0).abs() < 1e-3, "{width}x{height}");
            assert!((gem_pct - GEM_SIZE / 2.0).abs() < 1e-3, "{width}x{height}");
            // Drawn edges touch exactly at the catch distance
            assert!((collector_pct + gem_pct - CATCH_TOLERANCE).abs() < 1e-3);
        }
    }

    #[test]
    fn test_reduced_motion_stops_spin() {
        let (mut field, game) = playing();
        field.spawn_gem(1);
        field.gems[0].rotation = 45.0;
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        let scene = Scene::build(&field, &game, &settings, 800.0, 600.0);
        assert_eq!(scene.gems[0].rotation, 0.0);
    }

    #[test]
    fn test_burst_draws_particles_and_flash() {
        let (field, mut game) = playing();
        for kind in GemKind::ALL {
            game.collect(kind);
        }
        assert!(game.snap());
        game.advance(150.0);

        let scene = Scene::build(&field, &game, &Settings::default(), 800.0, 600.0);
        assert!(!scene.particles.is_empty());
        assert!(scene.flash > 0.0);

        let calm = Settings {
            particles: false,
            snap_flash: false,
            ..Settings::default()
        };
        let scene = Scene::build(&field, &game, &calm, 800.0, 600.0);
        assert!(scene.particles.is_empty());
        assert_eq!(scene.flash, 0.0);
    }

    #[test]
    fn test_jewels_sit_inside_collector() {
        let (field, game) = playing();
        let scene = Scene::build(&field, &game, &Settings::default(), 800.0, 600.0);
        let c = scene.collector;
        for jewel in c.jewels() {
            assert!((jewel.x - c.center.x).abs() < c.half_size.x);
        }
    }

    #[test]
    fn test_building_does_not_touch_field() {
        let (mut field, game) = playing();
        field.spawn_gem(2);
        let before = field.gems.clone();
        let _ = Scene::build(&field, &game, &Settings::default(), 640.0, 480.0);
        assert_eq!(field.gems, before);
    }
}
