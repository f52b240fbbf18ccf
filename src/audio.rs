//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Each effect is a short list of oscillator notes; [`AudioManager`] turns
//! them into Web Audio nodes on the web.

use crate::game::GameEvent;
use crate::sim::GemKind;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Gem caught; pitch follows the gem kind
    GemCollect(GemKind),
    /// Gem fell through
    LifeLost,
    /// Snap triggered
    Snap,
    /// Snap burst finished
    SnapComplete,
    GameOver,
    Victory,
    /// Leaderboard accepted the score
    ScoreSubmitted,
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

/// One oscillator note with an exponential decay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub wave: Wave,
    /// Start frequency (Hz)
    pub freq: f32,
    /// Frequency ramped to by the end, if it glides
    pub glide_to: Option<f32>,
    /// Offset from the trigger time (seconds)
    pub start: f64,
    /// Decay time (seconds)
    pub duration: f64,
    /// Peak gain before volume scaling
    pub gain: f32,
}

impl Note {
    const fn new(wave: Wave, freq: f32, start: f64, duration: f64, gain: f32) -> Self {
        Self {
            wave,
            freq,
            glide_to: None,
            start,
            duration,
            gain,
        }
    }

    const fn glide(mut self, to: f32) -> Self {
        self.glide_to = Some(to);
        self
    }
}

/// Rising arpeggio: one note per frequency, `spacing` seconds apart
fn arpeggio(wave: Wave, freqs: &[f32], spacing: f64, duration: f64, gain: f32) -> Vec<Note> {
    freqs
        .iter()
        .enumerate()
        .map(|(i, &freq)| Note::new(wave, freq, i as f64 * spacing, duration, gain))
        .collect()
}

impl SoundEffect {
    /// Sound for a session event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::QuestStarted => None,
            GameEvent::GemCollected(kind) => Some(SoundEffect::GemCollect(*kind)),
            GameEvent::LifeLost { .. } => Some(SoundEffect::LifeLost),
            GameEvent::GameOver => Some(SoundEffect::GameOver),
            GameEvent::SnapStarted { .. } => Some(SoundEffect::Snap),
            GameEvent::SnapComplete => Some(SoundEffect::SnapComplete),
            GameEvent::Victory => Some(SoundEffect::Victory),
        }
    }

    /// Notes making up the effect
    pub fn notes(self) -> Vec<Note> {
        match self {
            // Pentatonic ding, one step per kind
            SoundEffect::GemCollect(kind) => {
                let freq = [523.0, 587.0, 659.0, 784.0, 880.0, 1047.0][kind.index()];
                vec![
                    Note::new(Wave::Sine, freq, 0.0, 0.15, 0.3),
                    Note::new(Wave::Triangle, freq * 2.0, 0.03, 0.1, 0.12),
                ]
            }
            SoundEffect::LifeLost => vec![
                Note::new(Wave::Sine, 300.0, 0.0, 0.5, 0.4).glide(60.0),
                Note::new(Wave::Square, 90.0, 0.0, 0.15, 0.15),
            ],
            SoundEffect::Snap => vec![
                // Finger snap crack then a shimmering sweep
                Note::new(Wave::Square, 2500.0, 0.0, 0.04, 0.3),
                Note::new(Wave::Sawtooth, 120.0, 0.0, 0.3, 0.3).glide(40.0),
                Note::new(Wave::Sine, 400.0, 0.05, 1.2, 0.25).glide(1600.0),
            ],
            SoundEffect::SnapComplete => {
                arpeggio(Wave::Triangle, &[400.0, 500.0, 600.0, 800.0], 0.1, 0.4, 0.3)
            }
            SoundEffect::GameOver => arpeggio(Wave::Sine, &[400.0, 350.0, 300.0, 200.0], 0.2, 0.3, 0.3),
            SoundEffect::Victory => arpeggio(
                Wave::Triangle,
                &[523.0, 659.0, 784.0, 1047.0, 1319.0],
                0.12,
                0.5,
                0.3,
            ),
            SoundEffect::ScoreSubmitted => arpeggio(Wave::Sine, &[600.0, 800.0, 1000.0], 0.08, 0.15, 0.25),
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{Note, SoundEffect, Wave};
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        gain: f32,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx, gain: 0.8 }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Pick up volume and mute from the player's settings
        pub fn apply_settings(&mut self, settings: &Settings) {
            self.gain = settings.sfx_gain();
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            let vol = self.gain;
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let now = ctx.current_time();
            for note in effect.notes() {
                play_note(ctx, &note, now, vol);
            }
        }
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    fn play_note(ctx: &AudioContext, note: &Note, now: f64, vol: f32) {
        let wave = match note.wave {
            Wave::Sine => OscillatorType::Sine,
            Wave::Triangle => OscillatorType::Triangle,
            Wave::Square => OscillatorType::Square,
            Wave::Sawtooth => OscillatorType::Sawtooth,
        };
        let Some((osc, gain)) = create_osc(ctx, note.freq, wave) else {
            return;
        };
        let t = now + note.start;
        let end = t + note.duration;

        gain.gain().set_value_at_time(vol * note.gain, t).ok();
        gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok();
        if let Some(to) = note.glide_to {
            osc.frequency().set_value_at_time(note.freq, t).ok();
            osc.frequency().exponential_ramp_to_value_at_time(to, end).ok();
        }

        osc.start_with_when(t).ok();
        osc.stop_with_when(end + 0.05).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_gem_has_its_own_pitch() {
        let mut pitches: Vec<f32> = GemKind::ALL
            .iter()
            .map(|k| SoundEffect::GemCollect(*k).notes()[0].freq)
            .collect();
        pitches.dedup();
        assert_eq!(pitches.len(), 6);
    }

    #[test]
    fn test_events_map_to_sounds() {
        assert_eq!(SoundEffect::for_event(&GameEvent::QuestStarted), None);
        assert_eq!(
            SoundEffect::for_event(&GameEvent::LifeLost { lives: 2 }),
            Some(SoundEffect::LifeLost)
        );
        assert_eq!(
            SoundEffect::for_event(&GameEvent::Victory),
            Some(SoundEffect::Victory)
        );
    }

    #[test]
    fn test_notes_are_audible() {
        let effects = [
            SoundEffect::LifeLost,
            SoundEffect::Snap,
            SoundEffect::SnapComplete,
            SoundEffect::GameOver,
            SoundEffect::Victory,
            SoundEffect::ScoreSubmitted,
        ];
        for effect in effects {
            let notes = effect.notes();
            assert!(!notes.is_empty());
            assert!(notes.iter().all(|n| n.freq > 0.0 && n.duration > 0.0 && n.gain > 0.0));
        }
    }
}
