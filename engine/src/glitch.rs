//! Corruption-phase text scrambling.
//!
//! A [`GlitchField`] is stable between reshuffles: scrambling the same row
//! twice in one generation gives the same result, so renders are pure and
//! only the glitch interval changes what is on screen.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::influence::InfluenceParams;

pub const GLITCH_GLYPHS: &[char] = &[
    '█', '▓', '▒', '░', '#', '%', '&', '@', '$', '!', '?', '/', '\\', '|', '~', '^',
];

pub const FALLBACK_GLYPH: char = '░';

/// Banner lines flashed over the log while it corrupts.
pub const GLITCH_MESSAGES: &[&str] = &[
    "FATAL: page table corrupted",
    "kernel: BUG: unable to handle page fault",
    "ERR_CONTENT_DECODING_FAILED",
    "checksum mismatch in response body",
    "panic: runtime error: index out of range",
    "SIGSEGV at 0x00000404",
];

pub const FALLBACK_GLITCH_MESSAGE: &str = "ERR_UNKNOWN";

/// Scramble probability at the very start of corruption.
const BASE_INTENSITY: f64 = 0.05;
/// Extra probability contributed by phase progress.
const PROGRESS_INTENSITY: f64 = 0.8;
/// Extra probability at the pointer's cell.
const POINTER_BOOST: f64 = 0.5;

pub fn glyph_at(index: usize) -> char {
    GLITCH_GLYPHS.get(index).copied().unwrap_or(FALLBACK_GLYPH)
}

pub fn glitch_message_at(index: usize) -> &'static str {
    GLITCH_MESSAGES
        .get(index)
        .copied()
        .unwrap_or(FALLBACK_GLITCH_MESSAGE)
}

#[derive(Debug, Clone)]
pub struct GlitchField {
    seed: u64,
    generation: u64,
}

impl GlitchField {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advance to a new scramble pattern.
    pub fn reshuffle(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Scramble probability for a cell ignoring the pointer.
    pub fn base_intensity(progress: f64) -> f64 {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        BASE_INTENSITY + PROGRESS_INTENSITY * progress.powf(1.5)
    }

    /// Scramble probability for cell `(x, y)`.
    pub fn intensity_at(
        x: u16,
        y: u16,
        progress: f64,
        pointer: Option<(u16, u16)>,
        influence: InfluenceParams,
    ) -> f64 {
        let base = Self::base_intensity(progress);
        let boost = match pointer {
            Some((px, py)) if influence.disruption_radius > 0.0 => {
                let dx = f64::from(x) - f64::from(px);
                // Cells are about twice as tall as they are wide.
                let dy = (f64::from(y) - f64::from(py)) * 2.0;
                let distance = (dx * dx + dy * dy).sqrt();
                let falloff = 1.0 - distance / influence.disruption_radius;
                POINTER_BOOST * falloff.max(0.0)
            }
            _ => 0.0,
        };
        (base + boost).min(1.0)
    }

    fn row_rng(&self, row: u16) -> StdRng {
        let mixed = self.seed
            ^ self.generation.rotate_left(29)
            ^ u64::from(row).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(mixed)
    }

    /// Scramble one rendered row. Whitespace is left alone so the layout of
    /// the log survives.
    pub fn scramble(
        &self,
        text: &str,
        row: u16,
        progress: f64,
        pointer: Option<(u16, u16)>,
        influence: InfluenceParams,
    ) -> String {
        let mut rng = self.row_rng(row);
        text.chars()
            .enumerate()
            .map(|(col, ch)| {
                let roll: f64 = rng.random();
                let pick = rng.random_range(0..GLITCH_GLYPHS.len());
                if ch.is_whitespace() {
                    return ch;
                }
                let x = u16::try_from(col).unwrap_or(u16::MAX);
                if roll < Self::intensity_at(x, row, progress, pointer, influence) {
                    glyph_at(pick)
                } else {
                    ch
                }
            })
            .collect()
    }

    /// Banner for the current generation.
    pub fn banner(&self) -> &'static str {
        let mut rng = self.row_rng(u16::MAX);
        glitch_message_at(rng.random_range(0..GLITCH_MESSAGES.len()))
    }
}
