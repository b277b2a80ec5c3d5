//! Pointer motion turned into phase-dependent effect parameters.
//!
//! Mouse moves are sampled in terminal cells. The tracker keeps the last
//! position and an energy in `[0, 1]` derived from pointer speed; energy
//! decays exponentially once the pointer stops.

use std::time::{Duration, Instant};

use crate::phase::Phase;

/// Speed (cells per second) that saturates the energy.
const SATURATION_SPEED: f64 = 120.0;

/// Time constant of the energy decay.
const DECAY_TAU: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfluenceParams {
    /// Brightness boost for the text under the pointer, in `[0, 1]`.
    pub glow_intensity: f64,
    /// Radius in cells within which the glitch field scrambles harder.
    pub disruption_radius: f64,
}

impl InfluenceParams {
    pub const NONE: InfluenceParams = InfluenceParams {
        glow_intensity: 0.0,
        disruption_radius: 0.0,
    };
}

#[derive(Debug, Clone, Copy, Default)]
struct Sample {
    x: u16,
    y: u16,
    at: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct MouseInfluence {
    last: Sample,
    energy: f64,
}

impl MouseInfluence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last pointer cell, if the pointer has moved at all.
    pub fn position(&self) -> Option<(u16, u16)> {
        self.last.at.map(|_| (self.last.x, self.last.y))
    }

    pub fn on_move(&mut self, x: u16, y: u16, at: Instant) {
        if let Some(prev) = self.last.at {
            let dt = at.saturating_duration_since(prev).as_secs_f64();
            let dx = f64::from(x) - f64::from(self.last.x);
            let dy = f64::from(y) - f64::from(self.last.y);
            let distance = (dx * dx + dy * dy).sqrt();
            // Terminals report coalesced moves; treat a zero interval as one frame.
            let speed = distance / dt.max(1.0 / 60.0);
            let instant = (speed / SATURATION_SPEED).min(1.0);
            let decayed = self.energy_at(at);
            self.energy = decayed.max(instant);
        }
        self.last = Sample { x, y, at: Some(at) };
    }

    /// Energy after decay up to `now`.
    pub fn energy_at(&self, now: Instant) -> f64 {
        match self.last.at {
            Some(at) => {
                let idle = now.saturating_duration_since(at).as_secs_f64();
                self.energy * (-idle / DECAY_TAU.as_secs_f64()).exp()
            }
            None => 0.0,
        }
    }

    pub fn params(&self, phase: Phase, now: Instant) -> InfluenceParams {
        if self.last.at.is_none() {
            return InfluenceParams::NONE;
        }
        let energy = self.energy_at(now);
        match phase {
            Phase::Boot => InfluenceParams {
                glow_intensity: 0.15 + 0.35 * energy,
                disruption_radius: 0.0,
            },
            Phase::Corruption => InfluenceParams {
                glow_intensity: 0.4 + 0.6 * energy,
                disruption_radius: 2.0 + 8.0 * energy,
            },
            Phase::Aftermath => InfluenceParams {
                glow_intensity: 0.1 + 0.2 * energy,
                disruption_radius: 1.0 + 2.0 * energy,
            },
        }
    }
}
