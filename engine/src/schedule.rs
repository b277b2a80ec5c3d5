//! The boot-log schedule: progress stages and the adaptive duration factor.
//!
//! Two clocks exist in the sequence. The message schedule defined here is
//! stretched or compressed by [`AdaptiveScale`]; the phase durations in
//! [`crate::phase`] are fixed. The only link between them is the explicit
//! [`BOOT_HOLD_RATIO`].

use crate::context::TimingFacts;

/// Length of the unscaled message schedule.
pub const BASE_DURATION_MS: u64 = 5_000;

/// Integer ratio between the boot phase and the message schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub numerator: u64,
    pub denominator: u64,
}

/// The boot phase holds the finished log on screen for a while after the
/// last message: 7/5 of the schedule.
pub const BOOT_HOLD_RATIO: Ratio = Ratio {
    numerator: 7,
    denominator: 5,
};

/// Boot phase duration derived from the schedule (7000 ms).
pub const BOOT_PHASE_MS: u64 =
    BASE_DURATION_MS * BOOT_HOLD_RATIO.numerator / BOOT_HOLD_RATIO.denominator;

/// Total load time assumed when the timing source reports none.
pub const FALLBACK_TOTAL_MS: f64 = 500.0;

pub const SCALE_MIN: f64 = 0.7;
pub const SCALE_MAX: f64 = 1.3;

/// One labelled slice of the unscaled schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStage {
    pub label: &'static str,
    pub duration_ms: u64,
    pub start_at_ms: u64,
}

impl ProgressStage {
    pub const fn end_ms(&self) -> u64 {
        self.start_at_ms + self.duration_ms
    }
}

/// Gap-free partition of `[0, BASE_DURATION_MS)`.
pub const PROGRESS_STAGES: [ProgressStage; 5] = [
    ProgressStage {
        label: "Resolving host",
        duration_ms: 800,
        start_at_ms: 0,
    },
    ProgressStage {
        label: "Establishing connection",
        duration_ms: 1_000,
        start_at_ms: 800,
    },
    ProgressStage {
        label: "Downloading document",
        duration_ms: 1_200,
        start_at_ms: 1_800,
    },
    ProgressStage {
        label: "Parsing DOM",
        duration_ms: 1_200,
        start_at_ms: 3_000,
    },
    ProgressStage {
        label: "Rendering page",
        duration_ms: 800,
        start_at_ms: 4_200,
    },
];

pub fn progress_stages() -> &'static [ProgressStage] {
    &PROGRESS_STAGES
}

/// Multiplier applied to every base delay and stage boundary.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct AdaptiveScale(f64);

impl AdaptiveScale {
    /// Unit scale; the schedule plays as authored.
    pub const IDENTITY: AdaptiveScale = AdaptiveScale(1.0);

    /// Build a scale from a raw factor, clamped into the allowed band.
    pub fn from_factor(factor: f64) -> Self {
        if factor.is_finite() {
            AdaptiveScale(factor.clamp(SCALE_MIN, SCALE_MAX))
        } else {
            AdaptiveScale::IDENTITY
        }
    }

    pub fn factor(self) -> f64 {
        self.0
    }

    /// Scale a base duration in milliseconds.
    pub fn apply(self, base_ms: u64) -> f64 {
        base_ms as f64 * self.0
    }
}

impl Default for AdaptiveScale {
    fn default() -> Self {
        AdaptiveScale::IDENTITY
    }
}

/// Derive the schedule factor from the measured total load time:
/// `clamp(BASE_DURATION / max(total * 10, 1000), 0.7, 1.3)`.
pub fn scale(timing: &TimingFacts) -> AdaptiveScale {
    let total = if timing.total.is_finite() && timing.total > 0.0 {
        timing.total
    } else {
        FALLBACK_TOTAL_MS
    };
    let denominator = (total * 10.0).max(1_000.0);
    AdaptiveScale::from_factor(BASE_DURATION_MS as f64 / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn timing(total: f64) -> TimingFacts {
        TimingFacts {
            total,
            ..TimingFacts::default()
        }
    }

    #[test]
    fn stages_partition_the_schedule() {
        let stages = progress_stages();
        assert_eq!(stages[0].start_at_ms, 0);
        for pair in stages.windows(2) {
            assert_eq!(pair[1].start_at_ms, pair[0].end_ms());
        }
        assert_eq!(stages.last().map(ProgressStage::end_ms), Some(BASE_DURATION_MS));
        assert_eq!(BASE_DURATION_MS, 5_000);
    }

    #[test]
    fn boot_phase_is_seven_fifths_of_schedule() {
        assert_eq!(BOOT_PHASE_MS, 7_000);
    }

    #[test]
    fn unknown_total_uses_fallback() {
        assert_eq!(scale(&timing(0.0)).factor(), 1.0);
        assert_eq!(scale(&timing(f64::NAN)).factor(), 1.0);
        assert_eq!(scale(&timing(-3.0)).factor(), 1.0);
    }

    #[test]
    fn extremes_stay_in_band() {
        assert_eq!(scale(&timing(1.0e12)).factor(), SCALE_MIN);
        assert_eq!(scale(&timing(10.0)).factor(), SCALE_MAX);
    }

    #[test]
    fn mid_range_is_proportional() {
        // 5000 / (450 * 10) = 1.111..
        let factor = scale(&timing(450.0)).factor();
        assert!((factor - 5_000.0 / 4_500.0).abs() < 1e-9);
    }

    #[test]
    fn apply_multiplies_base_values() {
        let s = AdaptiveScale::from_factor(1.2);
        assert!((s.apply(1_000) - 1_200.0).abs() < 1e-9);
        assert_eq!(AdaptiveScale::from_factor(f64::INFINITY), AdaptiveScale::IDENTITY);
    }
}
