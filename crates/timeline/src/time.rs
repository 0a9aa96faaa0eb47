use serde::{Deserialize, Serialize};

use crate::position::TimelinePosition;

/// Number of decimal digits kept by every margin/sixteenth computation.
pub const PRECISION_DIGITS: i32 = 6;

/// Measure ceiling of a 4/4 timeline.
pub const BASE_MAX_MEASURES: u32 = 1000;

/// Round a margin or sixteenth count to [`PRECISION_DIGITS`].
///
/// Boundary comparisons in the slicing engine depend on exact equality, so
/// every value derived from floating point arithmetic goes through here.
pub fn round_precise(value: f64) -> f64 {
    let scale = 10f64.powi(PRECISION_DIGITS);
    let rounded = (value * scale).round() / scale;
    // Normalize -0.0
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        debug_assert!(numerator > 0, "time signature needs at least one beat");
        debug_assert!(
            denominator.is_power_of_two() && denominator <= 16,
            "note value must be a power of two no shorter than a sixteenth"
        );
        Self {
            numerator,
            denominator,
        }
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.numerator
    }

    /// How many sixteenth notes fit in one beat (4 in x/4, 2 in x/8).
    pub fn sixteenths_per_beat(&self) -> f64 {
        16.0 / self.denominator as f64
    }

    pub fn sixteenths_per_bar(&self) -> f64 {
        self.sixteenths_per_beat() * self.numerator as f64
    }

    /// Usable measure count for this signature. Fewer beats per bar or
    /// longer note values lower the ceiling.
    pub fn max_measures(&self) -> u32 {
        let scale = (self.numerator as f64 / 4.0) * (self.denominator as f64 / 4.0);
        ((BASE_MAX_MEASURES as f64 * scale).floor() as u32).max(1)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl From<(u32, u32)> for TimeSignature {
    fn from((numerator, denominator): (u32, u32)) -> Self {
        Self::new(numerator, denominator)
    }
}

impl From<TimeSignature> for (u32, u32) {
    fn from(ts: TimeSignature) -> Self {
        (ts.numerator, ts.denominator)
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Global timeline settings consulted by every margin conversion.
///
/// Margins are linear in elapsed sixteenth notes: one quarter note is
/// `pixels_per_beat` wide regardless of the time signature, so changing the
/// signature keeps margins stable while the bar/beat decomposition moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeContext {
    pub tempo: f64,
    pub time_signature: TimeSignature,
    pub pixels_per_beat: f64,
}

impl TimeContext {
    pub fn new(tempo: f64, time_signature: impl Into<TimeSignature>, pixels_per_beat: f64) -> Self {
        Self {
            tempo,
            time_signature: time_signature.into(),
            pixels_per_beat,
        }
    }

    pub fn with_time_signature(mut self, time_signature: impl Into<TimeSignature>) -> Self {
        self.time_signature = time_signature.into();
        self
    }

    pub fn sixteenth_width(&self) -> f64 {
        self.pixels_per_beat / 4.0
    }

    /// Width of one beat of the current signature.
    pub fn beat_width(&self) -> f64 {
        self.sixteenth_width() * self.time_signature.sixteenths_per_beat()
    }

    pub fn bar_width(&self) -> f64 {
        self.sixteenth_width() * self.time_signature.sixteenths_per_bar()
    }

    pub fn sixteenths_to_margin(&self, sixteenths: f64) -> f64 {
        round_precise(sixteenths * self.sixteenth_width())
    }

    pub fn margin_to_sixteenths(&self, margin: f64) -> f64 {
        round_precise(margin / self.sixteenth_width())
    }

    pub fn sixteenths_to_seconds(&self, sixteenths: f64) -> f64 {
        let quarters = sixteenths / 4.0;
        quarters * 60.0 / self.tempo
    }

    pub fn seconds_to_sixteenths(&self, seconds: f64) -> f64 {
        let quarters = seconds * self.tempo / 60.0;
        round_precise(quarters * 4.0)
    }

    /// First position past the last usable measure.
    pub fn timeline_end(&self) -> TimelinePosition {
        TimelinePosition::new(self.time_signature.max_measures() + 1, 1, 0.0)
    }

    pub fn timeline_width(&self) -> f64 {
        self.timeline_end().to_margin(self)
    }
}

impl Default for TimeContext {
    fn default() -> Self {
        Self::new(120.0, TimeSignature::default(), 100.0)
    }
}
