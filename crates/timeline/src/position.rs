//! Musical-time coordinates and the signed offsets between them.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::time::{PRECISION_DIGITS, TimeContext, TimeSignature, round_precise};

/// A bar/beat/sixteenth coordinate on the timeline.
///
/// Bars and beats are 1-based. `sixteenth` counts sixteenth notes inside
/// the beat and carries the fractional tick precision, so it ranges over
/// `[0, 16 / denominator)`.
///
/// The triple is only meaningful relative to the [`TimeSignature`] it was
/// normalized against; positions from a different signature have to be
/// rebuilt from their margin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimelinePosition {
    pub bar: u32,
    pub beat: u32,
    pub sixteenth: f64,
}

impl TimelinePosition {
    pub const fn new(bar: u32, beat: u32, sixteenth: f64) -> Self {
        Self {
            bar,
            beat,
            sixteenth,
        }
    }

    /// Bar 1, beat 1.
    pub const fn origin() -> Self {
        Self::new(1, 1, 0.0)
    }

    /// Start of `bar`.
    pub const fn bar(bar: u32) -> Self {
        Self::new(bar, 1, 0.0)
    }

    /// Sixteenth notes elapsed since the origin.
    pub fn total_sixteenths(&self, ts: &TimeSignature) -> f64 {
        let beats = self.bar.saturating_sub(1) as f64 * ts.numerator as f64
            + self.beat.saturating_sub(1) as f64;
        round_precise(beats * ts.sixteenths_per_beat() + self.sixteenth)
    }

    /// Normalize an elapsed sixteenth count into bar/beat/sixteenth.
    /// Negative counts clamp to the origin.
    pub fn from_sixteenths(total: f64, ts: &TimeSignature) -> Self {
        let total = round_precise(total.max(0.0));
        let per_bar = ts.sixteenths_per_bar();
        let per_beat = ts.sixteenths_per_beat();

        let bar_index = (total / per_bar).floor();
        let in_bar = round_precise(total - bar_index * per_bar);
        let beat_index = (in_bar / per_beat)
            .floor()
            .min(ts.numerator.saturating_sub(1) as f64);
        let sixteenth = round_precise(in_bar - beat_index * per_beat).max(0.0);

        Self::new(bar_index as u32 + 1, beat_index as u32 + 1, sixteenth)
    }

    /// Re-derive the triple from its rounded sixteenth count, so drift such
    /// as `1.4.3.9999999` carries into `2.1.0` and compares equal to it.
    pub fn normalized(&self, ts: &TimeSignature) -> Self {
        Self::from_sixteenths(self.total_sixteenths(ts), ts)
    }

    pub fn to_margin(&self, ctx: &TimeContext) -> f64 {
        ctx.sixteenths_to_margin(self.total_sixteenths(&ctx.time_signature))
    }

    pub fn from_margin(margin: f64, ctx: &TimeContext) -> Self {
        Self::from_sixteenths(ctx.margin_to_sixteenths(margin), &ctx.time_signature)
    }

    pub fn to_seconds(&self, ctx: &TimeContext) -> f64 {
        ctx.sixteenths_to_seconds(self.total_sixteenths(&ctx.time_signature))
    }

    pub fn from_seconds(seconds: f64, ctx: &TimeContext) -> Self {
        Self::from_sixteenths(ctx.seconds_to_sixteenths(seconds), &ctx.time_signature)
    }

    /// Offset this position by a signed span.
    ///
    /// The arithmetic happens on the margin axis, so carries across beat and
    /// bar boundaries come out of the normalization in [`Self::from_margin`].
    pub fn translate(&self, span: &TimelineSpan, ctx: &TimeContext) -> Self {
        let offset = ctx.sixteenths_to_margin(span.total_sixteenths(&ctx.time_signature));
        Self::from_margin(self.to_margin(ctx) + offset, ctx)
    }

    /// Signed span from `other` to `self`: `other.translate(&self.diff(&other))`
    /// lands on `self`.
    pub fn diff(&self, other: &TimelinePosition, ctx: &TimeContext) -> TimelineSpan {
        let delta = self.to_margin(ctx) - other.to_margin(ctx);
        TimelineSpan::from_sixteenths(ctx.margin_to_sixteenths(delta), &ctx.time_signature)
    }

    pub fn snap(&self, grid: SnapGrid, ctx: &TimeContext) -> Self {
        let ts = &ctx.time_signature;
        let unit = match grid {
            SnapGrid::Off => return *self,
            SnapGrid::Bar => ts.sixteenths_per_bar(),
            SnapGrid::Beat => ts.sixteenths_per_beat(),
            SnapGrid::Sixteenth => 1.0,
        };
        let total = self.total_sixteenths(ts);
        Self::from_sixteenths((total / unit).round() * unit, ts)
    }

    fn key(&self) -> (u32, u32, i64) {
        let scale = 10f64.powi(PRECISION_DIGITS);
        (self.bar, self.beat, (self.sixteenth * scale).round() as i64)
    }
}

impl Default for TimelinePosition {
    fn default() -> Self {
        Self::origin()
    }
}

impl PartialEq for TimelinePosition {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TimelinePosition {}

impl PartialOrd for TimelinePosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimelinePosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl std::fmt::Display for TimelinePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.bar, self.beat, self.sixteenth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Positive,
    Negative,
}

/// Signed distance between two positions, decomposed like a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineSpan {
    pub measures: u32,
    pub beats: u32,
    pub sixteenths: f64,
    pub sign: Sign,
}

impl TimelineSpan {
    pub fn new(measures: u32, beats: u32, sixteenths: f64, sign: Sign) -> Self {
        Self {
            measures,
            beats,
            sixteenths,
            sign,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, 0, 0.0, Sign::Positive)
    }

    pub fn from_sixteenths(signed_total: f64, ts: &TimeSignature) -> Self {
        let sign = if signed_total < 0.0 {
            Sign::Negative
        } else {
            Sign::Positive
        };
        let total = round_precise(signed_total.abs());
        let per_bar = ts.sixteenths_per_bar();
        let per_beat = ts.sixteenths_per_beat();

        let measures = (total / per_bar).floor();
        let rest = round_precise(total - measures * per_bar);
        let beats = (rest / per_beat).floor();
        let sixteenths = round_precise(rest - beats * per_beat).max(0.0);

        Self::new(measures as u32, beats as u32, sixteenths, sign)
    }

    pub fn total_sixteenths(&self, ts: &TimeSignature) -> f64 {
        let magnitude = self.measures as f64 * ts.sixteenths_per_bar()
            + self.beats as f64 * ts.sixteenths_per_beat()
            + self.sixteenths;
        match self.sign {
            Sign::Positive => round_precise(magnitude),
            Sign::Negative => round_precise(-magnitude),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.measures == 0 && self.beats == 0 && round_precise(self.sixteenths) == 0.0
    }

    pub fn negate(&self) -> Self {
        let sign = match self.sign {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        };
        Self { sign, ..*self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapGrid {
    Off,
    Bar,
    #[default]
    Beat,
    Sixteenth,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TimeContext {
        TimeContext::default()
    }

    #[test]
    fn test_margin_of_origin_is_zero() {
        assert_eq!(TimelinePosition::origin().to_margin(&ctx()), 0.0);
    }

    #[test]
    fn test_margin_roundtrip() {
        let ctx = ctx();
        for pos in [
            TimelinePosition::new(1, 1, 0.0),
            TimelinePosition::new(3, 2, 1.5),
            TimelinePosition::new(17, 4, 3.999),
            TimelinePosition::new(250, 3, 0.125),
        ] {
            let back = TimelinePosition::from_margin(pos.to_margin(&ctx), &ctx);
            assert_eq!(back, pos, "roundtrip of {pos}");
        }
    }

    #[test]
    fn test_drifted_position_normalizes_onto_boundary() {
        let ts = TimeSignature::default();
        let drifted = TimelinePosition::new(1, 4, 3.9999999);
        assert_ne!(drifted, TimelinePosition::bar(2));

        let normalized = drifted.normalized(&ts);
        assert_eq!(normalized, TimelinePosition::bar(2));
        assert_eq!(normalized.to_margin(&ctx()), drifted.to_margin(&ctx()));
    }

    #[test]
    fn test_margin_roundtrip_compound_meter() {
        let ctx = TimeContext::new(90.0, (6, 8), 80.0);
        let pos = TimelinePosition::new(5, 6, 1.25);
        let back = TimelinePosition::from_margin(pos.to_margin(&ctx), &ctx);
        assert_eq!(back, pos);
    }

    #[test]
    fn test_negative_margin_clamps_to_origin() {
        assert_eq!(
            TimelinePosition::from_margin(-250.0, &ctx()),
            TimelinePosition::origin()
        );
    }

    #[test]
    fn test_translate_carries_into_next_bar() {
        // 1.4.3 + 2 sixteenths crosses the bar line
        let ctx = ctx();
        let pos = TimelinePosition::new(1, 4, 3.0);
        let moved = pos.translate(&TimelineSpan::new(0, 0, 2.0, Sign::Positive), &ctx);
        assert_eq!(moved, TimelinePosition::new(2, 1, 1.0));
    }

    #[test]
    fn test_translate_beats_past_bar_carry() {
        let ctx = ctx();
        let pos = TimelinePosition::new(1, 3, 0.0);
        let moved = pos.translate(&TimelineSpan::new(1, 5, 0.0, Sign::Positive), &ctx);
        assert_eq!(moved, TimelinePosition::new(3, 4, 0.0));
        assert!(moved.beat <= ctx.time_signature.numerator);
    }

    #[test]
    fn test_translate_negative() {
        let ctx = ctx();
        let pos = TimelinePosition::new(3, 1, 0.0);
        let moved = pos.translate(&TimelineSpan::new(0, 1, 2.0, Sign::Negative), &ctx);
        assert_eq!(moved, TimelinePosition::new(2, 3, 2.0));
    }

    #[test]
    fn test_translate_diff_inverse() {
        let ctx = TimeContext::new(120.0, (3, 4), 100.0);
        let points = [
            TimelinePosition::new(1, 1, 0.0),
            TimelinePosition::new(2, 3, 1.75),
            TimelinePosition::new(9, 2, 0.5),
            TimelinePosition::new(40, 1, 3.0),
        ];
        for a in points {
            for b in points {
                let span = b.diff(&a, &ctx);
                assert_eq!(a.translate(&span, &ctx), b, "{a} -> {b}");
            }
        }
    }

    #[test]
    fn test_diff_decomposition() {
        let ctx = ctx();
        let a = TimelinePosition::new(1, 1, 0.0);
        let b = TimelinePosition::new(3, 2, 1.5);
        let span = b.diff(&a, &ctx);
        assert_eq!(span, TimelineSpan::new(2, 1, 1.5, Sign::Positive));
        assert_eq!(a.diff(&b, &ctx), span.negate());
    }

    #[test]
    fn test_zero_span() {
        let ctx = ctx();
        let pos = TimelinePosition::new(5, 2, 1.0);
        assert!(pos.diff(&pos, &ctx).is_zero());
        assert_eq!(pos.translate(&TimelineSpan::zero(), &ctx), pos);
    }

    #[test]
    fn test_ordering_and_tolerant_equality() {
        let a = TimelinePosition::new(2, 1, 0.0);
        let b = TimelinePosition::new(1, 4, 3.9);
        assert!(b < a);
        assert_eq!(
            TimelinePosition::new(1, 2, 1.0000000001),
            TimelinePosition::new(1, 2, 1.0)
        );
        assert_eq!(a.cmp(&a), Ordering::Equal);
    }

    #[test]
    fn test_signature_change_keeps_sixteenth_count() {
        let four_four = ctx();
        let three_four = four_four.with_time_signature((3, 4));
        // Bar 4 in 4/4 is 48 sixteenths in, which is bar 5 in 3/4
        let pos = TimelinePosition::bar(4);
        let margin = pos.to_margin(&four_four);
        let rebuilt = TimelinePosition::from_margin(margin, &three_four);
        assert_eq!(rebuilt, TimelinePosition::bar(5));
        assert_eq!(rebuilt.to_margin(&three_four), margin);
    }

    #[test]
    fn test_seconds() {
        let ctx = ctx();
        assert_eq!(TimelinePosition::bar(2).to_seconds(&ctx), 2.0);
        assert_eq!(TimelinePosition::from_seconds(1.0, &ctx), TimelinePosition::new(1, 3, 0.0));
    }

    #[test]
    fn test_snap() {
        let ctx = ctx();
        let pos = TimelinePosition::new(2, 2, 2.5);
        assert_eq!(pos.snap(SnapGrid::Beat, &ctx), TimelinePosition::new(2, 3, 0.0));
        assert_eq!(pos.snap(SnapGrid::Bar, &ctx), TimelinePosition::bar(2));
        assert_eq!(pos.snap(SnapGrid::Sixteenth, &ctx), TimelinePosition::new(2, 2, 3.0));
        assert_eq!(pos.snap(SnapGrid::Off, &ctx), pos);
    }

    #[test]
    fn test_display() {
        assert_eq!(TimelinePosition::new(3, 2, 1.5).to_string(), "3.2.1.5");
        assert_eq!(TimelinePosition::origin().to_string(), "1.1.0");
    }
}
