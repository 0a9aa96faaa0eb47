//! Reading automation lanes at arbitrary timeline positions.

use daw_timeline::{AutomationLane, Envelope, TimeContext, TimelinePosition, VOLUME_MAX_DB};

/// dB per decade of the fader curve.
const FADER_DB_SPAN: f64 = 80.0;

pub fn lerp(min: f64, max: f64, t: f64) -> f64 {
    min + (max - min) * t
}

/// Where `value` sits between `min` and `max`; 0 for an empty range.
pub fn inverse_lerp(min: f64, max: f64, value: f64) -> f64 {
    if max == min {
        return 0.0;
    }
    (value - min) / (max - min)
}

/// Fader position in `[0, 1]` for a level in dB. `-inf` maps to 0 and the
/// +6 dB ceiling to 1.
pub fn volume_to_normalized(db: f64) -> f64 {
    if db == f64::NEG_INFINITY {
        return 0.0;
    }
    10f64.powf((db - VOLUME_MAX_DB) / FADER_DB_SPAN).clamp(0.0, 1.0)
}

/// Inverse of [`volume_to_normalized`].
pub fn normalized_to_volume(normalized: f64) -> f64 {
    if normalized <= 0.0 {
        return f64::NEG_INFINITY;
    }
    FADER_DB_SPAN * normalized.min(1.0).log10() + VOLUME_MAX_DB
}

fn to_normalized(lane: &AutomationLane, value: f64) -> f64 {
    match lane.envelope {
        Envelope::Volume => volume_to_normalized(value),
        _ => inverse_lerp(lane.min_value, lane.max_value, value),
    }
}

fn from_normalized(lane: &AutomationLane, normalized: f64) -> f64 {
    match lane.envelope {
        Envelope::Volume => normalized_to_volume(normalized),
        _ => lerp(lane.min_value, lane.max_value, normalized),
    }
}

/// Value of `lane` at `pos`, or `None` if the lane has no nodes.
///
/// Outside the node range the nearest node's value holds. Between two
/// nodes the values are interpolated linearly in fader space rather than
/// in raw units, so a volume ramp follows the fader curve instead of a
/// straight line in dB.
pub fn automated_value_at_pos(
    pos: TimelinePosition,
    lane: &AutomationLane,
    ctx: &TimeContext,
) -> Option<f64> {
    let nodes = lane.sorted_nodes();
    let first = nodes.first()?;
    let last = nodes.last()?;

    if pos <= first.pos {
        return Some(first.value);
    }
    if pos >= last.pos {
        return Some(last.value);
    }

    // `pos` is strictly inside the node range, so a later node exists and
    // it is not the first one. Stacked nodes resolve to the last of the stack.
    let index = nodes.iter().position(|node| node.pos > pos)?;
    let (prev, next) = (nodes[index - 1], nodes[index]);

    let prev_margin = prev.pos.to_margin(ctx);
    let width = next.pos.to_margin(ctx) - prev_margin;
    if width <= 0.0 {
        return Some(next.value);
    }

    let t = (pos.to_margin(ctx) - prev_margin) / width;
    let normalized = lerp(to_normalized(lane, prev.value), to_normalized(lane, next.value), t);
    Some(from_normalized(lane, normalized))
}
