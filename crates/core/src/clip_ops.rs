//! Pure functions for clip operations, designed to be testable without the audio engine.
//!
//! Nothing here mutates its inputs: every edit returns fresh clips that the
//! caller swaps into its track list.

use daw_timeline::{Clip, ClipId, TimeContext, TimelinePosition, Track, round_precise};
use log::debug;

/// Move a clip so that it starts at `target`.
///
/// Every position the clip carries (play range, loop end, trim limits and
/// the audio source placement) shifts by the same span, so the clip moves
/// rigidly. The id is kept: this is a move, not a copy.
pub fn clip_at_pos(target: TimelinePosition, clip: &Clip, ctx: &TimeContext) -> Clip {
    let span = target.diff(&clip.start, ctx);
    if span.is_zero() {
        return clip.clone();
    }
    clip.map_positions(|pos| pos.translate(&span, ctx))
}

/// Duplicate a clip under a fresh id.
pub fn copy_clip(clip: &Clip) -> Clip {
    Clip {
        id: ClipId::new(),
        ..clip.clone()
    }
}

/// Whether two clips share any part of their effective intervals
/// `[start, loop_end.unwrap_or(end))`. Touching clips do not overlap.
///
/// Positions are compared as stored. The editing functions below normalize
/// their inputs first; other callers should do the same with
/// [`Clip::normalized`] when positions may carry float drift.
pub fn clips_overlap(a: &Clip, b: &Clip) -> bool {
    let a_end = a.effective_end();
    let b_end = b.effective_end();

    (a.start < b_end && a_end > b.start) || (a.start == b.start && a_end == b_end)
}

/// Cut a clip at `pos`.
///
/// Returns the clip unchanged when `pos` is not strictly inside its
/// effective interval. Otherwise returns two or three fragments, ordered by
/// start, that tile the original interval:
///
/// * the left fragment keeps the original id and ends at `pos`. Cutting in
///   the play range shortens `end`; cutting in the loop tail keeps `end` and
///   moves `loop_end` to `pos` (or drops it on a repetition boundary right at
///   `end`).
/// * the rest of the repetition `pos` falls in, when the cut is not on a
///   repetition boundary. It keeps the content alignment of that
///   repetition, so its audio source lines up with what was playing.
/// * the remaining repetitions, re-anchored on the next repetition start.
///   They keep looping only while more than one playthrough is left.
pub fn slice_clip(clip: &Clip, pos: TimelinePosition, ctx: &TimeContext) -> Vec<Clip> {
    let ts = &ctx.time_signature;
    let clip = &clip.normalized(ts);
    let pos = pos.normalized(ts);

    let effective_end = clip.effective_end();
    if pos <= clip.start || pos >= effective_end {
        return vec![clip.clone()];
    }
    clip.debug_assert_well_formed();

    let start_margin = clip.start.to_margin(ctx);
    let width = round_precise(clip.end.to_margin(ctx) - start_margin);
    let repetition_start = |index: u32| {
        TimelinePosition::from_margin(start_margin + index as f64 * width, ctx)
    };

    // Which playthrough the cut lands in; 0 is the original run.
    let repetition = if pos < clip.end {
        0
    } else {
        let past_end = pos.to_margin(ctx) - clip.end.to_margin(ctx);
        1 + round_precise(past_end / width).floor() as u32
    };
    let on_boundary = repetition > 0 && pos == repetition_start(repetition);

    let mut fragments = Vec::with_capacity(3);

    let mut left = clip.clone();
    if repetition == 0 {
        left.end = pos;
        left.loop_end = None;
    } else {
        left.loop_end = (pos > clip.end).then_some(pos);
    }
    fragments.push(left);

    let next = if on_boundary {
        repetition
    } else {
        let mut rest = repetition_copy(clip, repetition_start(repetition), ctx);
        rest.start = pos;
        rest.end = rest.end.min(effective_end);
        rest.loop_end = None;
        fragments.push(rest);
        repetition + 1
    };

    let tail_start = repetition_start(next);
    if tail_start < effective_end {
        let mut tail = repetition_copy(clip, tail_start, ctx);
        if tail.end < effective_end {
            tail.loop_end = Some(effective_end);
        } else {
            tail.end = effective_end;
            tail.loop_end = None;
        }
        fragments.push(tail);
    }

    debug!(
        "sliced clip {} at {} into {} fragments (repetition {})",
        clip.id,
        pos,
        fragments.len(),
        repetition
    );
    fragments
}

/// A fresh copy of `clip` moved so its content starts at `start`.
fn repetition_copy(clip: &Clip, start: TimelinePosition, ctx: &TimeContext) -> Clip {
    clip_at_pos(start, &copy_clip(clip), ctx)
}

/// Remove the part of `clip` covered by `other`.
///
/// Cuts at `other`'s effective end and keeps whatever lies after it, then
/// cuts the front piece at `other`'s start and keeps whatever lies before.
/// The result holds zero, one or two fragments (two when `other` sits
/// inside `clip`).
pub fn remove_clip_overlap(clip: &Clip, other: &Clip, ctx: &TimeContext) -> Vec<Clip> {
    let other = &other.normalized(&ctx.time_signature);
    let other_end = other.effective_end();
    let mut before = Vec::new();
    let mut after = Vec::new();

    for fragment in slice_clip(clip, other_end, ctx) {
        if fragment.start >= other_end {
            after.push(fragment);
            continue;
        }
        before.extend(
            slice_clip(&fragment, other.start, ctx)
                .into_iter()
                .filter(|piece| piece.effective_end() <= other.start),
        );
    }

    before.extend(after);
    before
}

/// Resolve every overlap in `clips`.
///
/// Each clip is trimmed against `priority` first (unless it is the
/// priority clip, which passes through unchanged), then against every clip
/// that comes after it in the list. Later clips therefore win over earlier
/// ones, matching drag-and-drop where the last dropped clip stays whole.
///
/// Returns the surviving fragments of all clips, in input order.
pub fn remove_all_clip_overlap(
    clips: &[Clip],
    priority: Option<&Clip>,
    ctx: &TimeContext,
) -> Vec<Clip> {
    let ts = &ctx.time_signature;
    let clips: Vec<Clip> = clips.iter().map(|clip| clip.normalized(ts)).collect();
    let priority = priority.map(|clip| clip.normalized(ts));
    let priority = priority.as_ref();

    let is_priority = |clip: &Clip| priority.is_some_and(|p| p.id == clip.id);
    let mut resolved = Vec::with_capacity(clips.len());

    for (index, clip) in clips.iter().enumerate() {
        if is_priority(clip) {
            resolved.push(clip.clone());
            continue;
        }

        let mut fragments = vec![clip.clone()];
        if let Some(priority) = priority {
            fragments = trim_against(fragments, priority, ctx);
        }
        for later in clips[index + 1..].iter().filter(|c| !is_priority(*c)) {
            if fragments.is_empty() {
                break;
            }
            fragments = trim_against(fragments, later, ctx);
        }

        if fragments.len() != 1 || fragments[0] != *clip {
            debug!("clip {} resolved into {} fragments", clip.id, fragments.len());
        }
        resolved.extend(fragments);
    }

    resolved
}

fn trim_against(fragments: Vec<Clip>, other: &Clip, ctx: &TimeContext) -> Vec<Clip> {
    fragments
        .into_iter()
        .flat_map(|fragment| {
            if clips_overlap(&fragment, other) {
                remove_clip_overlap(&fragment, other, ctx)
            } else {
                vec![fragment]
            }
        })
        .collect()
}

/// Drop `clip` onto `track`.
///
/// The clip takes priority: existing clips under it are trimmed, split or
/// removed. A clip already on the track with the same id is replaced, so
/// this also commits a drag. Clips come back sorted by start.
pub fn insert_clip(track: &Track, clip: Clip, ctx: &TimeContext) -> Track {
    let mut clips: Vec<Clip> = track
        .clips
        .iter()
        .filter(|c| c.id != clip.id)
        .cloned()
        .collect();
    clips.push(clip.clone());

    let mut clips = remove_all_clip_overlap(&clips, Some(&clip), ctx);
    clips.sort_by(|a, b| a.start.cmp(&b.start));

    Track {
        clips,
        ..track.clone()
    }
}
