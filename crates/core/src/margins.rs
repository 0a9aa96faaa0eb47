//! Re-deriving stored positions when the timeline settings change.
//!
//! A position's bar/beat triple is tied to the time signature it was built
//! under. When the signature changes every stored position is rebuilt from
//! its margin so clips and automation stay where they were on screen and in
//! time.

use daw_timeline::{AutomationNode, Clip, TimeContext, TimelinePosition, Track};
use log::debug;

/// Rebuild `pos` (normalized under `from`) under `to`, keeping its margin.
/// Positions past the end of the new timeline clamp to it.
pub fn preserve_pos_margin(
    pos: TimelinePosition,
    from: &TimeContext,
    to: &TimeContext,
) -> TimelinePosition {
    let rebuilt = TimelinePosition::from_margin(pos.to_margin(from), to);
    rebuilt.min(to.timeline_end())
}

/// Rebuild every position of `clip`. A loop that no longer reaches past
/// `end` afterwards is dropped.
pub fn preserve_clip_margins(clip: &Clip, from: &TimeContext, to: &TimeContext) -> Clip {
    let mut clip = clip.map_positions(|pos| preserve_pos_margin(pos, from, to));
    if clip.loop_end.is_some_and(|loop_end| loop_end <= clip.end) {
        clip.loop_end = None;
    }
    clip
}

/// Rebuild the clips and automation nodes of `track`. Clips that start at
/// or past the end of the new timeline no longer fit and are dropped.
pub fn preserve_track_margins(track: &Track, from: &TimeContext, to: &TimeContext) -> Track {
    let timeline_end = to.timeline_end();
    let clips = track
        .clips
        .iter()
        .map(|clip| preserve_clip_margins(clip, from, to))
        .filter(|clip| {
            let fits = clip.start < timeline_end;
            if !fits {
                debug!("dropping clip {} past the end of the timeline", clip.id);
            }
            fits
        })
        .collect();

    let automation_lanes = track
        .automation_lanes
        .iter()
        .map(|lane| {
            let mut lane = lane.clone();
            lane.nodes = lane
                .nodes
                .iter()
                .map(|node| AutomationNode {
                    pos: preserve_pos_margin(node.pos, from, to),
                    ..node.clone()
                })
                .collect();
            lane
        })
        .collect();

    Track {
        clips,
        automation_lanes,
        ..track.clone()
    }
}
