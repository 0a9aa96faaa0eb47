use daw_timeline::{AutomationLane, Track, TrackKind};
use rand::Rng;

const TRACK_COLORS: [&str; 12] = [
    "#e05d5d", "#e0915d", "#e0c35d", "#a6d65b", "#5dd67a", "#5dd6c0", "#5db3e0", "#5d7fe0",
    "#8a5de0", "#c05de0", "#e05dae", "#9e9e9e",
];

pub fn random_track_color() -> String {
    let index = rand::rng().random_range(0..TRACK_COLORS.len());
    TRACK_COLORS[index].to_string()
}

/// A new audio or MIDI track with the standard Volume and Pan lanes.
pub fn base_track(name: impl Into<String>, kind: TrackKind) -> Track {
    debug_assert!(kind != TrackKind::Master, "use base_master_track for the master bus");
    let mut track = Track::new(name, kind, random_track_color());
    track.automation_lanes = vec![AutomationLane::volume(), AutomationLane::pan()];
    track
}

/// The master track: always armed, and the only track with a Tempo lane.
pub fn base_master_track() -> Track {
    let mut track = Track::new("Master", TrackKind::Master, random_track_color());
    track.armed = true;
    track.automation_lanes = vec![
        AutomationLane::volume(),
        AutomationLane::pan(),
        AutomationLane::tempo(),
    ];
    track
}
