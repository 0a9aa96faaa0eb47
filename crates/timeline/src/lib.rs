//! Value types of the arrangement timeline: musical positions and the
//! settings they are measured against, clips, automation lanes and tracks.

pub mod automation;
pub mod clip;
pub mod position;
pub mod time;
pub mod track;

pub use automation::{
    AutomationLane, AutomationNode, Envelope, LaneId, NodeId, PAN_MAX, PAN_MIN, TEMPO_MAX_BPM,
    TEMPO_MIN_BPM, VOLUME_MAX_DB, VOLUME_MIN_DB,
};
pub use clip::{AudioSource, Clip, ClipId, ClipKind};
pub use position::{Sign, SnapGrid, TimelinePosition, TimelineSpan};
pub use time::{BASE_MAX_MEASURES, PRECISION_DIGITS, TimeContext, TimeSignature, round_precise};
pub use track::{Effect, Track, TrackId, TrackKind};
