pub mod arrangement;
pub mod automation;
pub mod clip_ops;
pub mod config;
pub mod margins;
pub mod tracks;

pub use arrangement::{Arrangement, ArrangementError};
pub use automation::{
    automated_value_at_pos, inverse_lerp, lerp, normalized_to_volume, volume_to_normalized,
};
pub use clip_ops::{
    clip_at_pos, clips_overlap, copy_clip, insert_clip, remove_all_clip_overlap,
    remove_clip_overlap, slice_clip,
};
pub use config::{ConfigError, TimelineConfig};
pub use margins::{preserve_clip_margins, preserve_pos_margin, preserve_track_margins};
pub use tracks::{base_master_track, base_track, random_track_color};

pub use daw_timeline::{
    AudioSource, AutomationLane, AutomationNode, Clip, ClipId, ClipKind, Effect, Envelope, LaneId,
    NodeId, Sign, SnapGrid, TimeContext, TimeSignature, TimelinePosition, TimelineSpan, Track,
    TrackId, TrackKind,
};
