use daw_timeline::{
    Clip, ClipId, Envelope, SnapGrid, TimeContext, TimeSignature, TimelinePosition, Track,
    TrackId, TrackKind,
};
use log::debug;

use crate::automation::automated_value_at_pos;
use crate::clip_ops::{clip_at_pos, insert_clip, slice_clip};
use crate::config::TimelineConfig;
use crate::margins::preserve_track_margins;
use crate::tracks::{base_master_track, base_track};

#[derive(Debug, thiserror::Error)]
pub enum ArrangementError {
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    #[error("Clip {clip} not found on track {track}")]
    ClipNotFound { track: TrackId, clip: ClipId },

    #[error("Track {track} has no {envelope:?} lane")]
    LaneNotFound { track: TrackId, envelope: Envelope },
}

/// The track list of a session together with the settings its positions
/// are measured against.
///
/// Edits run through the pure functions in this crate and the resulting
/// tracks replace the old ones, so a track handed out by [`Self::tracks`]
/// is never changed behind the caller's back.
#[derive(Debug, Clone)]
pub struct Arrangement {
    master: Track,
    tracks: Vec<Track>,
    time_context: TimeContext,
    snap: SnapGrid,
}

impl Arrangement {
    pub fn new(time_context: TimeContext) -> Self {
        Self {
            master: base_master_track(),
            tracks: Vec::new(),
            time_context,
            snap: SnapGrid::default(),
        }
    }

    pub fn from_config(config: &TimelineConfig) -> Self {
        let mut arrangement = Self::new(config.time_context());
        arrangement.snap = config.snap;
        arrangement
    }

    pub fn add_track(&mut self, name: impl Into<String>, kind: TrackKind) -> TrackId {
        let track = base_track(name, kind);
        let id = track.id;
        self.tracks.push(track);
        id
    }

    pub fn remove_track(&mut self, id: TrackId) -> Result<Track, ArrangementError> {
        let index = self.track_index(id)?;
        Ok(self.tracks.remove(index))
    }

    /// Any track by id, the master included.
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        if self.master.id == id {
            return Some(&self.master);
        }
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn master(&self) -> &Track {
        &self.master
    }

    pub fn time_context(&self) -> &TimeContext {
        &self.time_context
    }

    pub fn tempo(&self) -> f64 {
        self.time_context.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_context.time_signature
    }

    pub fn snap(&self) -> SnapGrid {
        self.snap
    }

    pub fn set_snap(&mut self, snap: SnapGrid) {
        self.snap = snap;
    }

    /// Drop a clip onto a track; clips underneath it are trimmed.
    pub fn insert_clip(&mut self, track_id: TrackId, clip: Clip) -> Result<(), ArrangementError> {
        let index = self.track_index(track_id)?;
        self.tracks[index] = insert_clip(&self.tracks[index], clip, &self.time_context);
        Ok(())
    }

    /// Drag a clip to `target` (snapped to the grid), possibly onto another
    /// track.
    pub fn move_clip(
        &mut self,
        from: TrackId,
        clip_id: ClipId,
        to: TrackId,
        target: TimelinePosition,
    ) -> Result<(), ArrangementError> {
        let from_index = self.track_index(from)?;
        let to_index = self.track_index(to)?;
        let clip = self.tracks[from_index]
            .clip(clip_id)
            .ok_or(ArrangementError::ClipNotFound {
                track: from,
                clip: clip_id,
            })?;

        let target = target.snap(self.snap, &self.time_context);
        let moved = clip_at_pos(target, clip, &self.time_context);
        debug!("moving clip {clip_id} to {target}");

        if from_index != to_index {
            let source = &self.tracks[from_index];
            self.tracks[from_index] = Track {
                clips: source.clips.iter().filter(|c| c.id != clip_id).cloned().collect(),
                ..source.clone()
            };
        }
        self.tracks[to_index] = insert_clip(&self.tracks[to_index], moved, &self.time_context);
        Ok(())
    }

    /// Cut a clip at `pos`. Returns the ids of the resulting fragments in
    /// timeline order; a cut outside the clip leaves it whole.
    pub fn split_clip(
        &mut self,
        track_id: TrackId,
        clip_id: ClipId,
        pos: TimelinePosition,
    ) -> Result<Vec<ClipId>, ArrangementError> {
        let index = self.track_index(track_id)?;
        let track = &self.tracks[index];
        let clip = track.clip(clip_id).ok_or(ArrangementError::ClipNotFound {
            track: track_id,
            clip: clip_id,
        })?;

        let fragments = slice_clip(clip, pos, &self.time_context);
        let ids = fragments.iter().map(|c| c.id).collect();

        let clips = track
            .clips
            .iter()
            .flat_map(|c| {
                if c.id == clip_id {
                    fragments.clone()
                } else {
                    vec![c.clone()]
                }
            })
            .collect();
        self.tracks[index] = Track {
            clips,
            ..track.clone()
        };
        Ok(ids)
    }

    /// Switch the time signature, rebuilding every stored position so
    /// clips and automation keep their place.
    pub fn set_time_signature(&mut self, time_signature: impl Into<TimeSignature>) {
        let from = self.time_context;
        let to = from.with_time_signature(time_signature);
        if from == to {
            return;
        }
        debug!(
            "time signature {} -> {}",
            from.time_signature, to.time_signature
        );

        self.master = preserve_track_margins(&self.master, &from, &to);
        self.tracks = self
            .tracks
            .iter()
            .map(|track| preserve_track_margins(track, &from, &to))
            .collect();
        self.time_context = to;
    }

    /// Tempo only affects wall-clock time, positions stay as they are.
    pub fn set_tempo(&mut self, tempo: f64) {
        self.time_context.tempo = tempo;
    }

    /// Horizontal zoom. Positions are musical, so nothing is rebuilt.
    pub fn set_pixels_per_beat(&mut self, pixels_per_beat: f64) {
        self.time_context.pixels_per_beat = pixels_per_beat;
    }

    /// Value of a track's automation lane at `pos`; `None` when the track has
    /// no such lane or the lane is empty or disabled.
    pub fn automated_value(
        &self,
        track_id: TrackId,
        envelope: Envelope,
        pos: TimelinePosition,
    ) -> Result<Option<f64>, ArrangementError> {
        let track = self
            .track(track_id)
            .ok_or(ArrangementError::TrackNotFound(track_id))?;
        Ok(track
            .lane(envelope)
            .filter(|lane| lane.enabled)
            .and_then(|lane| automated_value_at_pos(pos, lane, &self.time_context)))
    }

    pub fn set_automation_node(
        &mut self,
        track_id: TrackId,
        envelope: Envelope,
        pos: TimelinePosition,
        value: f64,
    ) -> Result<(), ArrangementError> {
        let track = if self.master.id == track_id {
            &mut self.master
        } else {
            let index = self.track_index(track_id)?;
            &mut self.tracks[index]
        };
        let lane = track
            .automation_lanes
            .iter_mut()
            .find(|lane| lane.envelope == envelope)
            .ok_or(ArrangementError::LaneNotFound {
                track: track_id,
                envelope,
            })?;
        lane.add_node(pos, value);
        Ok(())
    }

    /// Width of the timeline content plus four bars of room, never narrower
    /// than the viewport minimum.
    pub fn timeline_width(&self) -> f64 {
        let content_end = self
            .tracks
            .iter()
            .flat_map(|track| track.clips.iter())
            .map(|clip| clip.effective_end().to_margin(&self.time_context))
            .fold(0.0, f64::max);

        let end_with_padding = content_end + self.time_context.bar_width() * 4.0;
        let min_width = 1200.0;
        end_with_padding
            .max(min_width)
            .min(self.time_context.timeline_width())
    }

    fn track_index(&self, id: TrackId) -> Result<usize, ArrangementError> {
        self.tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or(ArrangementError::TrackNotFound(id))
    }
}

impl Default for Arrangement {
    fn default() -> Self {
        Self::new(TimeContext::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip_ops::clips_overlap;

    fn bar(n: u32) -> TimelinePosition {
        TimelinePosition::bar(n)
    }

    fn clip(start: TimelinePosition, end: TimelinePosition) -> Clip {
        Clip::midi("clip", start, end)
    }

    fn assert_no_overlap(track: &Track) {
        for (i, a) in track.clips.iter().enumerate() {
            for b in &track.clips[i + 1..] {
                assert!(!clips_overlap(a, b));
            }
        }
    }

    #[test]
    fn test_new_arrangement_has_master() {
        let arrangement = Arrangement::default();
        assert!(arrangement.master().is_master());
        assert!(arrangement.tracks().is_empty());
        let master_id = arrangement.master().id;
        assert!(arrangement.track(master_id).is_some());
    }

    #[test]
    fn test_from_config() {
        let config = TimelineConfig {
            tempo: 100.0,
            time_signature: (6, 8),
            snap: SnapGrid::Bar,
            ..TimelineConfig::default()
        };
        let arrangement = Arrangement::from_config(&config);
        assert_eq!(arrangement.tempo(), 100.0);
        assert_eq!(arrangement.time_signature(), TimeSignature::new(6, 8));
        assert_eq!(arrangement.snap(), SnapGrid::Bar);
    }

    #[test]
    fn test_insert_clip_resolves_overlap() {
        let mut arrangement = Arrangement::default();
        let track_id = arrangement.add_track("Drums", TrackKind::Audio);

        arrangement.insert_clip(track_id, clip(bar(1), bar(3))).expect("insert");
        arrangement.insert_clip(track_id, clip(bar(2), bar(4))).expect("insert");

        let track = arrangement.track(track_id).expect("track");
        let ranges: Vec<_> = track.clips.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(ranges, vec![(bar(1), bar(2)), (bar(2), bar(4))]);
    }

    #[test]
    fn test_unknown_track() {
        let mut arrangement = Arrangement::default();
        let missing = TrackId::new();
        let result = arrangement.insert_clip(missing, clip(bar(1), bar(2)));
        assert!(matches!(result, Err(ArrangementError::TrackNotFound(id)) if id == missing));
    }

    #[test]
    fn test_move_clip_snaps_and_trims() {
        let mut arrangement = Arrangement::default();
        let track_id = arrangement.add_track("Keys", TrackKind::Midi);
        let a = clip(bar(1), bar(3));
        let b = clip(bar(5), bar(6));
        let b_id = b.id;
        arrangement.insert_clip(track_id, a).expect("insert");
        arrangement.insert_clip(track_id, b).expect("insert");

        // Dropped slightly off the beat, snaps to 2.3
        arrangement
            .move_clip(track_id, b_id, track_id, TimelinePosition::new(2, 2, 3.0))
            .expect("move");

        let track = arrangement.track(track_id).expect("track");
        let moved = track.clip(b_id).expect("moved clip");
        assert_eq!(moved.start, TimelinePosition::new(2, 3, 0.0));
        assert_eq!(moved.end, TimelinePosition::new(3, 3, 0.0));
        assert_eq!(track.clips[0].end, TimelinePosition::new(2, 3, 0.0));
        assert_no_overlap(track);
    }

    #[test]
    fn test_move_clip_between_tracks() {
        let mut arrangement = Arrangement::default();
        let from = arrangement.add_track("A", TrackKind::Midi);
        let to = arrangement.add_track("B", TrackKind::Midi);
        let c = clip(bar(1), bar(2));
        let id = c.id;
        arrangement.insert_clip(from, c).expect("insert");

        arrangement.move_clip(from, id, to, bar(4)).expect("move");

        assert!(arrangement.track(from).expect("from").clips.is_empty());
        let moved = arrangement.track(to).expect("to").clip(id).expect("clip");
        assert_eq!(moved.start, bar(4));
    }

    #[test]
    fn test_move_missing_clip() {
        let mut arrangement = Arrangement::default();
        let track_id = arrangement.add_track("A", TrackKind::Midi);
        let result = arrangement.move_clip(track_id, ClipId::new(), track_id, bar(2));
        assert!(matches!(result, Err(ArrangementError::ClipNotFound { .. })));
    }

    #[test]
    fn test_split_clip() {
        let mut arrangement = Arrangement::default();
        let track_id = arrangement.add_track("Loop", TrackKind::Audio);
        let c = clip(bar(1), bar(2)).with_loop_end(bar(4));
        let id = c.id;
        arrangement.insert_clip(track_id, c).expect("insert");

        let ids = arrangement.split_clip(track_id, id, bar(3)).expect("split");

        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], id);
        let track = arrangement.track(track_id).expect("track");
        assert_eq!(track.clips.len(), 2);
        assert_eq!(track.clips[0].loop_end, Some(bar(3)));
        assert_eq!(track.clips[1].start, bar(3));
        assert_no_overlap(track);
    }

    #[test]
    fn test_set_time_signature_preserves_margins() {
        let mut arrangement = Arrangement::default();
        let track_id = arrangement.add_track("Bass", TrackKind::Audio);
        arrangement.insert_clip(track_id, clip(bar(3), bar(4))).expect("insert");
        let before = arrangement.time_context;
        let margin = bar(3).to_margin(&before);

        arrangement.set_time_signature((3, 4));

        let after = *arrangement.time_context();
        let track = arrangement.track(track_id).expect("track");
        assert_eq!(track.clips[0].start.to_margin(&after), margin);
        assert_eq!(track.clips[0].start, TimelinePosition::new(3, 3, 0.0));
    }

    #[test]
    fn test_master_tempo_automation() {
        let mut arrangement = Arrangement::default();
        let master = arrangement.master().id;
        arrangement
            .set_automation_node(master, Envelope::Tempo, bar(1), 100.0)
            .expect("node");
        arrangement
            .set_automation_node(master, Envelope::Tempo, bar(3), 140.0)
            .expect("node");

        let value = arrangement
            .automated_value(master, Envelope::Tempo, bar(2))
            .expect("track")
            .expect("value");
        assert!((value - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_automation_on_track_without_lane() {
        let mut arrangement = Arrangement::default();
        let track_id = arrangement.add_track("A", TrackKind::Audio);
        let value = arrangement
            .automated_value(track_id, Envelope::Tempo, bar(1))
            .expect("track");
        assert_eq!(value, None);
    }

    #[test]
    fn test_set_node_on_missing_lane() {
        let mut arrangement = Arrangement::default();
        let track_id = arrangement.add_track("A", TrackKind::Audio);

        let result = arrangement.set_automation_node(track_id, Envelope::Tempo, bar(1), 120.0);
        assert!(matches!(
            result,
            Err(ArrangementError::LaneNotFound {
                track,
                envelope: Envelope::Tempo,
            }) if track == track_id
        ));
    }

    #[test]
    fn test_timeline_width() {
        let mut arrangement = Arrangement::default();
        // Four empty bars at 400 per bar
        assert_eq!(arrangement.timeline_width(), 1600.0);
        arrangement.set_pixels_per_beat(50.0);
        assert_eq!(arrangement.timeline_width(), 1200.0);
        arrangement.set_pixels_per_beat(100.0);

        let track_id = arrangement.add_track("A", TrackKind::Audio);
        arrangement
            .insert_clip(track_id, clip(bar(1), bar(2)).with_loop_end(bar(9)))
            .expect("insert");
        // Eight bars of content plus four bars of room
        assert_eq!(arrangement.timeline_width(), 4800.0);
    }

    #[test]
    fn test_remove_track() {
        let mut arrangement = Arrangement::default();
        let id = arrangement.add_track("A", TrackKind::Audio);
        assert!(arrangement.remove_track(id).is_ok());
        assert!(arrangement.remove_track(id).is_err());
    }
}
