use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::position::TimelinePosition;
use crate::time::TimeSignature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub Uuid);

impl ClipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Source material of an audio clip.
///
/// `start`/`end` place the recorded buffer on the timeline. They move with
/// the clip but stay put when the clip is trimmed, so a fragment always
/// knows which part of the buffer it plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSource {
    pub source: String,
    pub start: TimelinePosition,
    pub end: TimelinePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipKind {
    Audio(AudioSource),
    Midi,
}

/// A region on a track.
///
/// The clip plays from `start` to `end`. When `loop_end` is set the content
/// repeats past `end` until `loop_end`; the span `end..loop_end` is the loop
/// tail. `start_limit`/`end_limit` bound how far the clip may be resized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: ClipId,
    pub name: String,
    pub start: TimelinePosition,
    pub end: TimelinePosition,
    #[serde(default)]
    pub loop_end: Option<TimelinePosition>,
    #[serde(default)]
    pub start_limit: Option<TimelinePosition>,
    #[serde(default)]
    pub end_limit: Option<TimelinePosition>,
    #[serde(default)]
    pub muted: bool,
    pub kind: ClipKind,
}

impl Clip {
    pub fn midi(name: impl Into<String>, start: TimelinePosition, end: TimelinePosition) -> Self {
        Self {
            id: ClipId::new(),
            name: name.into(),
            start,
            end,
            loop_end: None,
            start_limit: None,
            end_limit: None,
            muted: false,
            kind: ClipKind::Midi,
        }
    }

    /// An audio clip covering its whole source buffer.
    pub fn audio(name: impl Into<String>, audio: AudioSource) -> Self {
        Self {
            id: ClipId::new(),
            name: name.into(),
            start: audio.start,
            end: audio.end,
            loop_end: None,
            start_limit: None,
            end_limit: None,
            muted: false,
            kind: ClipKind::Audio(audio),
        }
    }

    pub fn with_loop_end(mut self, loop_end: TimelinePosition) -> Self {
        self.loop_end = Some(loop_end);
        self
    }

    pub fn with_limits(
        mut self,
        start_limit: Option<TimelinePosition>,
        end_limit: Option<TimelinePosition>,
    ) -> Self {
        self.start_limit = start_limit;
        self.end_limit = end_limit;
        self
    }

    /// Where the clip stops sounding: the loop end when looped, else `end`.
    pub fn effective_end(&self) -> TimelinePosition {
        self.loop_end.unwrap_or(self.end)
    }

    pub fn is_looped(&self) -> bool {
        self.loop_end.is_some()
    }

    pub fn audio_source(&self) -> Option<&AudioSource> {
        match &self.kind {
            ClipKind::Audio(audio) => Some(audio),
            ClipKind::Midi => None,
        }
    }

    /// Apply `f` to every position the clip carries, optional ones included
    /// only when present.
    pub fn map_positions(&self, mut f: impl FnMut(TimelinePosition) -> TimelinePosition) -> Self {
        let kind = match &self.kind {
            ClipKind::Audio(audio) => ClipKind::Audio(AudioSource {
                source: audio.source.clone(),
                start: f(audio.start),
                end: f(audio.end),
            }),
            ClipKind::Midi => ClipKind::Midi,
        };

        Self {
            id: self.id,
            name: self.name.clone(),
            start: f(self.start),
            end: f(self.end),
            loop_end: self.loop_end.map(&mut f),
            start_limit: self.start_limit.map(&mut f),
            end_limit: self.end_limit.map(&mut f),
            muted: self.muted,
            kind,
        }
    }

    /// The same clip with every position normalized under `ts`.
    pub fn normalized(&self, ts: &TimeSignature) -> Self {
        self.map_positions(|pos| pos.normalized(ts))
    }

    /// Check the geometry invariants callers must uphold before handing a
    /// clip to the editing functions. Compiled out of release builds.
    pub fn debug_assert_well_formed(&self) {
        debug_assert!(self.start < self.end, "clip {} starts at or after its end", self.id);
        if let Some(loop_end) = self.loop_end {
            debug_assert!(loop_end > self.end, "clip {} loop end is not past its end", self.id);
        }
        if let Some(start_limit) = self.start_limit {
            debug_assert!(
                start_limit <= self.start,
                "clip {} starts before its start limit",
                self.id
            );
        }
        if let Some(end_limit) = self.end_limit {
            debug_assert!(
                end_limit >= self.effective_end(),
                "clip {} extends past its end limit",
                self.id
            );
        }
    }
}
