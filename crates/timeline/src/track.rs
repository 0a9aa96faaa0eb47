use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::automation::{AutomationLane, Envelope};
use crate::clip::{Clip, ClipId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Midi,
    Master,
}

/// An entry of a track's effect chain. Carried through edits untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: Uuid,
    pub name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub kind: TrackKind,
    /// Hex color, e.g. `#4f9dde`
    pub color: String,
    /// Clips of a non-master track never overlap once an edit is committed.
    pub clips: Vec<Clip>,
    pub automation_lanes: Vec<AutomationLane>,
    pub mute: bool,
    pub solo: bool,
    pub armed: bool,
    /// Fader level in dB
    pub volume: f64,
    /// -100 (left) to 100 (right)
    pub pan: f64,
    pub fx: Vec<Effect>,
}

impl Track {
    pub fn new(name: impl Into<String>, kind: TrackKind, color: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            kind,
            color: color.into(),
            clips: Vec::new(),
            automation_lanes: Vec::new(),
            mute: false,
            solo: false,
            armed: false,
            volume: 0.0,
            pan: 0.0,
            fx: Vec::new(),
        }
    }

    pub fn is_master(&self) -> bool {
        self.kind == TrackKind::Master
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn lane(&self, envelope: Envelope) -> Option<&AutomationLane> {
        self.automation_lanes.iter().find(|l| l.envelope == envelope)
    }
}
