use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::position::TimelinePosition;

pub const VOLUME_MIN_DB: f64 = f64::NEG_INFINITY;
pub const VOLUME_MAX_DB: f64 = 6.0;
pub const PAN_MIN: f64 = -100.0;
pub const PAN_MAX: f64 = 100.0;
pub const TEMPO_MIN_BPM: f64 = 20.0;
pub const TEMPO_MAX_BPM: f64 = 320.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaneId(pub Uuid);

impl LaneId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LaneId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// What an automation lane controls. Decides the value curve used when
/// interpolating between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    Volume,
    Pan,
    Tempo,
    Send,
    Effect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationNode {
    pub id: NodeId,
    pub pos: TimelinePosition,
    pub value: f64,
}

impl AutomationNode {
    pub fn new(pos: TimelinePosition, value: f64) -> Self {
        Self {
            id: NodeId::new(),
            pos,
            value,
        }
    }
}

/// A control-point lane. Nodes are kept in insertion order; readers sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationLane {
    pub id: LaneId,
    pub envelope: Envelope,
    pub label: String,
    // -inf dB serializes as null in JSON
    #[serde(deserialize_with = "unbounded_below")]
    pub min_value: f64,
    pub max_value: f64,
    pub nodes: Vec<AutomationNode>,
    pub enabled: bool,
    pub show: bool,
    pub expanded: bool,
}

impl AutomationLane {
    pub fn new(
        envelope: Envelope,
        label: impl Into<String>,
        min_value: f64,
        max_value: f64,
    ) -> Self {
        Self {
            id: LaneId::new(),
            envelope,
            label: label.into(),
            min_value,
            max_value,
            nodes: Vec::new(),
            enabled: true,
            show: false,
            expanded: false,
        }
    }

    pub fn volume() -> Self {
        Self::new(Envelope::Volume, "Volume", VOLUME_MIN_DB, VOLUME_MAX_DB)
    }

    pub fn pan() -> Self {
        Self::new(Envelope::Pan, "Pan", PAN_MIN, PAN_MAX)
    }

    pub fn tempo() -> Self {
        Self::new(Envelope::Tempo, "Tempo", TEMPO_MIN_BPM, TEMPO_MAX_BPM)
    }

    pub fn with_node(mut self, pos: TimelinePosition, value: f64) -> Self {
        self.add_node(pos, value);
        self
    }

    /// Append a node, clamping its value into the lane's range.
    pub fn add_node(&mut self, pos: TimelinePosition, value: f64) -> NodeId {
        let node = AutomationNode::new(pos, value.clamp(self.min_value, self.max_value));
        let id = node.id;
        self.nodes.push(node);
        id
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<AutomationNode> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        Some(self.nodes.remove(index))
    }

    /// Nodes ordered by position. Ties keep insertion order.
    pub fn sorted_nodes(&self) -> Vec<&AutomationNode> {
        let mut nodes: Vec<&AutomationNode> = self.nodes.iter().collect();
        nodes.sort_by(|a, b| a.pos.cmp(&b.pos));
        nodes
    }
}

fn unbounded_below<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
}
