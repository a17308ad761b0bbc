use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::AnchorConfig;
use crate::routing::Point;

/// Which side of an obstacle a link attaches to. Outputs leave from the right
/// edge, inputs arrive on the left edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PortSide {
    Output,
    Input,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleSpec {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ObstacleSpec {
    pub fn new(id: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    pub id: String,
    pub source: String,
    #[serde(default)]
    pub source_slot: usize,
    pub target: String,
    #[serde(default)]
    pub target_slot: usize,
    /// Explicit link colour, wins over every theme token.
    #[serde(default)]
    pub color: Option<String>,
    /// Colour declared on the source output slot.
    #[serde(default)]
    pub slot_color: Option<String>,
    /// Data type carried by the source slot, looked up in the theme.
    #[serde(default)]
    pub slot_type: Option<String>,
    /// Last known source anchor, used when the anchor provider cannot resolve it.
    #[serde(default)]
    pub source_point: Option<Point>,
    /// Last known target anchor, used when the anchor provider cannot resolve it.
    #[serde(default)]
    pub target_point: Option<Point>,
}

impl EdgeSpec {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        source_slot: usize,
        target: impl Into<String>,
        target_slot: usize,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_slot,
            target: target.into(),
            target_slot,
            color: None,
            slot_color: None,
            slot_type: None,
            source_point: None,
            target_point: None,
        }
    }
}

/// Snapshot of a diagram as handed over by the host graph model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    #[serde(default)]
    pub obstacles: Vec<ObstacleSpec>,
    /// Edges in the order they must be routed.
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

impl Diagram {
    pub fn from_json(input: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Resolves the point where a link attaches to an obstacle slot.
pub trait AnchorProvider {
    fn anchor(&self, obstacle_id: &str, slot: usize, side: PortSide) -> Option<Point>;
}

impl<F> AnchorProvider for F
where
    F: Fn(&str, usize, PortSide) -> Option<Point>,
{
    fn anchor(&self, obstacle_id: &str, slot: usize, side: PortSide) -> Option<Point> {
        self(obstacle_id, slot, side)
    }
}

/// Evenly stacked slots along the left (inputs) and right (outputs) edges of
/// each obstacle in a snapshot.
#[derive(Debug, Clone)]
pub struct SlotAnchors {
    frames: HashMap<String, (f32, f32, f32, f32)>,
    slot_origin: f32,
    slot_height: f32,
}

impl SlotAnchors {
    pub fn new(obstacles: &[ObstacleSpec], config: &AnchorConfig) -> Self {
        let mut frames = HashMap::with_capacity(obstacles.len());
        for obstacle in obstacles {
            frames
                .entry(obstacle.id.clone())
                .or_insert((obstacle.x, obstacle.y, obstacle.width, obstacle.height));
        }
        Self {
            frames,
            slot_origin: config.slot_origin,
            slot_height: config.slot_height,
        }
    }
}

impl AnchorProvider for SlotAnchors {
    fn anchor(&self, obstacle_id: &str, slot: usize, side: PortSide) -> Option<Point> {
        let &(x, y, width, _) = self.frames.get(obstacle_id)?;
        let slot_y = y + self.slot_origin + slot as f32 * self.slot_height;
        match side {
            PortSide::Output => Some((x + width, slot_y)),
            PortSide::Input => Some((x, slot_y)),
        }
    }
}

/// Group edges by a caller-supplied node visiting order: source node first,
/// then output slot, then the edges' original relative order. Edges whose
/// source is not in `node_order` keep their relative order at the end.
pub fn order_edges_by_source(edges: &[EdgeSpec], node_order: &[String]) -> Vec<EdgeSpec> {
    let mut rank: HashMap<&str, usize> = HashMap::with_capacity(node_order.len());
    for (idx, id) in node_order.iter().enumerate() {
        rank.entry(id.as_str()).or_insert(idx);
    }
    let mut keyed: Vec<(usize, usize, usize, &EdgeSpec)> = edges
        .iter()
        .enumerate()
        .map(|(idx, edge)| {
            let node_rank = rank.get(edge.source.as_str()).copied().unwrap_or(usize::MAX);
            (node_rank, edge.source_slot, idx, edge)
        })
        .collect();
    keyed.sort_by_key(|(node_rank, slot, idx, _)| (*node_rank, *slot, *idx));
    keyed.into_iter().map(|(_, _, _, edge)| edge.clone()).collect()
}
