use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::geometry::{Point, path_bend_count, path_length};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathKind {
    /// Anchor to anchor with no routed bends in between.
    Direct,
    Bent,
}

/// Which rung of the router produced a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteStrategy {
    Direct,
    /// Straight along the dominant axis, then 45° into the target.
    StraightDiagonal,
    /// 45° out of the source, then straight along the dominant axis.
    DiagonalStraight,
    VerticalFirst,
    HorizontalFirst,
    /// At least one obstacle was hugged around.
    Detour,
    /// Gave up after repeated obstructions and drew a straight segment.
    Fallback,
    /// An endpoint sat inside a lane, so routing was skipped.
    Degenerate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedLink {
    pub edge_id: String,
    pub source: String,
    pub target: String,
    pub source_slot: usize,
    pub target_slot: usize,
    /// Source anchor, first point of `points`.
    pub from: Point,
    /// Target anchor, last point of `points`.
    pub to: Point,
    pub points: Vec<Point>,
    pub base_color: String,
    pub kind: PathKind,
    pub strategy: RouteStrategy,
}

impl RoutedLink {
    pub fn length(&self) -> f32 {
        path_length(&self.points)
    }

    pub fn bends(&self) -> usize {
        path_bend_count(&self.points)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub routed: usize,
    /// Edges dropped because an endpoint could not be resolved.
    pub skipped: usize,
    pub degenerate: usize,
    pub detours: usize,
    pub fallbacks: usize,
    /// Deepest detour recursion seen on any single edge.
    pub max_depth: usize,
    pub total_bends: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingOutput {
    pub links: Vec<RoutedLink>,
    pub stats: SessionStats,
}

impl RoutingOutput {
    pub fn link(&self, edge_id: &str) -> Option<&RoutedLink> {
        self.links.iter().find(|link| link.edge_id == edge_id)
    }
}
