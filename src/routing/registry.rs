use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::RouterConfig;
use crate::ir::ObstacleSpec;

use super::geometry::{Clip, Point, Rect, clip_segment, distance};

/// Queries or insertions spanning more cells than this bypass the grid.
const INDEX_MAX_CELLS: i64 = 4096;

/// Side of a lane rectangle that a reservation grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneSide {
    Left,
    Top,
    Right,
    Bottom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleEntry {
    pub id: String,
    pub bounds: Rect,
    /// Bounds plus insets plus every reservation made so far this session.
    pub lane: Rect,
}

/// The obstacle nearest to a segment's start whose lane rectangle the segment crosses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blocker {
    pub obstacle: usize,
    pub clip_start: Point,
    pub clip_end: Point,
}

/// Uniform hash grid over lane rectangles. Buckets only ever gain members,
/// matching lanes that only ever grow.
#[derive(Debug, Clone)]
struct SpatialIndex {
    cell: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Obstacles too large to bucket; always candidates.
    oversized: Vec<usize>,
}

impl SpatialIndex {
    fn new(cell: f32) -> Self {
        Self {
            cell,
            cells: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    fn cell_range(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        (
            (rect.x0 / self.cell).floor() as i32,
            (rect.y0 / self.cell).floor() as i32,
            (rect.x1 / self.cell).floor() as i32,
            (rect.y1 / self.cell).floor() as i32,
        )
    }

    fn span(range: (i32, i32, i32, i32)) -> i64 {
        let (x0, y0, x1, y1) = range;
        (x1 as i64 - x0 as i64 + 1) * (y1 as i64 - y0 as i64 + 1)
    }

    fn insert(&mut self, idx: usize, rect: &Rect) {
        if self.oversized.contains(&idx) {
            return;
        }
        let range = self.cell_range(rect);
        if Self::span(range) > INDEX_MAX_CELLS {
            self.oversized.push(idx);
            self.oversized.sort_unstable();
            return;
        }
        let (x0, y0, x1, y1) = range;
        for iy in y0..=y1 {
            for ix in x0..=x1 {
                let bucket = self.cells.entry((ix, iy)).or_default();
                if !bucket.contains(&idx) {
                    bucket.push(idx);
                }
            }
        }
    }

    /// Sorted candidate indices for `rect`, or `None` when a full scan is cheaper.
    fn query(&self, rect: &Rect) -> Option<Vec<usize>> {
        let range = self.cell_range(rect);
        if Self::span(range) > INDEX_MAX_CELLS {
            return None;
        }
        let (x0, y0, x1, y1) = range;
        let mut out = self.oversized.clone();
        for iy in y0..=y1 {
            for ix in x0..=x1 {
                if let Some(bucket) = self.cells.get(&(ix, iy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        Some(out)
    }
}

/// Obstacles of one routing session, in a stable iteration order.
#[derive(Debug, Clone)]
pub struct ObstacleRegistry {
    entries: Vec<ObstacleEntry>,
    by_id: HashMap<String, usize>,
    index: Option<SpatialIndex>,
}

impl ObstacleRegistry {
    pub fn build(obstacles: &[ObstacleSpec], config: &RouterConfig) -> Self {
        let insets = config.lane_insets;
        let inset = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let mut index = (config.grid_cell.is_finite() && config.grid_cell > 0.0)
            .then(|| SpatialIndex::new(config.grid_cell));

        let mut entries = Vec::with_capacity(obstacles.len());
        let mut by_id = HashMap::with_capacity(obstacles.len());
        for spec in obstacles {
            let bounds = Rect::from_xywh(spec.x, spec.y, spec.width, spec.height);
            if !bounds.is_finite() {
                warn!(obstacle = %spec.id, "skipping obstacle with non-finite bounds");
                continue;
            }
            if by_id.contains_key(&spec.id) {
                warn!(obstacle = %spec.id, "skipping duplicate obstacle id");
                continue;
            }
            let lane = bounds.outset(
                inset(insets.left),
                inset(insets.top),
                inset(insets.right),
                inset(insets.bottom),
            );
            let idx = entries.len();
            if let Some(index) = index.as_mut() {
                index.insert(idx, &lane);
            }
            by_id.insert(spec.id.clone(), idx);
            entries.push(ObstacleEntry {
                id: spec.id.clone(),
                bounds,
                lane,
            });
        }

        Self {
            entries,
            by_id,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ObstacleEntry] {
        &self.entries
    }

    pub fn get(&self, idx: usize) -> Option<&ObstacleEntry> {
        self.entries.get(idx)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub(crate) fn lane(&self, idx: usize) -> Rect {
        self.entries[idx].lane
    }

    /// Index of the first obstacle whose lane rectangle contains `point`.
    pub fn point_inside_any(&self, point: Point) -> Option<usize> {
        let spot = Rect::new(point.0, point.1, point.0, point.1);
        self.candidates(&spot)
            .into_iter()
            .find(|&idx| self.entries[idx].lane.contains(point))
    }

    /// Nearest lane rectangle crossed by `a → b`, measured from `a` to where the
    /// segment enters it. Ties go to the earlier registry entry.
    pub fn first_blocking(&self, a: Point, b: Point) -> Option<Blocker> {
        let mut best: Option<(f32, Blocker)> = None;
        for idx in self.candidates(&Rect::new(a.0, a.1, b.0, b.1)) {
            let Clip::Inside { start, end } = clip_segment(a, b, &self.entries[idx].lane) else {
                continue;
            };
            let entry_distance = distance(a, start);
            if best.is_none_or(|(closest, _)| entry_distance < closest) {
                best = Some((
                    entry_distance,
                    Blocker {
                        obstacle: idx,
                        clip_start: start,
                        clip_end: end,
                    },
                ));
            }
        }
        best.map(|(_, blocker)| blocker)
    }

    /// Grow one side of an obstacle's lane rectangle. Lanes never shrink.
    pub fn expand_lane(&mut self, idx: usize, side: LaneSide, amount: f32) {
        if !(amount.is_finite() && amount > 0.0) {
            return;
        }
        let Some(entry) = self.entries.get_mut(idx) else {
            return;
        };
        match side {
            LaneSide::Left => entry.lane.x0 -= amount,
            LaneSide::Top => entry.lane.y0 -= amount,
            LaneSide::Right => entry.lane.x1 += amount,
            LaneSide::Bottom => entry.lane.y1 += amount,
        }
        let lane = entry.lane;
        if let Some(index) = self.index.as_mut() {
            index.insert(idx, &lane);
        }
    }

    fn candidates(&self, area: &Rect) -> Vec<usize> {
        match self.index.as_ref().and_then(|index| index.query(area)) {
            Some(found) => found,
            None => (0..self.entries.len()).collect(),
        }
    }
}
