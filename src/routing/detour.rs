use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::config::RouterConfig;

use super::RouteStrategy;
use super::geometry::{Point, compress_path};
use super::ladder::{LadderOutcome, PathLadder};
use super::registry::{Blocker, LaneSide, ObstacleRegistry};

/// How many times each obstacle has forced a detour on the current branch.
/// Copied, never shared, as the recursion descends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObstructionCounter {
    counts: BTreeMap<usize, usize>,
}

impl ObstructionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, obstacle: usize) -> usize {
        self.counts.get(&obstacle).copied().unwrap_or(0)
    }

    pub fn bumped(&self, obstacle: usize) -> Self {
        let mut next = self.clone();
        let slot = next.counts.entry(obstacle).or_insert(0);
        *slot += 1;
        next
    }
}

/// Lane growth requested by a detour. Applied by the session once the
/// edge is emitted, so sibling branches of one route see the same lanes.
/// The edge's own recursion always routes against the lanes as they were
/// when it started; only later edges see the growth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneReservation {
    pub obstacle: usize,
    pub side: LaneSide,
    pub amount: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetourRoute {
    pub points: Vec<Point>,
    pub strategy: RouteStrategy,
    pub detours: usize,
    /// Deepest recursion reached; `0` when the ladder succeeded outright.
    pub depth: usize,
    pub fallback: bool,
    pub reservations: Vec<LaneReservation>,
}

#[derive(Debug, Default)]
struct RouteTrace {
    first_strategy: Option<RouteStrategy>,
    detours: usize,
    depth: usize,
    fallback: bool,
    reservations: Vec<LaneReservation>,
}

/// One hug around a blocker: walk to the lane edge facing the segment,
/// then along that edge to the corner nearer the target.
#[derive(Debug, Clone, Copy)]
struct Hug {
    obstacle: usize,
    approach: Point,
    corner: Point,
    reservations: [LaneReservation; 2],
}

/// Recursive obstacle-avoiding router between two free points.
pub struct DetourEngine<'a> {
    registry: &'a ObstacleRegistry,
    ladder: PathLadder<'a>,
    lane_step: f32,
    clearance: f32,
    max_obstructions: usize,
}

impl<'a> DetourEngine<'a> {
    pub fn new(registry: &'a ObstacleRegistry, config: &RouterConfig) -> Self {
        Self {
            registry,
            ladder: PathLadder::new(registry, config),
            lane_step: config.lane_step(),
            clearance: config.clearance(),
            max_obstructions: usize::from(config.obstruction_limit()),
        }
    }

    pub fn route(&self, start: Point, end: Point) -> DetourRoute {
        let mut trace = RouteTrace::default();
        let raw = self.route_from(start, end, ObstructionCounter::new(), 0, &mut trace);
        let strategy = if trace.fallback {
            RouteStrategy::Fallback
        } else if trace.detours > 0 {
            RouteStrategy::Detour
        } else {
            trace.first_strategy.unwrap_or(RouteStrategy::Direct)
        };
        DetourRoute {
            points: compress_path(&raw),
            strategy,
            detours: trace.detours,
            depth: trace.depth,
            fallback: trace.fallback,
            reservations: trace.reservations,
        }
    }

    fn route_from(
        &self,
        start: Point,
        end: Point,
        counter: ObstructionCounter,
        depth: usize,
        trace: &mut RouteTrace,
    ) -> Vec<Point> {
        trace.depth = trace.depth.max(depth);
        let (horizontal, vertical) = match self.ladder.try_route(start, end) {
            LadderOutcome::Routed { points, strategy } => {
                if depth == 0 {
                    trace.first_strategy = Some(strategy);
                }
                trace!(depth, ?strategy, "ladder routed");
                return points;
            }
            LadderOutcome::Blocked {
                horizontal,
                vertical,
            } => (horizontal, vertical),
        };

        let dx = end.0 - start.0;
        let dy = end.1 - start.1;
        let hug = if dx.abs() > dy.abs() {
            self.hug_horizontal(start, end, horizontal)
        } else {
            self.hug_vertical(start, end, vertical)
        };
        trace.reservations.extend(hug.reservations);
        trace.detours += 1;

        let counter = counter.bumped(hug.obstacle);
        if counter.count(hug.obstacle) > self.max_obstructions {
            let id = self
                .registry
                .get(hug.obstacle)
                .map(|entry| entry.id.as_str())
                .unwrap_or_default();
            warn!(
                obstacle = id,
                depth,
                "obstacle blocked the route too many times, drawing a straight segment"
            );
            trace.fallback = true;
            return vec![start, end];
        }

        trace!(depth, obstacle = hug.obstacle, corner = ?hug.corner, "detour");
        let rest = self.route_from(hug.corner, end, counter, depth + 1, trace);
        let mut points = vec![start, hug.approach, hug.corner];
        points.extend(rest.into_iter().skip(1));
        points
    }

    /// Horizontal travel blocked: stop in front of the lane, then pass over or under it.
    fn hug_horizontal(&self, start: Point, end: Point, blocker: Blocker) -> Hug {
        let lane = self.registry.lane(blocker.obstacle);
        let c = self.clearance;
        let (x, facing) = if end.0 - start.0 <= 0.0 {
            (lane.x1 + c, LaneSide::Right)
        } else {
            (lane.x0 - c, LaneSide::Left)
        };
        let approach = (x, start.1);

        let via_top = (end.1 - lane.y0).abs() + (lane.y0 - start.1).abs();
        let via_bottom = (end.1 - lane.y1).abs() + (lane.y1 - start.1).abs();
        let top = ((x, lane.y0 - c), LaneSide::Top);
        let bottom = ((x, lane.y1 + c), LaneSide::Bottom);
        let (preferred, other) = if via_top <= via_bottom {
            (top, bottom)
        } else {
            (bottom, top)
        };
        let (corner, hugged) = self.pick_corner(start, approach, preferred, other);
        self.hug(blocker.obstacle, approach, corner, facing, hugged)
    }

    /// Vertical travel blocked: stop above or below the lane, then pass beside it.
    fn hug_vertical(&self, start: Point, end: Point, blocker: Blocker) -> Hug {
        let lane = self.registry.lane(blocker.obstacle);
        let c = self.clearance;
        let (y, facing) = if end.1 - start.1 <= 0.0 {
            (lane.y1 + c, LaneSide::Bottom)
        } else {
            (lane.y0 - c, LaneSide::Top)
        };
        let approach = (start.0, y);

        let via_left = (end.0 - lane.x0).abs() + (lane.x0 - start.0).abs();
        let via_right = (end.0 - lane.x1).abs() + (lane.x1 - start.0).abs();
        let left = ((lane.x0 - c, y), LaneSide::Left);
        let right = ((lane.x1 + c, y), LaneSide::Right);
        let (preferred, other) = if via_left <= via_right {
            (left, right)
        } else {
            (right, left)
        };
        let (corner, hugged) = self.pick_corner(start, approach, preferred, other);
        self.hug(blocker.obstacle, approach, corner, facing, hugged)
    }

    /// Shorter side first; the other side when the short one is blocked.
    fn pick_corner(
        &self,
        start: Point,
        approach: Point,
        preferred: (Point, LaneSide),
        other: (Point, LaneSide),
    ) -> (Point, LaneSide) {
        if self
            .ladder
            .test_path(&[start, approach, preferred.0])
            .is_none()
        {
            preferred
        } else {
            other
        }
    }

    fn hug(
        &self,
        obstacle: usize,
        approach: Point,
        corner: Point,
        facing: LaneSide,
        hugged: LaneSide,
    ) -> Hug {
        let reserve = |side| LaneReservation {
            obstacle,
            side,
            amount: self.lane_step,
        };
        Hug {
            obstacle,
            approach,
            corner,
            reservations: [reserve(facing), reserve(hugged)],
        }
    }
}
