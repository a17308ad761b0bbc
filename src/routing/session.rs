use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::Config;
use crate::ir::{AnchorProvider, Diagram, EdgeSpec, ObstacleSpec, PortSide, SlotAnchors};

use super::detour::{DetourEngine, DetourRoute};
use super::geometry::{Point, compress_path, path_bend_count};
use super::registry::{LaneSide, ObstacleRegistry};
use super::types::{PathKind, RouteStrategy, RoutedLink, RoutingOutput, SessionStats};

const AXIS_EPSILON: f32 = 1e-3;

/// Where one end of a link attaches and where routing starts from it.
#[derive(Debug, Clone, Copy)]
struct Endpoint {
    anchor: Point,
    /// `anchor` pushed out past the obstacle's lane, staggered per slot.
    routed: Point,
    obstacle: Option<usize>,
}

/// One routing pass over a diagram snapshot. Lane reservations made by each
/// routed edge are visible to every later edge of the same session.
pub struct RoutingSession<'c, A> {
    config: &'c Config,
    anchors: A,
    registry: ObstacleRegistry,
    slot_usage: HashMap<(usize, usize, PortSide), usize>,
    stats: SessionStats,
    started: Instant,
}

impl<'c, A: AnchorProvider> RoutingSession<'c, A> {
    pub fn new(config: &'c Config, obstacles: &[ObstacleSpec], anchors: A) -> Self {
        Self {
            config,
            anchors,
            registry: ObstacleRegistry::build(obstacles, &config.router),
            slot_usage: HashMap::new(),
            stats: SessionStats::default(),
            started: Instant::now(),
        }
    }

    pub fn registry(&self) -> &ObstacleRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Route one edge against the current lanes, then reserve the lanes it used.
    /// Returns `None` when either endpoint cannot be placed.
    pub fn route_edge(&mut self, edge: &EdgeSpec) -> Option<RoutedLink> {
        let source = self.resolve(&edge.source, edge.source_slot, PortSide::Output, edge.source_point);
        let target = self.resolve(&edge.target, edge.target_slot, PortSide::Input, edge.target_point);
        let (Some(source), Some(target)) = (source, target) else {
            warn!(
                edge = %edge.id,
                source = %edge.source,
                target = %edge.target,
                "skipping link with an unresolved endpoint"
            );
            self.stats.skipped += 1;
            return None;
        };

        let start = source.routed;
        let end = target.routed;
        let inside = self
            .registry
            .point_inside_any(start)
            .or_else(|| self.registry.point_inside_any(end));
        let route = match inside {
            Some(idx) => {
                debug!(
                    edge = %edge.id,
                    obstacle = %self.registry.entries()[idx].id,
                    "endpoint inside a lane, linking straight"
                );
                DetourRoute {
                    points: vec![start, end],
                    strategy: RouteStrategy::Degenerate,
                    detours: 0,
                    depth: 0,
                    fallback: false,
                    reservations: Vec::new(),
                }
            }
            None => DetourEngine::new(&self.registry, &self.config.router).route(start, end),
        };

        for reservation in &route.reservations {
            self.registry
                .expand_lane(reservation.obstacle, reservation.side, reservation.amount);
        }
        if self.config.router.reserve_anchor_lanes && route.strategy != RouteStrategy::Degenerate {
            self.reserve_anchor_lanes(&source, &target, &route.points);
        }
        if let Some(idx) = source.obstacle {
            *self.slot_usage.entry((idx, edge.source_slot, PortSide::Output)).or_default() += 1;
        }
        if let Some(idx) = target.obstacle {
            *self.slot_usage.entry((idx, edge.target_slot, PortSide::Input)).or_default() += 1;
        }

        let mut raw = Vec::with_capacity(route.points.len() + 2);
        raw.push(source.anchor);
        raw.extend_from_slice(&route.points);
        raw.push(target.anchor);
        let points = compress_path(&raw);
        let kind = if route.points.len() <= 2 {
            PathKind::Direct
        } else {
            PathKind::Bent
        };

        self.stats.routed += 1;
        self.stats.detours += route.detours;
        self.stats.max_depth = self.stats.max_depth.max(route.depth);
        self.stats.total_bends += path_bend_count(&points);
        match route.strategy {
            RouteStrategy::Degenerate => self.stats.degenerate += 1,
            RouteStrategy::Fallback => self.stats.fallbacks += 1,
            _ => {}
        }

        Some(RoutedLink {
            edge_id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            source_slot: edge.source_slot,
            target_slot: edge.target_slot,
            from: source.anchor,
            to: target.anchor,
            points,
            base_color: self.config.theme.base_color(edge),
            kind,
            strategy: route.strategy,
        })
    }

    /// Route every edge in order and finish the session.
    pub fn run(mut self, edges: &[EdgeSpec]) -> RoutingOutput {
        let mut links = Vec::with_capacity(edges.len());
        for edge in edges {
            if let Some(link) = self.route_edge(edge) {
                links.push(link);
            }
        }
        self.stats.elapsed = self.started.elapsed();
        debug!(
            routed = self.stats.routed,
            skipped = self.stats.skipped,
            detours = self.stats.detours,
            fallbacks = self.stats.fallbacks,
            elapsed_us = self.stats.elapsed.as_micros() as u64,
            "routing session finished"
        );
        RoutingOutput {
            links,
            stats: self.stats,
        }
    }

    fn resolve(&self, id: &str, slot: usize, side: PortSide, fallback: Option<Point>) -> Option<Endpoint> {
        let anchor = self.anchors.anchor(id, slot, side).or(fallback)?;
        if !(anchor.0.is_finite() && anchor.1.is_finite()) {
            return None;
        }
        let Some(idx) = self.registry.index_of(id) else {
            return Some(Endpoint {
                anchor,
                routed: anchor,
                obstacle: None,
            });
        };
        let lane = self.registry.lane(idx);
        let used = self.slot_usage.get(&(idx, slot, side)).copied().unwrap_or(0);
        let offset = self.config.router.clearance() + used as f32 * self.config.router.lane_step();
        let routed = match side {
            PortSide::Output => (lane.x1 + offset, anchor.1),
            PortSide::Input => (lane.x0 - offset, anchor.1),
        };
        Some(Endpoint {
            anchor,
            routed,
            obstacle: Some(idx),
        })
    }

    /// A route leaving (or entering) vertically runs along the obstacle's own
    /// lane edge, so that edge is reserved for the next link.
    fn reserve_anchor_lanes(&mut self, source: &Endpoint, target: &Endpoint, points: &[Point]) {
        let step = self.config.router.lane_step();
        if let (Some(idx), [first, second, ..]) = (source.obstacle, points)
            && is_vertical(*first, *second)
        {
            self.registry.expand_lane(idx, LaneSide::Right, step);
        }
        if let (Some(idx), [.., before_last, last]) = (target.obstacle, points)
            && is_vertical(*before_last, *last)
        {
            self.registry.expand_lane(idx, LaneSide::Left, step);
        }
    }
}

fn is_vertical(a: Point, b: Point) -> bool {
    (a.0 - b.0).abs() <= AXIS_EPSILON && (a.1 - b.1).abs() > AXIS_EPSILON
}

/// Route `edges` in order over `obstacles` in a fresh session.
pub fn route_links<A: AnchorProvider>(
    obstacles: &[ObstacleSpec],
    edges: &[EdgeSpec],
    config: &Config,
    anchors: A,
) -> RoutingOutput {
    RoutingSession::new(config, obstacles, anchors).run(edges)
}

/// Route a diagram snapshot using evenly stacked slot anchors.
pub fn route_diagram(diagram: &Diagram, config: &Config) -> RoutingOutput {
    let anchors = SlotAnchors::new(&diagram.obstacles, &config.router.anchors);
    route_links(&diagram.obstacles, &diagram.edges, config, anchors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_boxes() -> Vec<ObstacleSpec> {
        vec![
            ObstacleSpec::new("A", 0.0, 0.0, 100.0, 40.0),
            ObstacleSpec::new("B", 150.0, 0.0, 100.0, 40.0),
            ObstacleSpec::new("C", 120.0, 10.0, 20.0, 20.0),
        ]
    }

    fn mid_anchors(id: &str, _slot: usize, side: PortSide) -> Option<Point> {
        match (id, side) {
            ("A", PortSide::Output) => Some((100.0, 20.0)),
            ("B", PortSide::Input) => Some((150.0, 20.0)),
            _ => None,
        }
    }

    #[test]
    fn routed_start_clears_source_lane() {
        let config = Config::default();
        let obstacles = three_boxes();
        let session = RoutingSession::new(&config, &obstacles, mid_anchors);
        let source = session.resolve("A", 0, PortSide::Output, None).unwrap();
        let target = session.resolve("B", 0, PortSide::Input, None).unwrap();
        assert_eq!(source.anchor, (100.0, 20.0));
        assert_eq!(source.routed, (104.0, 20.0));
        assert_eq!(target.routed, (144.0, 20.0));
    }

    #[test]
    fn reservations_commit_after_emit() {
        let config = Config::default();
        let obstacles = three_boxes();
        let mut session = RoutingSession::new(&config, &obstacles, mid_anchors);
        let before = session.registry().lane(2);
        let link = session.route_edge(&EdgeSpec::new("l1", "A", 0, "B", 0)).unwrap();
        assert_eq!(link.strategy, RouteStrategy::Detour);
        let after = session.registry().lane(2);
        assert_eq!(after.x0, before.x0 - 5.0);
        assert_eq!(after.y0, before.y0 - 5.0);
        assert_eq!(session.stats().detours, 1);
    }

    #[test]
    fn repeated_slot_staggers_routed_start() {
        let config = Config::default();
        let obstacles = vec![ObstacleSpec::new("A", 0.0, 0.0, 100.0, 40.0)];
        let mut session = RoutingSession::new(&config, &obstacles, mid_anchors);
        let mut edge = EdgeSpec::new("l1", "A", 0, "free", 0);
        edge.target_point = Some((300.0, 200.0));
        session.route_edge(&edge).unwrap();
        let again = session.resolve("A", 0, PortSide::Output, None).unwrap();
        assert_eq!(again.routed.0, 103.0 + 1.0 + 5.0);
    }

    #[test]
    fn endpoint_inside_a_lane_links_straight() {
        let config = Config::default();
        let obstacles = vec![
            ObstacleSpec::new("A", 0.0, 0.0, 100.0, 40.0),
            ObstacleSpec::new("cover", 102.0, 0.0, 20.0, 40.0),
        ];
        let mut session = RoutingSession::new(&config, &obstacles, mid_anchors);
        let mut edge = EdgeSpec::new("l1", "A", 0, "free", 0);
        edge.target_point = Some((300.0, 20.0));
        let link = session.route_edge(&edge).unwrap();
        assert_eq!(link.strategy, RouteStrategy::Degenerate);
        assert_eq!(link.kind, PathKind::Direct);
        assert_eq!(link.points, vec![(100.0, 20.0), (300.0, 20.0)]);
        assert_eq!(session.stats().degenerate, 1);
    }

    #[test]
    fn unresolved_endpoint_is_skipped() {
        let config = Config::default();
        let obstacles = three_boxes();
        let output = route_links(
            &obstacles,
            &[EdgeSpec::new("l1", "A", 0, "gone", 0)],
            &config,
            mid_anchors,
        );
        assert!(output.links.is_empty());
        assert_eq!(output.stats.skipped, 1);
    }

    #[test]
    fn vertical_departure_reserves_source_lane() {
        let config = Config::default();
        let obstacles = vec![ObstacleSpec::new("A", 0.0, 0.0, 100.0, 40.0)];
        let anchors = |id: &str, _slot: usize, side: PortSide| -> Option<Point> {
            match (id, side) {
                ("A", PortSide::Output) => Some((100.0, 20.0)),
                _ => None,
            }
        };
        let mut session = RoutingSession::new(&config, &obstacles, anchors);
        let before = session.registry().lane(0);
        let mut edge = EdgeSpec::new("l1", "A", 0, "free", 0);
        edge.target_point = Some((104.0, 300.0));
        let link = session.route_edge(&edge).unwrap();
        assert_eq!(link.points, vec![(100.0, 20.0), (104.0, 20.0), (104.0, 300.0)]);
        assert_eq!(session.registry().lane(0).x1, before.x1 + 5.0);
    }
}
