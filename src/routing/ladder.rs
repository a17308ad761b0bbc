use tracing::trace;

use crate::config::RouterConfig;

use super::RouteStrategy;
use super::geometry::{Point, distance, same_point};
use super::registry::{Blocker, ObstacleRegistry};

/// Result of trying the cheap candidates between two points.
#[derive(Debug, Clone, PartialEq)]
pub enum LadderOutcome {
    Routed {
        points: Vec<Point>,
        strategy: RouteStrategy,
    },
    /// Every candidate was blocked. Carries the nearest blocker of each
    /// orthogonal L so the detour engine can pick one by dominant axis.
    Blocked {
        horizontal: Blocker,
        vertical: Blocker,
    },
}

/// Fixed-order candidate paths: direct, the two 45° variants for the
/// dominant axis, then the two orthogonal Ls.
#[derive(Debug, Clone, Copy)]
pub struct PathLadder<'a> {
    registry: &'a ObstacleRegistry,
    max_direct_distance: Option<f32>,
}

impl<'a> PathLadder<'a> {
    pub fn new(registry: &'a ObstacleRegistry, config: &RouterConfig) -> Self {
        Self {
            registry,
            max_direct_distance: config.max_direct_distance.filter(|limit| *limit > 0.0),
        }
    }

    /// First blocker along the path, checking segments in order.
    pub fn test_path(&self, points: &[Point]) -> Option<Blocker> {
        points
            .windows(2)
            .find_map(|segment| self.registry.first_blocking(segment[0], segment[1]))
    }

    pub fn try_route(&self, start: Point, end: Point) -> LadderOutcome {
        let direct_allowed = self
            .max_direct_distance
            .is_none_or(|limit| distance(start, end) <= limit);
        if direct_allowed && self.test_path(&[start, end]).is_none() {
            return LadderOutcome::Routed {
                points: vec![start, end],
                strategy: RouteStrategy::Direct,
            };
        }

        for (strategy, points) in diagonal_candidates(start, end) {
            if self.test_path(&points).is_none() {
                trace!(?strategy, "diagonal candidate clear");
                return LadderOutcome::Routed { points, strategy };
            }
        }

        let vertical_first = vec![start, (start.0, end.1), end];
        let vertical = match self.test_path(&vertical_first) {
            None => {
                return LadderOutcome::Routed {
                    points: vertical_first,
                    strategy: RouteStrategy::VerticalFirst,
                };
            }
            Some(blocker) => blocker,
        };

        let horizontal_first = vec![start, (end.0, start.1), end];
        let horizontal = match self.test_path(&horizontal_first) {
            None => {
                return LadderOutcome::Routed {
                    points: horizontal_first,
                    strategy: RouteStrategy::HorizontalFirst,
                };
            }
            Some(blocker) => blocker,
        };

        LadderOutcome::Blocked {
            horizontal,
            vertical,
        }
    }
}

/// The two 45° variants for the dominant axis. The minor-axis distance is
/// covered diagonally, the rest straight. Variants whose bend point collapses
/// onto an endpoint duplicate the direct path and are left out.
fn diagonal_candidates(start: Point, end: Point) -> Vec<(RouteStrategy, Vec<Point>)> {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let (straight_diagonal, diagonal_straight) = if dx.abs() > dy.abs() {
        let minor = dy.abs();
        let sign = if dx < 0.0 { -1.0 } else { 1.0 };
        (
            (end.0 - sign * minor, start.1),
            (start.0 + sign * minor, end.1),
        )
    } else {
        let minor = dx.abs();
        let sign = if dy < 0.0 { -1.0 } else { 1.0 };
        (
            (start.0, end.1 - sign * minor),
            (end.0, start.1 + sign * minor),
        )
    };

    [
        (RouteStrategy::StraightDiagonal, straight_diagonal),
        (RouteStrategy::DiagonalStraight, diagonal_straight),
    ]
    .into_iter()
    .filter(|(_, bend)| !same_point(*bend, start) && !same_point(*bend, end))
    .map(|(strategy, bend)| (strategy, vec![start, bend, end]))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ObstacleSpec;

    fn registry(obstacles: &[(&str, f32, f32, f32, f32)]) -> ObstacleRegistry {
        let specs: Vec<ObstacleSpec> = obstacles
            .iter()
            .map(|&(id, x, y, w, h)| ObstacleSpec::new(id, x, y, w, h))
            .collect();
        ObstacleRegistry::build(&specs, &RouterConfig::default())
    }

    fn route(reg: &ObstacleRegistry, start: Point, end: Point) -> LadderOutcome {
        PathLadder::new(reg, &RouterConfig::default()).try_route(start, end)
    }

    #[test]
    fn direct_when_unobstructed() {
        let reg = registry(&[("A", 50.0, 50.0, 10.0, 10.0)]);
        assert_eq!(
            route(&reg, (0.0, 0.0), (100.0, 20.0)),
            LadderOutcome::Routed {
                points: vec![(0.0, 0.0), (100.0, 20.0)],
                strategy: RouteStrategy::Direct,
            }
        );
    }

    #[test]
    fn diagonal_variants_follow_dominant_axis() {
        let horizontal = diagonal_candidates((0.0, 0.0), (100.0, 20.0));
        assert_eq!(
            horizontal,
            vec![
                (
                    RouteStrategy::StraightDiagonal,
                    vec![(0.0, 0.0), (80.0, 0.0), (100.0, 20.0)]
                ),
                (
                    RouteStrategy::DiagonalStraight,
                    vec![(0.0, 0.0), (20.0, 20.0), (100.0, 20.0)]
                ),
            ]
        );

        let upward = diagonal_candidates((0.0, 100.0), (-30.0, 0.0));
        assert_eq!(
            upward,
            vec![
                (
                    RouteStrategy::StraightDiagonal,
                    vec![(0.0, 100.0), (0.0, 30.0), (-30.0, 0.0)]
                ),
                (
                    RouteStrategy::DiagonalStraight,
                    vec![(0.0, 100.0), (-30.0, 70.0), (-30.0, 0.0)]
                ),
            ]
        );
    }

    #[test]
    fn diagonal_variants_skip_straight_lines() {
        assert!(diagonal_candidates((0.0, 0.0), (100.0, 0.0)).is_empty());
        assert!(diagonal_candidates((5.0, 5.0), (5.0, 5.0)).is_empty());
    }

    #[test]
    fn diagonal_variant_avoids_block_on_direct_line() {
        // Sits on the direct line but below the straight-then-diagonal variant.
        let reg = registry(&[("C", 40.0, 5.0, 10.0, 10.0)]);
        let outcome = route(&reg, (0.0, 0.0), (100.0, 20.0));
        assert_eq!(
            outcome,
            LadderOutcome::Routed {
                points: vec![(0.0, 0.0), (80.0, 0.0), (100.0, 20.0)],
                strategy: RouteStrategy::StraightDiagonal,
            }
        );
    }

    #[test]
    fn orthogonal_variant_after_diagonals() {
        // Blocks the direct line and both diagonals, leaves the vertical-first L open.
        let reg = registry(&[
            ("low", 20.0, 40.0, 60.0, 30.0),
            ("mid", 20.0, 20.0, 10.0, 10.0),
        ]);
        let outcome = route(&reg, (0.0, 50.0), (100.0, 0.0));
        let LadderOutcome::Routed { points, strategy } = outcome else {
            panic!("expected a route, got {outcome:?}");
        };
        assert_eq!(strategy, RouteStrategy::VerticalFirst);
        assert_eq!(points, vec![(0.0, 50.0), (0.0, 0.0), (100.0, 0.0)]);
    }

    #[test]
    fn blocked_reports_orthogonal_blockers() {
        let reg = registry(&[("C", 120.0, 10.0, 20.0, 20.0)]);
        let outcome = route(&reg, (104.0, 20.0), (144.0, 20.0));
        let LadderOutcome::Blocked {
            horizontal,
            vertical,
        } = outcome
        else {
            panic!("expected a blocked ladder, got {outcome:?}");
        };
        assert_eq!(horizontal.obstacle, 0);
        assert_eq!(vertical.obstacle, 0);
    }

    #[test]
    fn max_direct_distance_rejects_long_direct_lines() {
        let reg = registry(&[]);
        let config = RouterConfig {
            max_direct_distance: Some(50.0),
            ..RouterConfig::default()
        };
        let outcome = PathLadder::new(&reg, &config).try_route((0.0, 0.0), (100.0, 10.0));
        let LadderOutcome::Routed { strategy, .. } = outcome else {
            panic!("expected a route, got {outcome:?}");
        };
        assert_eq!(strategy, RouteStrategy::StraightDiagonal);
    }

    #[test]
    fn test_path_reports_first_blocked_segment() {
        let reg = registry(&[("A", 0.0, 100.0, 10.0, 10.0), ("B", 100.0, 0.0, 10.0, 10.0)]);
        let ladder = PathLadder::new(&reg, &RouterConfig::default());
        let blocker = ladder
            .test_path(&[(-50.0, 5.0), (200.0, 5.0), (200.0, 105.0), (-50.0, 105.0)])
            .unwrap();
        assert_eq!(blocker.obstacle, 1);
        assert!(ladder.test_path(&[(-50.0, 50.0), (200.0, 50.0)]).is_none());
    }
}
