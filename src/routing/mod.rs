pub mod detour;
pub mod geometry;
pub mod ladder;
pub mod registry;
mod session;
mod types;

pub use detour::{DetourEngine, DetourRoute, LaneReservation, ObstructionCounter};
pub use geometry::{Clip, Point, Rect, clip_segment, compress_path, path_enters};
pub use ladder::{LadderOutcome, PathLadder};
pub use registry::{Blocker, LaneSide, ObstacleEntry, ObstacleRegistry};
pub use session::{RoutingSession, route_diagram, route_links};
pub use types::{PathKind, RouteStrategy, RoutedLink, RoutingOutput, SessionStats};
