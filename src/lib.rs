pub mod config;
pub mod ir;
pub mod routing;
pub mod theme;

pub use config::{Config, ConfigError, RouterConfig, load_config, parse_config};
pub use ir::{
    AnchorProvider, Diagram, EdgeSpec, ObstacleSpec, PortSide, SlotAnchors, order_edges_by_source,
};
pub use routing::{
    PathKind, RouteStrategy, RoutedLink, RoutingOutput, RoutingSession, SessionStats, route_diagram,
    route_links,
};
pub use theme::LinkTheme;
