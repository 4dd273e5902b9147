//! The travel graph: towns, nations and routes between them

pub mod nation;
pub mod route;
pub mod scenario;
pub mod town;

pub use nation::Nation;
pub use route::{route_dist_sq, WorldMap};
pub use town::Town;
