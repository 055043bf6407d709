//! The station network and structural path search.

mod catalog;
mod error;
mod pathfinder;

pub use catalog::{CatalogBuilder, StationCatalog};
pub use error::NetworkError;
pub use pathfinder::{
    DEFAULT_CHANGE_PENALTY_SECS, DEFAULT_MAX_HOPS, DEFAULT_RANKING_CHANGE_PENALTY_SECS,
    PathFinder, PathFinderConfig,
};
