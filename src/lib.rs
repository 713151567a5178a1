//! 2D container floor placement engine.
//!
//! Given a container floor, a set of rectangular pallet types and a minimum
//! clearance, [`place`] runs several placement strategies on independent
//! copies of the expanded pallet list and returns the best-scoring layout.
//!
//! ```
//! use stow_it_now::{Container, PalletType, place};
//!
//! let types = vec![
//!     PalletType::new("A", 110.0, 110.0, 12).unwrap(),
//!     PalletType::new("B", 100.0, 125.0, 8).unwrap(),
//! ];
//! let outcome = place(&types, Container::new(1203.2, 235.0).unwrap(), 1.0).unwrap();
//! assert_eq!(outcome.stats.placed_pallets, 20);
//! ```

pub mod error;
pub mod evaluator;
pub mod geometry;
pub mod model;
pub mod optimizer;
pub mod stats;
pub mod strategy;
pub mod types;

pub use error::{StrategyError, ValidationError};
pub use model::{Container, PalletInstance, PalletType, PlacementResult};
pub use optimizer::{
    PlaceEvent, PlacementConfig, PlacementOutcome, place, place_with_config, place_with_progress,
};
pub use stats::StatsSnapshot;
pub use strategy::{PlacementStrategy, StrategyKind};
