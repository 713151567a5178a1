//! Error types for the placement engine.
//!
//! Two families exist: [`ValidationError`] rejects a request before any
//! strategy runs, [`StrategyError`] marks a single strategy run as unusable
//! without aborting the others.

use thiserror::Error;

/// Invalid caller input detected before placement starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid clearance: {0}")]
    InvalidClearance(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Reasons a strategy run produced no usable layout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    /// An orientation did not preserve the instance's footprint.
    #[error("instance {index} received an orientation that is not a swap of its footprint")]
    InvalidOrientation { index: usize },

    /// The skyline no longer covers the container length without gaps.
    #[error("skyline no longer spans the container length (covered up to {covered})")]
    SkylineGap { covered: f64 },

    /// Two placed instances violate the clearance requirement.
    #[error("instances {first} and {second} overlap")]
    LayoutViolation { first: usize, second: usize },

    /// A placed instance extends past the container floor.
    #[error("instance {index} lies outside the container")]
    OutOfBounds { index: usize },

    /// The strategy returned a different number of instances than it received.
    #[error("strategy returned {returned} instances for {expected} inputs")]
    Conservation { expected: usize, returned: usize },

    /// The worker running the strategy terminated without a result.
    #[error("strategy worker terminated abnormally")]
    Aborted,

    /// The run's time budget ran out before the strategy finished.
    #[error("time budget exceeded")]
    DeadlineExceeded,
}
