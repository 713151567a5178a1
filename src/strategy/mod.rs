//! Placement strategies.
//!
//! Every strategy consumes its own copy of the instance list and returns it
//! annotated: each instance is visited once, placed instances carry their
//! position and orientation, the rest stay unplaced.

mod best_fit;
mod first_fit;
mod guillotine;
mod skyline;

use std::time::Instant;

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::StrategyError;
use crate::model::{Container, PalletInstance, PlacementResult};
use crate::optimizer::PlacementConfig;

pub use best_fit::BestFit;
pub use first_fit::FirstFit;
pub use guillotine::{FreeRectangle, Guillotine};
pub use skyline::{Skyline, SkylineSegment};

/// Everything a strategy needs besides the instances.
#[derive(Clone, Copy, Debug)]
pub struct PlacementContext {
    pub container: Container,
    pub clearance: f64,
    pub config: PlacementConfig,
    /// Strategies stop with `DeadlineExceeded` once this instant has passed.
    pub deadline: Option<Instant>,
}

impl PlacementContext {
    pub fn new(container: Container, clearance: f64, config: PlacementConfig) -> Self {
        Self {
            container,
            clearance,
            config,
            deadline: None,
        }
    }

    /// Sets the instant after which strategy runs are abandoned.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.config.epsilon
    }

    /// Checked by every strategy before it places the next instance.
    pub fn check_deadline(&self) -> Result<(), StrategyError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(StrategyError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// A placement algorithm.
pub trait PlacementStrategy: Sync {
    /// Stable name used in logs, events and reports.
    fn name(&self) -> &'static str;

    /// Places as many instances as possible.
    ///
    /// Takes ownership of the instance list so no state is shared with other
    /// strategy runs.
    fn run(
        &self,
        instances: Vec<PalletInstance>,
        ctx: &PlacementContext,
    ) -> Result<PlacementResult, StrategyError>;
}

/// The built-in strategies, in the order the selector runs them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    FirstFit,
    BestFit,
    Guillotine,
    Skyline,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::FirstFit,
        StrategyKind::BestFit,
        StrategyKind::Guillotine,
        StrategyKind::Skyline,
    ];
}

impl PlacementStrategy for StrategyKind {
    fn name(&self) -> &'static str {
        match self {
            StrategyKind::FirstFit => FirstFit.name(),
            StrategyKind::BestFit => BestFit.name(),
            StrategyKind::Guillotine => Guillotine.name(),
            StrategyKind::Skyline => Skyline.name(),
        }
    }

    fn run(
        &self,
        instances: Vec<PalletInstance>,
        ctx: &PlacementContext,
    ) -> Result<PlacementResult, StrategyError> {
        match self {
            StrategyKind::FirstFit => FirstFit.run(instances, ctx),
            StrategyKind::BestFit => BestFit.run(instances, ctx),
            StrategyKind::Guillotine => Guillotine.run(instances, ctx),
            StrategyKind::Skyline => Skyline.run(instances, ctx),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Verifies a finished layout.
///
/// Checks conservation, orientation validity, containment and pairwise
/// clearance. Any violation turns the run into a failed one.
pub fn verify_layout(
    result: &PlacementResult,
    expected: usize,
    ctx: &PlacementContext,
) -> Result<(), StrategyError> {
    if result.total() != expected {
        return Err(StrategyError::Conservation {
            expected,
            returned: result.total(),
        });
    }

    let mut placed = Vec::new();
    for (index, instance) in result.instances.iter().enumerate() {
        if !instance.placed {
            continue;
        }
        if !instance.has_valid_orientation() {
            return Err(StrategyError::InvalidOrientation { index });
        }
        if !crate::geometry::fits(&instance.rect(), &ctx.container, ctx.epsilon()) {
            return Err(StrategyError::OutOfBounds { index });
        }
        placed.push((index, instance.rect()));
    }

    for (i, (first, a)) in placed.iter().enumerate() {
        for (second, b) in &placed[i + 1..] {
            if crate::geometry::overlaps(a, b, ctx.clearance, ctx.epsilon()) {
                return Err(StrategyError::LayoutViolation {
                    first: *first,
                    second: *second,
                });
            }
        }
    }
    Ok(())
}
