use crate::error::StrategyError;
use crate::geometry::can_place;
use crate::model::{
    Container, Orientation, PalletInstance, PlacedRect, PlacementResult, orientations,
};
use crate::types::Rect;

use super::first_fit::position_grid;
use super::{PlacementContext, PlacementStrategy};

/// Scans the same grid as First-Fit but commits the lowest-scoring position.
///
/// See [`placement_score`] for the scoring rule.
#[derive(Clone, Copy, Debug, Default)]
pub struct BestFit;

impl PlacementStrategy for BestFit {
    fn name(&self) -> &'static str {
        "best_fit"
    }

    fn run(
        &self,
        mut instances: Vec<PalletInstance>,
        ctx: &PlacementContext,
    ) -> Result<PlacementResult, StrategyError> {
        let mut placed: Vec<PlacedRect> = Vec::new();

        for instance in instances.iter_mut() {
            ctx.check_deadline()?;
            if let Some(best) = find_best_position(instance, &placed, ctx) {
                instance.place_at(best.x, best.y, best.orientation);
                placed.push(instance.rect());
            }
        }

        Ok(PlacementResult::new(instances))
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    x: f64,
    y: f64,
    orientation: Orientation,
    score: f64,
}

/// Scores a candidate position; lower is better.
///
/// Distance from the origin corner plus `2 × gap` for each of the right and
/// top gaps that is narrower than `small_gap_threshold` (slivers too thin to
/// use). A gap of zero is a flush fit and costs nothing.
///
/// # Parameters
/// * `rect` - Candidate footprint
/// * `container` - The container floor
/// * `small_gap_threshold` - Gaps below this width are penalised
/// * `epsilon` - Numerical tolerance
pub fn placement_score(
    rect: &Rect,
    container: &Container,
    small_gap_threshold: f64,
    epsilon: f64,
) -> f64 {
    let distance = (rect.x * rect.x + rect.y * rect.y).sqrt();

    let right_gap = (container.length - rect.right()).max(0.0);
    let top_gap = (container.width - rect.top()).max(0.0);

    let penalty: f64 = [right_gap, top_gap]
        .into_iter()
        .filter(|&gap| gap > epsilon && gap < small_gap_threshold)
        .map(|gap| 2.0 * gap)
        .sum();

    distance + penalty
}

fn find_best_position(
    instance: &PalletInstance,
    placed: &[PlacedRect],
    ctx: &PlacementContext,
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;

    for orientation in orientations(instance, instance.allow_rotation) {
        let (ys, xs) = position_grid(&orientation, ctx);
        for &y in &ys {
            for &x in &xs {
                let rect = Rect::new(x, y, orientation.length, orientation.width);
                if !can_place(&rect, placed, ctx.clearance, &ctx.container, ctx.epsilon()) {
                    continue;
                }
                let score = placement_score(
                    &rect,
                    &ctx.container,
                    ctx.config.small_gap_threshold,
                    ctx.epsilon(),
                );
                // Strictly better only: the first candidate found wins ties.
                if best.is_none_or(|current| score < current.score) {
                    best = Some(Candidate {
                        x,
                        y,
                        orientation,
                        score,
                    });
                }
            }
        }
    }

    best
}
