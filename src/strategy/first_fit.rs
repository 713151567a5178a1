use crate::error::StrategyError;
use crate::geometry::{axis_positions, can_place};
use crate::model::{Orientation, PalletInstance, PlacedRect, PlacementResult, orientations};
use crate::types::Rect;

use super::{PlacementContext, PlacementStrategy};

/// Places every instance at the first free grid position.
///
/// Orientations are tried outermost; within one orientation the grid is
/// scanned row by row (`y` outer, `x` inner), so the result favours the
/// lowest row, then the leftmost column. An unrotated fit on a higher row
/// therefore wins over a rotated fit at `y = 0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstFit;

impl PlacementStrategy for FirstFit {
    fn name(&self) -> &'static str {
        "first_fit"
    }

    fn run(
        &self,
        mut instances: Vec<PalletInstance>,
        ctx: &PlacementContext,
    ) -> Result<PlacementResult, StrategyError> {
        let mut placed: Vec<PlacedRect> = Vec::new();

        for instance in instances.iter_mut() {
            ctx.check_deadline()?;
            if let Some((x, y, orientation)) = find_first_position(instance, &placed, ctx) {
                instance.place_at(x, y, orientation);
                placed.push(instance.rect());
            }
        }

        Ok(PlacementResult::new(instances))
    }
}

/// Candidate positions for one orientation: `(ys, xs)`.
///
/// Both axes are bounded by the container extent divided by the grid step.
pub(super) fn position_grid(
    orientation: &Orientation,
    ctx: &PlacementContext,
) -> (Vec<f64>, Vec<f64>) {
    let step = ctx.config.grid_step;
    let eps = ctx.epsilon();
    let ys = axis_positions(ctx.container.width, orientation.width, step, eps);
    let xs = axis_positions(ctx.container.length, orientation.length, step, eps);
    (ys, xs)
}

fn find_first_position(
    instance: &PalletInstance,
    placed: &[PlacedRect],
    ctx: &PlacementContext,
) -> Option<(f64, f64, Orientation)> {
    for orientation in orientations(instance, instance.allow_rotation) {
        let (ys, xs) = position_grid(&orientation, ctx);
        for &y in &ys {
            for &x in &xs {
                let candidate = Rect::new(x, y, orientation.length, orientation.width);
                if can_place(
                    &candidate,
                    placed,
                    ctx.clearance,
                    &ctx.container,
                    ctx.epsilon(),
                ) {
                    return Some((x, y, orientation));
                }
            }
        }
    }
    None
}
