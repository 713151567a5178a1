use std::cmp::Ordering;

use crate::error::StrategyError;
use crate::model::{Orientation, PalletInstance, PlacementResult, orientations};

use super::{PlacementContext, PlacementStrategy};

/// Unused sub-area of the container (`width` along x, `height` along y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FreeRectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FreeRectangle {
    fn holds(&self, orientation: &Orientation, epsilon: f64) -> bool {
        orientation.length <= self.width + epsilon && orientation.width <= self.height + epsilon
    }

    fn is_usable(&self, epsilon: f64) -> bool {
        self.width > epsilon && self.height > epsilon
    }
}

/// Guillotine-cut packing over a list of disjoint free rectangles.
///
/// An instance goes to the origin of the first free rectangle (ordered
/// bottom-up, then left-to-right) that holds one of its orientations. The
/// rectangle is then cut in two along the axis with the larger leftover,
/// leaving a clearance-wide gutter between the item and both remainders.
/// Remainders are subsets of the consumed rectangle, so free rectangles never
/// overlap each other and stay at least one clearance away from every placed
/// item.
#[derive(Clone, Copy, Debug, Default)]
pub struct Guillotine;

impl PlacementStrategy for Guillotine {
    fn name(&self) -> &'static str {
        "guillotine"
    }

    fn run(
        &self,
        mut instances: Vec<PalletInstance>,
        ctx: &PlacementContext,
    ) -> Result<PlacementResult, StrategyError> {
        let eps = ctx.epsilon();
        let mut free = vec![FreeRectangle {
            x: 0.0,
            y: 0.0,
            width: ctx.container.length,
            height: ctx.container.width,
        }];

        for instance in instances.iter_mut() {
            ctx.check_deadline()?;
            let Some((index, orientation)) = find_free_rectangle(instance, &free, eps) else {
                continue;
            };

            let target = free.remove(index);
            instance.place_at(target.x, target.y, orientation);
            free.extend(
                split(&target, &orientation, ctx.clearance)
                    .into_iter()
                    .filter(|rect| rect.is_usable(eps)),
            );
            sort_bottom_left(&mut free);
        }

        Ok(PlacementResult::new(instances))
    }
}

fn find_free_rectangle(
    instance: &PalletInstance,
    free: &[FreeRectangle],
    epsilon: f64,
) -> Option<(usize, Orientation)> {
    orientations(instance, instance.allow_rotation)
        .into_iter()
        .find_map(|orientation| {
            free.iter()
                .position(|rect| rect.holds(&orientation, epsilon))
                .map(|index| (index, orientation))
        })
}

/// Cuts `target` around an item placed at its origin.
///
/// Returns `[right, top]`. With a larger leftover along x the right part
/// keeps the full height, otherwise the top part keeps the full width.
fn split(target: &FreeRectangle, item: &Orientation, clearance: f64) -> [FreeRectangle; 2] {
    let leftover_x = target.width - item.length;
    let leftover_y = target.height - item.width;
    let right_x = target.x + item.length + clearance;
    let top_y = target.y + item.width + clearance;
    let right_width = leftover_x - clearance;
    let top_height = leftover_y - clearance;

    if leftover_x > leftover_y {
        [
            FreeRectangle {
                x: right_x,
                y: target.y,
                width: right_width,
                height: target.height,
            },
            FreeRectangle {
                x: target.x,
                y: top_y,
                width: item.length,
                height: top_height,
            },
        ]
    } else {
        [
            FreeRectangle {
                x: right_x,
                y: target.y,
                width: right_width,
                height: item.width,
            },
            FreeRectangle {
                x: target.x,
                y: top_y,
                width: target.width,
                height: top_height,
            },
        ]
    }
}

fn sort_bottom_left(free: &mut [FreeRectangle]) {
    free.sort_by(|a, b| {
        a.y.partial_cmp(&b.y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });
}
