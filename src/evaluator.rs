//! Quality score for a complete layout.
//!
//! The score combines floor coverage with how tightly the placed pallets are
//! grouped, and is used to rank strategy results against each other.

use crate::model::{Container, PlacementResult};

/// Weight of the area efficiency in the composite score.
pub const AREA_WEIGHT: f64 = 0.7;
/// Weight of the compactness in the composite score.
pub const COMPACTNESS_WEIGHT: f64 = 0.3;

/// Scores a layout in `[0, 1]`; higher is better.
///
/// `0.7 × area_efficiency + 0.3 × compactness`, or `0.0` when nothing was
/// placed.
pub fn evaluate(result: &PlacementResult, container: &Container) -> f64 {
    if result.placed_count() == 0 {
        return 0.0;
    }
    let score = AREA_WEIGHT * area_efficiency(result, container)
        + COMPACTNESS_WEIGHT * compactness(result, container);
    score.clamp(0.0, 1.0)
}

/// Fraction of the container floor covered by placed footprints.
pub fn area_efficiency(result: &PlacementResult, container: &Container) -> f64 {
    let floor = container.area();
    if floor <= 0.0 {
        return 0.0;
    }
    result.used_area() / floor
}

/// One minus the average pairwise center distance, normalised by the floor
/// diagonal.
///
/// Defined as `1.0` with fewer than two placed pallets.
pub fn compactness(result: &PlacementResult, container: &Container) -> f64 {
    let rects: Vec<_> = result.placed().map(|instance| instance.rect()).collect();
    if rects.len() < 2 {
        return 1.0;
    }

    let max_distance = container.diagonal();
    if max_distance <= 0.0 {
        return 1.0;
    }

    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in rects.iter().enumerate() {
        for b in &rects[i + 1..] {
            total += a.center_distance(b);
            pairs += 1;
        }
    }

    1.0 - (total / pairs as f64) / max_distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Orientation, PalletType, expand_instances};

    const EPS: f64 = 1e-9;

    fn layout(positions: &[(f64, f64)], size: f64) -> PlacementResult {
        let pallet = PalletType::new("T", size, size, positions.len() + 1).unwrap();
        let mut instances = expand_instances(&[pallet], false);
        for (instance, &(x, y)) in instances.iter_mut().zip(positions) {
            instance.place_at(
                x,
                y,
                Orientation {
                    length: size,
                    width: size,
                    rotated: false,
                },
            );
        }
        PlacementResult::new(instances)
    }

    #[test]
    fn empty_layout_scores_zero() {
        let container = Container::new(100.0, 100.0).unwrap();
        let result = layout(&[], 10.0);
        assert_eq!(evaluate(&result, &container), 0.0);
    }

    #[test]
    fn single_pallet_is_perfectly_compact() {
        let container = Container::new(100.0, 100.0).unwrap();
        let result = layout(&[(0.0, 0.0)], 10.0);
        assert!((compactness(&result, &container) - 1.0).abs() < EPS);
        assert!((area_efficiency(&result, &container) - 0.01).abs() < EPS);
        assert!((evaluate(&result, &container) - (0.7 * 0.01 + 0.3)).abs() < EPS);
    }

    #[test]
    fn compactness_uses_average_pairwise_distance() {
        let container = Container::new(30.0, 40.0).unwrap();
        // Centers at (5, 5) and (23, 29): distance 30, diagonal 50.
        let result = layout(&[(0.0, 0.0), (18.0, 24.0)], 10.0);
        assert!((compactness(&result, &container) - 0.4).abs() < EPS);
    }

    #[test]
    fn tighter_layout_scores_higher() {
        let container = Container::new(200.0, 200.0).unwrap();
        let tight = layout(&[(0.0, 0.0), (10.0, 0.0)], 10.0);
        let loose = layout(&[(0.0, 0.0), (190.0, 190.0)], 10.0);
        assert!(evaluate(&tight, &container) > evaluate(&loose, &container));
    }

    #[test]
    fn unplaced_instances_are_ignored() {
        let container = Container::new(100.0, 100.0).unwrap();
        let result = layout(&[(0.0, 0.0)], 10.0);
        assert_eq!(result.total(), 2);
        assert!((area_efficiency(&result, &container) - 0.01).abs() < EPS);
    }
}
