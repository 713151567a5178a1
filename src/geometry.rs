//! Geometric helpers for 2D collision detection and containment.
//!
//! Clearance is modelled as a separation requirement between two footprints.
//! Stored rectangles are never inflated.

use crate::model::Container;
use crate::types::Rect;

/// Checks whether two rectangles violate the clearance requirement.
///
/// Two rectangles do NOT overlap when they are separated by at least
/// `clearance` along x or along y. `epsilon` absorbs rounding so that exact
/// boundary contact at the required distance counts as separated.
///
/// # Parameters
/// * `a` - First rectangle
/// * `b` - Second rectangle
/// * `clearance` - Minimum required gap
/// * `epsilon` - Numerical tolerance
///
/// # Returns
/// `true` if the rectangles are closer than `clearance` on both axes
///
/// # Examples
/// ```
/// use stow_it_now::geometry::overlaps;
/// use stow_it_now::types::Rect;
///
/// let a = Rect::new(0.0, 0.0, 10.0, 10.0);
/// let b = Rect::new(11.0, 0.0, 10.0, 10.0);
/// assert!(!overlaps(&a, &b, 1.0, 0.01));
/// assert!(overlaps(&a, &b, 2.0, 0.01));
/// ```
pub fn overlaps(a: &Rect, b: &Rect, clearance: f64, epsilon: f64) -> bool {
    // Separating axis: one clear axis is enough.
    let separated_x =
        a.right() + clearance <= b.x + epsilon || b.right() + clearance <= a.x + epsilon;
    let separated_y =
        a.top() + clearance <= b.y + epsilon || b.top() + clearance <= a.y + epsilon;
    !(separated_x || separated_y)
}

/// Checks whether a rectangle lies within the container floor.
///
/// Negative coordinates always fail; the far edges may exceed the container
/// bounds by at most `epsilon`.
pub fn fits(candidate: &Rect, container: &Container, epsilon: f64) -> bool {
    if candidate.x < 0.0 || candidate.y < 0.0 {
        return false;
    }
    candidate.right() <= container.length + epsilon && candidate.top() <= container.width + epsilon
}

/// Checks whether a rectangle can be committed to the current layout.
///
/// # Parameters
/// * `candidate` - The rectangle to test
/// * `placed` - Footprints already committed
/// * `clearance` - Minimum gap between footprints
/// * `container` - The container floor
/// * `epsilon` - Numerical tolerance
pub fn can_place(
    candidate: &Rect,
    placed: &[Rect],
    clearance: f64,
    container: &Container,
    epsilon: f64,
) -> bool {
    fits(candidate, container, epsilon)
        && !placed
            .iter()
            .any(|other| overlaps(candidate, other, clearance, epsilon))
}

/// Generates candidate positions along one axis.
///
/// Produces a grid with the given step, always including the last position
/// at which the object still touches the far wall.
///
/// # Parameters
/// * `container_len` - Container extent on this axis
/// * `object_len` - Object extent on this axis
/// * `step` - Grid step
/// * `epsilon` - Numerical tolerance
///
/// # Returns
/// Sorted, de-duplicated positions; empty if the object is longer than the axis
pub fn axis_positions(container_len: f64, object_len: f64, step: f64, epsilon: f64) -> Vec<f64> {
    if object_len > container_len + epsilon {
        return Vec::new();
    }

    let max_pos = (container_len - object_len).max(0.0);
    let mut positions = Vec::new();

    if max_pos <= epsilon {
        positions.push(0.0);
        return positions;
    }

    // Non-positive steps degrade to the two end positions.
    let steps = if step > 0.0 {
        (max_pos / step).floor() as usize
    } else {
        0
    };
    for i in 0..=steps {
        positions.push((i as f64 * step).min(max_pos));
    }

    if let Some(&last) = positions.last() {
        if (last - max_pos).abs() > epsilon {
            positions.push(max_pos);
        }
    }

    positions.dedup_by(|a, b| (*a - *b).abs() < epsilon);
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_PLACEMENT;

    fn container(length: f64, width: f64) -> Container {
        Container { length, width }
    }

    #[test]
    fn overlap_is_symmetric() {
        let cases = [
            (Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(5.0, 5.0, 10.0, 10.0)),
            (Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(10.5, 0.0, 10.0, 10.0)),
            (Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(0.0, 12.0, 3.0, 3.0)),
        ];
        for (a, b) in cases {
            for clearance in [0.0, 1.0, 5.0] {
                assert_eq!(
                    overlaps(&a, &b, clearance, EPSILON_PLACEMENT),
                    overlaps(&b, &a, clearance, EPSILON_PLACEMENT),
                    "overlap must not depend on argument order"
                );
            }
        }
    }

    #[test]
    fn touching_rectangles_do_not_overlap_without_clearance() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!overlaps(&a, &b, 0.0, EPSILON_PLACEMENT));
        assert!(overlaps(&a, &b, 1.0, EPSILON_PLACEMENT));
    }

    #[test]
    fn clearance_is_a_separation_not_an_inflation() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        // Diagonal neighbours only need separation along one axis.
        let b = Rect::new(11.0, 11.0, 10.0, 10.0);
        assert!(!overlaps(&a, &b, 1.0, EPSILON_PLACEMENT));
        assert!((a.length - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tolerance_boundary_is_stable() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b_len = 100.0001;
        // Exactly at the required clearance.
        let b = Rect::new(100.01, 0.0, b_len, 100.0);
        assert!(!overlaps(&a, &b, 0.01, EPSILON_PLACEMENT));
        assert!(!overlaps(&b, &a, 0.01, EPSILON_PLACEMENT));
        // Tiny rounding perturbations keep the verdict.
        for delta in [-1e-9, 1e-9, 1e-7] {
            let shifted = Rect::new(100.01 + delta, 0.0, b_len, 100.0);
            assert!(!overlaps(&a, &shifted, 0.01, EPSILON_PLACEMENT));
        }
        // Clearly inside the gap.
        let close = Rect::new(99.9, 0.0, b_len, 100.0);
        assert!(overlaps(&a, &close, 0.01, EPSILON_PLACEMENT));
        assert!(overlaps(&close, &a, 0.01, EPSILON_PLACEMENT));
    }

    #[test]
    fn fits_rejects_negative_and_oversized() {
        let c = container(100.0, 50.0);
        assert!(fits(&Rect::new(0.0, 0.0, 100.0, 50.0), &c, EPSILON_PLACEMENT));
        assert!(!fits(&Rect::new(-1.0, 0.0, 10.0, 10.0), &c, EPSILON_PLACEMENT));
        assert!(!fits(&Rect::new(0.0, -1.0, 10.0, 10.0), &c, EPSILON_PLACEMENT));
        assert!(!fits(&Rect::new(95.0, 0.0, 10.0, 10.0), &c, EPSILON_PLACEMENT));
        assert!(!fits(&Rect::new(0.0, 45.0, 10.0, 10.0), &c, EPSILON_PLACEMENT));
    }

    #[test]
    fn can_place_checks_bounds_and_neighbours() {
        let c = container(100.0, 50.0);
        let placed = vec![Rect::new(0.0, 0.0, 40.0, 40.0)];
        assert!(can_place(
            &Rect::new(45.0, 0.0, 40.0, 40.0),
            &placed,
            5.0,
            &c,
            EPSILON_PLACEMENT
        ));
        assert!(!can_place(
            &Rect::new(42.0, 0.0, 40.0, 40.0),
            &placed,
            5.0,
            &c,
            EPSILON_PLACEMENT
        ));
        assert!(!can_place(
            &Rect::new(70.0, 0.0, 40.0, 40.0),
            &[],
            5.0,
            &c,
            EPSILON_PLACEMENT
        ));
    }

    #[test]
    fn axis_positions_include_far_wall() {
        let positions = axis_positions(23.0, 10.0, 5.0, EPSILON_PLACEMENT);
        assert_eq!(positions, vec![0.0, 5.0, 10.0, 13.0]);
    }

    #[test]
    fn axis_positions_handle_exact_and_oversized_objects() {
        assert_eq!(axis_positions(10.0, 10.0, 5.0, EPSILON_PLACEMENT), vec![0.0]);
        assert!(axis_positions(10.0, 12.0, 5.0, EPSILON_PLACEMENT).is_empty());
    }
}
