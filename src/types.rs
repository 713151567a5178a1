//! Common types and traits for 2D floor geometry.
//!
//! Coordinates follow the container: `x` runs along the container length,
//! `y` along the container width. Rectangles are anchored at their lower
//! left corner.

use crate::error::ValidationError;

/// Global numerical tolerance for exact-value comparisons (squares, ties).
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Default tolerance used when testing separation between placed rectangles.
///
/// Large enough to absorb rounding at exact boundary contact.
pub const EPSILON_PLACEMENT: f64 = 0.01;

/// An axis-aligned rectangle on the container floor.
///
/// # Examples
/// ```
/// use stow_it_now::types::Rect;
///
/// let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
/// assert_eq!(rect.right(), 110.0);
/// assert_eq!(rect.top(), 70.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub length: f64,
    pub width: f64,
}

impl Rect {
    /// Creates a new rectangle.
    ///
    /// # Parameters
    /// * `x` - Position along the container length
    /// * `y` - Position along the container width
    /// * `length` - Extent along x
    /// * `width` - Extent along y
    #[inline]
    pub const fn new(x: f64, y: f64, length: f64, width: f64) -> Self {
        Self {
            x,
            y,
            length,
            width,
        }
    }

    /// Right edge (x + length).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.length
    }

    /// Top edge (y + width).
    #[inline]
    pub fn top(&self) -> f64 {
        self.y + self.width
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.length * self.width
    }

    /// Returns the center point.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.length / 2.0, self.y + self.width / 2.0)
    }

    /// Euclidean distance between the centers of two rectangles.
    #[inline]
    pub fn center_distance(&self, other: &Self) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        let dx = ax - bx;
        let dy = ay - by;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Trait for objects with a rectangular footprint.
pub trait Footprint {
    /// Returns `(length, width)`.
    fn footprint(&self) -> (f64, f64);

    /// Calculates the footprint area.
    fn area(&self) -> f64 {
        let (length, width) = self.footprint();
        length * width
    }

    /// Checks whether the footprint is square within the general tolerance.
    fn is_square(&self) -> bool {
        let (length, width) = self.footprint();
        (length - width).abs() <= EPSILON_GENERAL
    }
}

/// Validation helpers shared by the model types.
pub mod validation {
    use super::ValidationError;

    /// Validates a single strictly positive, finite dimension.
    ///
    /// # Parameters
    /// * `value` - The value to validate
    /// * `name` - Name of the dimension for error messages
    pub fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
        if value.is_nan() {
            return Err(ValidationError::InvalidDimension(format!(
                "{} must not be NaN",
                name
            )));
        }
        if value.is_infinite() {
            return Err(ValidationError::InvalidDimension(format!(
                "{} must not be infinite",
                name
            )));
        }
        if value <= 0.0 {
            return Err(ValidationError::InvalidDimension(format!(
                "{} must be positive, got: {}",
                name, value
            )));
        }
        Ok(())
    }

    /// Validates the clearance distance (zero allowed).
    pub fn validate_clearance(value: f64) -> Result<(), ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidClearance(format!(
                "Clearance must be a finite value >= 0, got: {}",
                value
            )));
        }
        Ok(())
    }
}
