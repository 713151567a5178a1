//! Data models for the floor placement engine.
//!
//! - `PalletType`: caller input, one entry per pallet size and quantity
//! - `PalletInstance`: one physical pallet, annotated by a strategy
//! - `Container`: the floor that pallets are placed on
//! - `PlacementResult`: the annotated instance list a strategy returns

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::error::ValidationError;
use crate::types::{Footprint, Rect, validation};

/// Committed footprint used for collision queries inside a strategy.
pub type PlacedRect = Rect;

/// Colors assigned to pallet types that do not bring their own.
const TYPE_PALETTE: [&str; 10] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

/// Returns the palette color for the pallet type at `type_index`.
pub fn palette_color(type_index: usize) -> String {
    TYPE_PALETTE[type_index % TYPE_PALETTE.len()].to_string()
}

/// A pallet size requested by the caller.
///
/// # Fields
/// * `id` - Identifier of the pallet type
/// * `length` - Extent along the container length
/// * `width` - Extent along the container width
/// * `quantity` - Number of physical pallets of this type
/// * `allow_rotation` - Overrides the run-wide rotation setting when present
/// * `color` - Display color; a palette color is used when absent
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "id": "EUR", "length": 120.0, "width": 80.0, "quantity": 10 }))]
pub struct PalletType {
    pub id: String,
    pub length: f64,
    pub width: f64,
    pub quantity: usize,
    #[serde(default)]
    #[schema(nullable = true)]
    pub allow_rotation: Option<bool>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub color: Option<String>,
}

impl PalletType {
    /// Creates a new pallet type with validation.
    ///
    /// # Examples
    /// ```
    /// use stow_it_now::model::PalletType;
    ///
    /// assert!(PalletType::new("EUR", 120.0, 80.0, 4).is_ok());
    /// assert!(PalletType::new("EUR", -120.0, 80.0, 4).is_err());
    /// ```
    pub fn new(
        id: impl Into<String>,
        length: f64,
        width: f64,
        quantity: usize,
    ) -> Result<Self, ValidationError> {
        let pallet_type = Self {
            id: id.into(),
            length,
            width,
            quantity,
            allow_rotation: None,
            color: None,
        };
        pallet_type.validate()?;
        Ok(pallet_type)
    }

    /// Sets the per-type rotation override.
    pub fn with_rotation(mut self, allow_rotation: bool) -> Self {
        self.allow_rotation = Some(allow_rotation);
        self
    }

    /// Sets the display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Validates the dimensions of this type.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let length_label = format!("Length of pallet type '{}'", self.id);
        let width_label = format!("Width of pallet type '{}'", self.id);
        validation::validate_dimension(self.length, &length_label)?;
        validation::validate_dimension(self.width, &width_label)?;
        Ok(())
    }
}

impl Footprint for PalletType {
    fn footprint(&self) -> (f64, f64) {
        (self.length, self.width)
    }
}

/// Container floor. Height is not part of the 2D engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Container {
    pub length: f64,
    pub width: f64,
}

impl Container {
    /// Creates a new container floor with validation.
    pub fn new(length: f64, width: f64) -> Result<Self, ValidationError> {
        let container = Self { length, width };
        container.validate()?;
        Ok(container)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_dimension(self.length, "Container length")?;
        validation::validate_dimension(self.width, "Container width")?;
        Ok(())
    }

    /// Floor area.
    #[inline]
    pub fn area(&self) -> f64 {
        self.length * self.width
    }

    /// Length of the floor diagonal.
    #[inline]
    pub fn diagonal(&self) -> f64 {
        (self.length * self.length + self.width * self.width).sqrt()
    }
}

/// One way to lay an instance on the floor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
    pub length: f64,
    pub width: f64,
    pub rotated: bool,
}

/// One physical pallet derived from a `PalletType`.
///
/// `final_length`/`final_width` equal `length`/`width` and the position is
/// `(0, 0)` until a strategy places the instance.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PalletInstance {
    pub type_id: String,
    pub instance_index: usize,
    pub length: f64,
    pub width: f64,
    pub color: String,
    pub placed: bool,
    pub x: f64,
    pub y: f64,
    pub final_length: f64,
    pub final_width: f64,
    pub rotated: bool,
    pub area: f64,
    pub allow_rotation: bool,
}

impl PalletInstance {
    fn from_type(
        pallet_type: &PalletType,
        instance_index: usize,
        color: String,
        allow_rotation: bool,
    ) -> Self {
        Self {
            type_id: pallet_type.id.clone(),
            instance_index,
            length: pallet_type.length,
            width: pallet_type.width,
            color,
            placed: false,
            x: 0.0,
            y: 0.0,
            final_length: pallet_type.length,
            final_width: pallet_type.width,
            rotated: false,
            area: pallet_type.length * pallet_type.width,
            allow_rotation,
        }
    }

    /// Commits the instance at `(x, y)` with the given orientation.
    pub fn place_at(&mut self, x: f64, y: f64, orientation: Orientation) {
        self.placed = true;
        self.x = x;
        self.y = y;
        self.final_length = orientation.length;
        self.final_width = orientation.width;
        self.rotated = orientation.rotated;
    }

    /// The committed footprint (final dimensions at the current position).
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.final_length, self.final_width)
    }

    /// Checks that the final dimensions are the original ones, possibly swapped.
    pub fn has_valid_orientation(&self) -> bool {
        if self.rotated {
            self.final_length == self.width && self.final_width == self.length
        } else {
            self.final_length == self.length && self.final_width == self.width
        }
    }
}

impl Footprint for PalletInstance {
    fn footprint(&self) -> (f64, f64) {
        (self.final_length, self.final_width)
    }
}

/// Expands pallet types into individual instances.
///
/// Instances are sorted descending by area; ties keep input order, so large
/// pallets are offered to every strategy first.
///
/// # Parameters
/// * `pallet_types` - Requested pallet types in caller order
/// * `allow_rotation` - Rotation default for types without an override
pub fn expand_instances(pallet_types: &[PalletType], allow_rotation: bool) -> Vec<PalletInstance> {
    let mut instances: Vec<PalletInstance> = pallet_types
        .iter()
        .enumerate()
        .flat_map(|(type_index, pallet_type)| {
            let color = pallet_type
                .color
                .clone()
                .unwrap_or_else(|| palette_color(type_index));
            let rotation = pallet_type.allow_rotation.unwrap_or(allow_rotation);
            (0..pallet_type.quantity).map(move |instance_index| {
                PalletInstance::from_type(pallet_type, instance_index, color.clone(), rotation)
            })
        })
        .collect();

    // sort_by is stable: equal areas keep their expansion order
    instances.sort_by(|a, b| b.area.partial_cmp(&a.area).unwrap_or(Ordering::Equal));
    instances
}

/// Enumerates the allowed orientations of an instance.
///
/// Returns only the identity when rotation is disabled or the footprint is
/// square, otherwise identity followed by the 90° swap.
pub fn orientations(instance: &PalletInstance, rotation_enabled: bool) -> Vec<Orientation> {
    let identity = Orientation {
        length: instance.length,
        width: instance.width,
        rotated: false,
    };
    if !rotation_enabled || instance.is_square() {
        return vec![identity];
    }
    vec![
        identity,
        Orientation {
            length: instance.width,
            width: instance.length,
            rotated: true,
        },
    ]
}

/// The annotated instance list produced by a strategy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlacementResult {
    pub instances: Vec<PalletInstance>,
}

impl PlacementResult {
    pub fn new(instances: Vec<PalletInstance>) -> Self {
        Self { instances }
    }

    /// Iterates over placed instances.
    pub fn placed(&self) -> impl Iterator<Item = &PalletInstance> {
        self.instances.iter().filter(|instance| instance.placed)
    }

    /// Iterates over instances that could not be placed.
    pub fn unplaced(&self) -> impl Iterator<Item = &PalletInstance> {
        self.instances.iter().filter(|instance| !instance.placed)
    }

    pub fn placed_count(&self) -> usize {
        self.placed().count()
    }

    pub fn unplaced_count(&self) -> usize {
        self.unplaced().count()
    }

    pub fn total(&self) -> usize {
        self.instances.len()
    }

    /// Sum of the placed footprints.
    pub fn used_area(&self) -> f64 {
        self.placed().map(|instance| instance.rect().area()).sum()
    }
}
