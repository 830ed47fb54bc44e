//! Three-region action vector layout.
//!
//! Action vectors are laid out as `[floating-base dims][limb dims][gripper
//! dims]`. The transforms in `crate::convert` treat the regions differently
//! (base is delta-native, grippers are bistable), so the split is an
//! explicit, validated structure instead of positional slicing assumptions.

use std::ops::Range;

use crate::error::ConversionError;

/// Validated base/limb/gripper split of an action vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionLayout {
    base_dims: usize,
    limb_dims: usize,
    gripper_dims: usize,
}

impl ActionLayout {
    pub fn new(base_dims: usize, limb_dims: usize, gripper_dims: usize) -> Self {
        Self {
            base_dims,
            limb_dims,
            gripper_dims,
        }
    }

    /// Total dimension count.
    pub fn dim(&self) -> usize {
        self.base_dims + self.limb_dims + self.gripper_dims
    }

    pub fn base_dims(&self) -> usize {
        self.base_dims
    }

    pub fn limb_dims(&self) -> usize {
        self.limb_dims
    }

    pub fn gripper_dims(&self) -> usize {
        self.gripper_dims
    }

    /// Leading floating-base region.
    pub fn base_range(&self) -> Range<usize> {
        0..self.base_dims
    }

    /// Middle actuated-limb region.
    pub fn limb_range(&self) -> Range<usize> {
        self.base_dims..self.base_dims + self.limb_dims
    }

    /// Trailing gripper region.
    pub fn gripper_range(&self) -> Range<usize> {
        self.base_dims + self.limb_dims..self.dim()
    }

    /// Region covering everything after the floating base.
    pub fn post_base_range(&self) -> Range<usize> {
        self.base_dims..self.dim()
    }

    /// Check this layout against an action-space dimension.
    pub fn validate(&self, space_dim: usize) -> Result<(), ConversionError> {
        if self.dim() != space_dim {
            return Err(ConversionError::LayoutMismatch {
                layout: self.dim(),
                space: space_dim,
            });
        }
        Ok(())
    }
}
