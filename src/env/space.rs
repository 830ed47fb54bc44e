//! Per-dimension action bounds.

use ndarray::Array1;

use crate::error::ConversionError;

/// Box-shaped action space: independent `[low, high]` bounds per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionBounds {
    low: Array1<f64>,
    high: Array1<f64>,
}

impl ActionBounds {
    /// Build bounds from per-dimension `(low, high)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        let low = Array1::from_iter(pairs.iter().map(|(lo, _)| *lo));
        let high = Array1::from_iter(pairs.iter().map(|(_, hi)| *hi));
        Self { low, high }
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn low(&self) -> &Array1<f64> {
        &self.low
    }

    pub fn high(&self) -> &Array1<f64> {
        &self.high
    }

    /// Clamp an action to the bounds, returning the clipped vector.
    pub fn clip(&self, action: &Array1<f64>) -> Result<Array1<f64>, ConversionError> {
        self.check_dim(action)?;
        let mut clipped = action.clone();
        for ((value, &lo), &hi) in clipped.iter_mut().zip(self.low.iter()).zip(self.high.iter()) {
            *value = value.clamp(lo, hi);
        }
        Ok(clipped)
    }

    /// Whether every dimension lies within bounds, up to `tolerance`.
    pub fn contains(&self, action: &Array1<f64>, tolerance: f64) -> bool {
        if action.len() != self.dim() {
            return false;
        }
        action
            .iter()
            .zip(self.low.iter())
            .zip(self.high.iter())
            .all(|((&v, &lo), &hi)| v >= lo - tolerance && v <= hi + tolerance)
    }

    /// Zero vector matching this space's dimension.
    pub fn zeros(&self) -> Array1<f64> {
        Array1::zeros(self.dim())
    }

    fn check_dim(&self, action: &Array1<f64>) -> Result<(), ConversionError> {
        if action.len() != self.dim() {
            return Err(ConversionError::DimensionMismatch {
                expected: self.dim(),
                found: action.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_clip_clamps_each_dimension() {
        let bounds = ActionBounds::from_pairs(&[(-1.0, 1.0), (0.0, 0.5)]);
        let clipped = bounds.clip(&array![2.0, -0.2]).expect("clip should succeed");
        assert_eq!(clipped, array![1.0, 0.0]);
    }

    #[test]
    fn test_clip_rejects_wrong_dimension() {
        let bounds = ActionBounds::from_pairs(&[(-1.0, 1.0)]);
        assert!(matches!(
            bounds.clip(&array![0.0, 0.0]),
            Err(ConversionError::DimensionMismatch { expected: 1, found: 2 })
        ));
    }

    #[test]
    fn test_contains_with_tolerance() {
        let bounds = ActionBounds::from_pairs(&[(-1.0, 1.0)]);
        assert!(bounds.contains(&array![1.0], 0.0));
        assert!(bounds.contains(&array![1.0 + 1e-9], 1e-8));
        assert!(!bounds.contains(&array![1.1], 1e-8));
    }
}
