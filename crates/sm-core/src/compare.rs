//! Relative-tolerance similarity of two shape descriptors

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::ShapeDescriptor;
use crate::error::SearchError;

/// Relative tolerance applied to volume and to each bounding box extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Fraction of the reference value, e.g. 0.02 for 2 %
    pub tolerance_percentage: f64,
}

impl ToleranceConfig {
    /// Validate and wrap a tolerance
    ///
    /// The tolerance must be finite and strictly positive. Values above 1.0
    /// are accepted but almost everything matches, so a warning is logged.
    pub fn new(tolerance_percentage: f64) -> Result<Self, SearchError> {
        if !tolerance_percentage.is_finite() || tolerance_percentage <= 0.0 {
            return Err(SearchError::Input(format!(
                "tolerance must be a finite value greater than 0, got {tolerance_percentage}"
            )));
        }
        if tolerance_percentage > 1.0 {
            tracing::warn!(
                "Tolerance {} is above 1.0; nearly any part will match",
                tolerance_percentage
            );
        }
        Ok(Self {
            tolerance_percentage,
        })
    }
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            tolerance_percentage: crate::constants::DEFAULT_TOLERANCE,
        }
    }
}

/// Relative differences between a candidate and the reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deviation {
    pub volume: f64,
    pub size_x: f64,
    pub size_y: f64,
    pub size_z: f64,
}

impl Deviation {
    /// Largest of the four differences (NaN if any is NaN)
    pub fn max(&self) -> f64 {
        [self.volume, self.size_x, self.size_y, self.size_z]
            .into_iter()
            .fold(0.0_f64, |acc, d| {
                if acc.is_nan() || d.is_nan() {
                    f64::NAN
                } else {
                    acc.max(d)
                }
            })
    }

    /// All four differences within `tolerance`
    ///
    /// Comparisons against NaN are false, so a malformed candidate never
    /// passes.
    pub fn within(&self, tolerance: f64) -> bool {
        self.volume <= tolerance
            && self.size_x <= tolerance
            && self.size_y <= tolerance
            && self.size_z <= tolerance
    }
}

/// Decides whether candidates are the same part as a fixed reference
#[derive(Debug, Clone)]
pub struct SimilarityComparator {
    reference: ShapeDescriptor,
    tolerance: ToleranceConfig,
}

impl SimilarityComparator {
    /// Build a comparator for `reference`, loaded from `path`
    ///
    /// Every reference measurement is a denominator, so a zero, negative or
    /// non-finite volume or extent is rejected with
    /// [`SearchError::DegenerateReference`].
    pub fn new(
        reference: ShapeDescriptor,
        path: &Path,
        tolerance: ToleranceConfig,
    ) -> Result<Self, SearchError> {
        let degenerate = |reason: String| SearchError::DegenerateReference {
            path: path.to_path_buf(),
            reason,
        };

        if !(reference.volume.is_finite() && reference.volume > 0.0) {
            return Err(degenerate(format!("volume is {}", reference.volume)));
        }
        for (axis, extent) in ["x", "y", "z"].into_iter().zip(reference.size.to_array()) {
            if !(extent.is_finite() && extent > 0.0) {
                return Err(degenerate(format!("size along {axis} is {extent}")));
            }
        }

        Ok(Self {
            reference,
            tolerance,
        })
    }

    pub fn reference(&self) -> &ShapeDescriptor {
        &self.reference
    }

    pub fn tolerance(&self) -> ToleranceConfig {
        self.tolerance
    }

    /// Relative differences of `candidate`, normalised by the reference
    pub fn deviation(&self, candidate: &ShapeDescriptor) -> Deviation {
        let r = &self.reference;
        let relative = |reference: f64, value: f64| (reference - value).abs() / reference;
        Deviation {
            volume: relative(r.volume, candidate.volume),
            size_x: relative(r.size.x, candidate.size.x),
            size_y: relative(r.size.y, candidate.size.y),
            size_z: relative(r.size.z, candidate.size.z),
        }
    }

    /// True iff volume and all three extents are within tolerance
    pub fn matches(&self, candidate: &ShapeDescriptor) -> bool {
        self.deviation(candidate)
            .within(self.tolerance.tolerance_percentage)
    }
}

/// One-shot comparison of two descriptors
///
/// Validates the tolerance and the reference on every call; build a
/// [`SimilarityComparator`] to compare many candidates against one
/// reference.
pub fn compare(
    reference: &ShapeDescriptor,
    candidate: &ShapeDescriptor,
    tolerance: f64,
) -> Result<bool, SearchError> {
    let comparator = SimilarityComparator::new(
        reference.clone(),
        Path::new("<reference>"),
        ToleranceConfig::new(tolerance)?,
    )?;
    Ok(comparator.matches(candidate))
}
