/// Build parameters for the octree spatial index.
///
/// Parameters are immutable once a build starts; the manager stages
/// changed parameters and applies them on the next rebuild.

use crate::error::{Error, Result};

/// Safety cap on subdivision depth, independent of user parameters.
/// A region halves per level, so 32 levels exhaust f32 resolution for
/// any practical scene extent.
pub const MAX_DEPTH_CAP: u32 = 32;

/// Tuning parameters controlling octree construction and queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildParameters {
    /// A node is not subdivided once its region is smaller than this on
    /// every axis.
    pub min_node_size: f32,

    /// A leaf is subdivided when it holds at least this many objects.
    pub min_objects_to_split: u32,

    /// Omit empty octants entirely and prune nodes that become empty on
    /// removal. When false, empty octants are retained as empty leaves.
    pub auto_prune_empty: bool,

    /// Split regions as equal-sided cubes over the largest extent rather
    /// than following the region's aspect ratio. Preferred for scenes with
    /// near-uniform object size.
    pub cubify: bool,

    /// Record every node box visited during a query for diagnostics and
    /// debug visualization. Does not affect query results.
    pub record_hit_path: bool,

    /// Maximum subdivision depth (root = 0). Clamped to [`MAX_DEPTH_CAP`].
    pub max_depth: u32,
}

impl Default for BuildParameters {
    fn default() -> Self {
        Self {
            min_node_size: 1.0,
            min_objects_to_split: 8,
            auto_prune_empty: true,
            cubify: true,
            record_hit_path: false,
            max_depth: MAX_DEPTH_CAP,
        }
    }
}

impl BuildParameters {
    /// Validate this parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] if `min_node_size` is not a
    /// positive finite number, or if `min_objects_to_split` is below 2
    /// (a split of fewer than two objects can never reduce work).
    pub fn validate(&self) -> Result<()> {
        if !self.min_node_size.is_finite() || self.min_node_size <= 0.0 {
            return Err(Error::InvalidParameters(format!(
                "min_node_size must be positive and finite, got {}",
                self.min_node_size
            )));
        }
        if self.min_objects_to_split < 2 {
            return Err(Error::InvalidParameters(format!(
                "min_objects_to_split must be at least 2, got {}",
                self.min_objects_to_split
            )));
        }
        Ok(())
    }

    /// Effective depth limit: user setting clamped to the safety cap.
    pub fn depth_limit(&self) -> u32 {
        self.max_depth.min(MAX_DEPTH_CAP)
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
