//! Grid sizing configuration.

use crate::error::SpaceError;

/// Sizing rules for a [`UniformGrid`](crate::UniformGrid).
///
/// By default the cell size tracks the largest agent diameter seen at each
/// rebuild, never dropping below `min_cell_size`. Setting
/// `fixed_cell_size` pins it instead, which is useful when the caller
/// knows the maximum interaction radius up front.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridConfig {
    /// Lower bound on the derived cell size.
    pub min_cell_size: f64,
    /// Fixed cell size; overrides the diameter-derived size when set.
    pub fixed_cell_size: Option<f64>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_cell_size: 1.0,
            fixed_cell_size: None,
        }
    }
}

impl GridConfig {
    /// Check that every size is positive and finite.
    pub fn validate(&self) -> Result<(), SpaceError> {
        check_size(self.min_cell_size)?;
        if let Some(fixed) = self.fixed_cell_size {
            check_size(fixed)?;
        }
        Ok(())
    }

    /// Cell size for a population whose largest diameter is `largest`.
    pub fn cell_size_for(&self, largest: f64) -> Result<f64, SpaceError> {
        let size = match self.fixed_cell_size {
            Some(fixed) => fixed,
            None => largest.max(self.min_cell_size),
        };
        check_size(size)?;
        Ok(size)
    }
}

fn check_size(value: f64) -> Result<(), SpaceError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SpaceError::InvalidCellSize { value })
    }
}
