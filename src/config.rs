use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::types::Size;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Auto,
    Horizontal,
    Vertical,
    Mixed,
}

impl std::str::FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(LayoutMode::Auto),
            "horizontal" => Ok(LayoutMode::Horizontal),
            "vertical" => Ok(LayoutMode::Vertical),
            "mixed" => Ok(LayoutMode::Mixed),
            _ => Err(format!(
                "invalid layout mode '{}', expected: auto, horizontal, vertical, or mixed",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Regular,
    Enhanced,
    Traditional,
}

impl Algorithm {
    pub fn label(self) -> &'static str {
        match self {
            Algorithm::Regular => "regular",
            Algorithm::Enhanced => "enhanced",
            Algorithm::Traditional => "traditional",
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "regular" => Ok(Algorithm::Regular),
            "enhanced" => Ok(Algorithm::Enhanced),
            "traditional" => Ok(Algorithm::Traditional),
            _ => Err(format!(
                "invalid algorithm '{}', expected: regular, enhanced, or traditional",
                s
            )),
        }
    }
}

/// Parameters of one optimization call. All distances are in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub wall_distance: f64,
    pub table_distance: f64,
    /// Clearance kept around obstacles; `wall_distance` when unset.
    pub obstacle_distance: Option<f64>,
    pub table_width: f64,
    pub table_height: f64,
    pub grid_size: f64,
    pub layout_mode: LayoutMode,
    pub optimize_count: bool,
    pub use_enhanced_algorithm: bool,
    /// Explicit strategy choice, takes precedence over the two flags above.
    pub algorithm: Option<Algorithm>,
    pub max_iterations: usize,
    pub remove_ratio: f64,
    /// Reinsertion step sizes, coarse to fine.
    pub grid_search_sizes: Vec<f64>,
    pub compression_step: f64,
    pub fine_scan_step: f64,
    /// Candidate positions snap to multiples of this; 0 disables snapping.
    pub alignment_tolerance: f64,
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            wall_distance: 1500.0,
            table_distance: 1400.0,
            obstacle_distance: None,
            table_width: 2850.0,
            table_height: 1550.0,
            grid_size: 100.0,
            layout_mode: LayoutMode::Auto,
            optimize_count: true,
            use_enhanced_algorithm: true,
            algorithm: None,
            max_iterations: 10,
            remove_ratio: 0.2,
            grid_search_sizes: vec![400.0, 200.0, 100.0],
            compression_step: 50.0,
            fine_scan_step: 50.0,
            alignment_tolerance: 50.0,
            seed: 42,
        }
    }
}

impl LayoutConfig {
    pub fn table_size(&self) -> Size {
        Size::new(self.table_width, self.table_height)
    }

    pub fn obstacle_clearance(&self) -> f64 {
        self.obstacle_distance.unwrap_or(self.wall_distance)
    }

    pub fn algorithm(&self) -> Algorithm {
        match self.algorithm {
            Some(algorithm) => algorithm,
            None if self.use_enhanced_algorithm => Algorithm::Enhanced,
            None if self.optimize_count => Algorithm::Traditional,
            None => Algorithm::Regular,
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("table_width", self.table_width),
            ("table_height", self.table_height),
            ("grid_size", self.grid_size),
            ("fine_scan_step", self.fine_scan_step),
            ("compression_step", self.compression_step),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }

        let mut non_negative = vec![
            ("wall_distance", self.wall_distance),
            ("table_distance", self.table_distance),
            ("alignment_tolerance", self.alignment_tolerance),
        ];
        if let Some(d) = self.obstacle_distance {
            non_negative.push(("obstacle_distance", d));
        }
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must not be negative, got {value}")));
            }
        }

        if !(0.0..=1.0).contains(&self.remove_ratio) {
            return Err(invalid(format!(
                "remove_ratio must be within [0, 1], got {}",
                self.remove_ratio
            )));
        }

        if let Some(step) = self
            .grid_search_sizes
            .iter()
            .find(|s| !s.is_finite() || **s <= 0.0)
        {
            return Err(invalid(format!(
                "grid_search_sizes entries must be positive, got {step}"
            )));
        }

        Ok(())
    }
}

fn invalid(msg: String) -> LayoutError {
    LayoutError::InvalidConfig(msg)
}
