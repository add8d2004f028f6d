use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{Algorithm, LayoutConfig};
use crate::enhanced::EnhancedStrategy;
use crate::error::{LayoutError, Result};
use crate::geometry::{self, EPSILON};
use crate::grid::GridStrategy;
use crate::region::UsableRegion;
use crate::scoring;
use crate::search::TraditionalSearch;
use crate::types::{LayoutResult, Obstacle, Polygon, Table};
use crate::validator::PlacementValidator;

pub struct Solver {
    boundary: Polygon,
    obstacles: Vec<Obstacle>,
    config: LayoutConfig,
}

impl Solver {
    pub fn new(boundary: Polygon, obstacles: Vec<Obstacle>, config: LayoutConfig) -> Self {
        Self {
            boundary,
            obstacles,
            config,
        }
    }

    /// Validates the input, then runs the configured strategy to completion.
    /// An unusable region is not an error: it yields an empty layout.
    pub fn solve(&self) -> Result<LayoutResult> {
        self.validate()?;

        let algorithm = self.config.algorithm();
        let region = UsableRegion::build(&self.boundary, &self.obstacles, &self.config);
        let validator = PlacementValidator::new(&region, &self.config);

        let tables: Vec<Table> = match algorithm {
            Algorithm::Regular => {
                GridStrategy::new(validator, self.config.table_distance, self.config.layout_mode)
                    .solve()
                    .tables
            }
            Algorithm::Enhanced => EnhancedStrategy::new(validator, &self.config).solve(),
            Algorithm::Traditional => {
                let mut rng = StdRng::seed_from_u64(self.config.seed);
                TraditionalSearch::new(validator, &self.config).solve(&mut rng)
            }
        };

        let stats = scoring::stats(&tables, region.boundary_area(), algorithm.label());
        tracing::info!(
            algorithm = stats.algorithm_used,
            tables = stats.table_count,
            utilization = stats.space_utilization,
            "layout solved"
        );

        Ok(LayoutResult { tables, stats })
    }

    pub fn boundary(&self) -> &Polygon {
        &self.boundary
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Input checks run before any search: boundary shape, obstacle sizes
    /// and config ranges.
    pub fn validate(&self) -> Result<()> {
        let points = &self.boundary.points;
        if points.len() < 3 {
            return Err(LayoutError::InvalidBoundary(format!(
                "at least 3 points required, got {}",
                points.len()
            )));
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(LayoutError::InvalidBoundary(
                "coordinates must be finite".to_string(),
            ));
        }
        if geometry::polygon_area(&self.boundary) <= EPSILON {
            return Err(LayoutError::InvalidBoundary("zero area".to_string()));
        }
        if !geometry::is_simple(&self.boundary) {
            return Err(LayoutError::InvalidBoundary(
                "edges must not self-intersect".to_string(),
            ));
        }

        for (i, obstacle) in self.obstacles.iter().enumerate() {
            let finite = obstacle.center.x.is_finite()
                && obstacle.center.y.is_finite()
                && obstacle.size.w.is_finite()
                && obstacle.size.h.is_finite();
            if !finite || obstacle.size.w <= 0.0 || obstacle.size.h <= 0.0 {
                return Err(LayoutError::InvalidObstacle(format!(
                    "obstacle {i} must have a positive size, got {}",
                    obstacle.size
                )));
            }
        }

        self.config.validate()
    }
}
