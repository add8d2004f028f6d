use std::cmp::Ordering;

use crate::candidates::CandidateScan;
use crate::config::LayoutMode;
use crate::scoring;
use crate::types::{Rect, Rotation, Table};
use crate::validator::PlacementValidator;

/// Outcome of a grid fill together with its dominant orientation.
#[derive(Debug, Clone)]
pub struct GridFill {
    pub tables: Vec<Table>,
    pub rotation: Rotation,
}

impl GridFill {
    /// Dominant orientation by table count, horizontal on a tie.
    fn from_tables(tables: Vec<Table>) -> Self {
        let vertical = tables.iter().filter(|t| t.rotation == Rotation::Deg90).count();
        let rotation = if vertical * 2 > tables.len() {
            Rotation::Deg90
        } else {
            Rotation::Deg0
        };
        Self { tables, rotation }
    }
}

pub struct GridStrategy<'a> {
    validator: PlacementValidator<'a>,
    table_distance: f64,
    mode: LayoutMode,
}

impl<'a> GridStrategy<'a> {
    pub fn new(validator: PlacementValidator<'a>, table_distance: f64, mode: LayoutMode) -> Self {
        Self {
            validator,
            table_distance,
            mode,
        }
    }

    pub fn solve(&self) -> GridFill {
        let Some(bounds) = self.validator.region().bounds() else {
            return GridFill::from_tables(Vec::new());
        };

        match self.mode {
            LayoutMode::Horizontal => self.raster(bounds, Rotation::Deg0),
            LayoutMode::Vertical => self.raster(bounds, Rotation::Deg90),
            LayoutMode::Mixed => self.mixed(bounds),
            LayoutMode::Auto => self.auto(bounds),
        }
    }

    /// Grid rows above and below the obstacles. Each band takes the
    /// orientation that places more tables in it, horizontal on a tie.
    pub fn obstacle_bands(&self) -> GridFill {
        let region = self.validator.region();
        let Some(bounds) = region.bounds() else {
            return GridFill::from_tables(Vec::new());
        };
        let obstacles = region.obstacles();
        if obstacles.is_empty() {
            return self.raster(bounds, Rotation::Deg0);
        }

        let clearance = region.obstacle_clearance();
        let top = obstacles.iter().map(|o| o.y).fold(f64::INFINITY, f64::min) - clearance;
        let bottom = obstacles.iter().map(Rect::max_y).fold(f64::NEG_INFINITY, f64::max) + clearance;

        let mut tables = Vec::new();
        if top > bounds.y {
            let top = top.min(bounds.max_y());
            tables = self.band(Rect::new(bounds.x, bounds.y, bounds.w, top - bounds.y), tables);
        }
        if bottom < bounds.max_y() {
            let bottom = bottom.max(bounds.y);
            tables = self.band(Rect::new(bounds.x, bottom, bounds.w, bounds.max_y() - bottom), tables);
        }
        tracing::debug!(count = tables.len(), "obstacle bands filled");
        GridFill::from_tables(tables)
    }

    fn band(&self, rect: Rect, placed: Vec<Table>) -> Vec<Table> {
        let nominal = self.validator.nominal();
        let mut horizontal = placed.clone();
        self.validator.fill(
            CandidateScan::grid(rect, nominal, Rotation::Deg0, self.table_distance),
            &mut horizontal,
        );
        let mut vertical = placed;
        self.validator.fill(
            CandidateScan::grid(rect, nominal, Rotation::Deg90, self.table_distance),
            &mut vertical,
        );

        let area = self.validator.region().boundary_area();
        if scoring::compare(&vertical, &horizontal, area) == Ordering::Greater {
            vertical
        } else {
            horizontal
        }
    }

    fn auto(&self, bounds: Rect) -> GridFill {
        let horizontal = self.raster(bounds, Rotation::Deg0);
        let vertical = self.raster(bounds, Rotation::Deg90);
        let area = self.validator.region().boundary_area();
        tracing::debug!(
            horizontal = horizontal.tables.len(),
            vertical = vertical.tables.len(),
            "grid orientations compared"
        );
        if scoring::compare(&vertical.tables, &horizontal.tables, area) == Ordering::Greater {
            vertical
        } else {
            horizontal
        }
    }

    fn raster(&self, bounds: Rect, rotation: Rotation) -> GridFill {
        let mut tables = Vec::new();
        let scan = CandidateScan::grid(bounds, self.validator.nominal(), rotation, self.table_distance);
        self.validator.fill(scan, &mut tables);
        GridFill { tables, rotation }
    }

    /// Horizontal grid in the upper half, vertical grid in the lower half,
    /// each rastered from the top of its own half. Falls back to `auto`
    /// when there are no obstacles.
    fn mixed(&self, bounds: Rect) -> GridFill {
        if self.validator.region().obstacles().is_empty() {
            return self.auto(bounds);
        }

        let nominal = self.validator.nominal();
        let mid = bounds.y + bounds.h / 2.0;
        let upper = Rect::new(bounds.x, bounds.y, bounds.w, mid - bounds.y);
        let lower = Rect::new(bounds.x, mid, bounds.w, bounds.max_y() - mid);

        let mut tables = Vec::new();
        self.validator.fill(
            CandidateScan::grid(upper, nominal, Rotation::Deg0, self.table_distance),
            &mut tables,
        );
        self.validator.fill(
            CandidateScan::grid(lower, nominal, Rotation::Deg90, self.table_distance),
            &mut tables,
        );
        GridFill::from_tables(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::region::UsableRegion;
    use crate::types::{Obstacle, Point, Polygon, Size};
    use crate::validator::tests::assert_layout_valid;

    fn run(boundary: &Polygon, obstacles: &[Obstacle], config: &LayoutConfig) -> GridFill {
        let region = UsableRegion::build(boundary, obstacles, config);
        let validator = PlacementValidator::new(&region, config);
        GridStrategy::new(validator, config.table_distance, config.layout_mode).solve()
    }

    #[test]
    fn test_small_room_two_tables() {
        let boundary = Polygon::rectangle(0.0, 0.0, 7000.0, 10000.0);
        let config = LayoutConfig::default();
        let fill = run(&boundary, &[], &config);
        assert_eq!(fill.tables.len(), 2);
        assert_eq!(fill.rotation, Rotation::Deg0);
        assert_eq!((fill.tables[0].x, fill.tables[0].y), (1500.0, 1500.0));
        assert_eq!((fill.tables[1].x, fill.tables[1].y), (1500.0, 4450.0));
        assert_layout_valid(&boundary, &[], &fill.tables, &config);
    }

    #[test]
    fn test_obstacle_skips_cells() {
        let boundary = Polygon::rectangle(0.0, 0.0, 10000.0, 15000.0);
        let obstacles = [Obstacle::new(Point::new(3000.0, 5000.0), Size::new(400.0, 400.0))];
        let config = LayoutConfig::default();
        let fill = run(&boundary, &obstacles, &config);
        assert_eq!(fill.tables.len(), 3);
        assert!(fill.tables.iter().all(|t| t.rotation == Rotation::Deg0));
        assert_layout_valid(&boundary, &obstacles, &fill.tables, &config);
    }

    #[test]
    fn test_auto_picks_better_orientation() {
        let boundary = Polygon::rectangle(0.0, 0.0, 10000.0, 15000.0);
        let mut config = LayoutConfig::default();
        let auto = run(&boundary, &[], &config);
        assert_eq!(auto.tables.len(), 6);
        assert_eq!(auto.rotation, Rotation::Deg90);

        config.layout_mode = LayoutMode::Horizontal;
        assert_eq!(run(&boundary, &[], &config).tables.len(), 4);
        config.layout_mode = LayoutMode::Vertical;
        assert_eq!(run(&boundary, &[], &config).tables.len(), 6);
    }

    #[test]
    fn test_mixed_without_obstacles_is_auto() {
        let boundary = Polygon::rectangle(0.0, 0.0, 10000.0, 15000.0);
        let config = LayoutConfig {
            layout_mode: LayoutMode::Mixed,
            ..Default::default()
        };
        let fill = run(&boundary, &[], &config);
        assert_eq!(fill.tables.len(), 6);
        assert_eq!(fill.rotation, Rotation::Deg90);
        assert!(fill.tables.iter().all(|t| t.rotation == Rotation::Deg90));
    }

    #[test]
    fn test_mixed_splits_around_obstacles() {
        let boundary = Polygon::rectangle(0.0, 0.0, 10000.0, 15000.0);
        let obstacles = [Obstacle::new(Point::new(3000.0, 5000.0), Size::new(400.0, 400.0))];
        let config = LayoutConfig {
            layout_mode: LayoutMode::Mixed,
            ..Default::default()
        };
        let fill = run(&boundary, &obstacles, &config);
        let placed: Vec<(f64, f64, Rotation)> = fill.tables.iter().map(|t| (t.x, t.y, t.rotation)).collect();
        // (4450, 7500) is 1250 from the obstacle on X.
        assert_eq!(
            placed,
            vec![(1500.0, 1500.0, Rotation::Deg0), (1500.0, 7500.0, Rotation::Deg90)]
        );
        assert_layout_valid(&boundary, &obstacles, &fill.tables, &config);
    }

    #[test]
    fn test_obstacle_bands() {
        let boundary = Polygon::rectangle(0.0, 0.0, 10000.0, 15000.0);
        let obstacles = [Obstacle::new(Point::new(3000.0, 5000.0), Size::new(400.0, 400.0))];
        let config = LayoutConfig {
            table_distance: 700.0,
            ..Default::default()
        };
        let region = UsableRegion::build(&boundary, &obstacles, &config);
        let validator = PlacementValidator::new(&region, &config);
        let strategy = GridStrategy::new(validator, config.table_distance, config.layout_mode);

        assert_eq!(strategy.solve().tables.len(), 7);
        let bands = strategy.obstacle_bands();
        assert_eq!(bands.tables.len(), 8);
        assert_eq!(bands.rotation, Rotation::Deg0);
        // Two tables above the obstacle band, three rows of two from y = 6700.
        let rows: Vec<f64> = bands.tables.iter().map(|t| t.y).collect();
        assert_eq!(rows, vec![1500.0, 1500.0, 6700.0, 6700.0, 8950.0, 8950.0, 11200.0, 11200.0]);
        assert_layout_valid(&boundary, &obstacles, &bands.tables, &config);
    }

    #[test]
    fn test_obstacle_bands_without_obstacles_is_horizontal() {
        let boundary = Polygon::rectangle(0.0, 0.0, 10000.0, 15000.0);
        let config = LayoutConfig::default();
        let region = UsableRegion::build(&boundary, &[], &config);
        let validator = PlacementValidator::new(&region, &config);
        let bands = GridStrategy::new(validator, config.table_distance, config.layout_mode).obstacle_bands();
        assert_eq!(bands.tables.len(), 4);
        assert!(bands.tables.iter().all(|t| t.rotation == Rotation::Deg0));
    }

    #[test]
    fn test_collapsed_region_places_nothing() {
        let boundary = Polygon::rectangle(0.0, 0.0, 2000.0, 2000.0);
        let fill = run(&boundary, &[], &LayoutConfig::default());
        assert!(fill.tables.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let boundary = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(18000.0, 0.0),
            Point::new(18000.0, 9000.0),
            Point::new(9000.0, 9000.0),
            Point::new(9000.0, 16000.0),
            Point::new(0.0, 16000.0),
        ]);
        let obstacles = [Obstacle::new(Point::new(4000.0, 4000.0), Size::new(500.0, 500.0))];
        let config = LayoutConfig::default();
        let a = run(&boundary, &obstacles, &config);
        let b = run(&boundary, &obstacles, &config);
        assert_eq!(a.tables, b.tables);
        assert_layout_valid(&boundary, &obstacles, &a.tables, &config);
    }

    #[test]
    fn test_larger_clearances_never_add_tables() {
        let boundaries = [
            Polygon::rectangle(0.0, 0.0, 7000.0, 10000.0),
            Polygon::rectangle(0.0, 0.0, 10000.0, 15000.0),
            Polygon::rectangle(0.0, 0.0, 20000.0, 12000.0),
        ];
        for boundary in &boundaries {
            let mut previous = usize::MAX;
            for wall in [0.0, 500.0, 1000.0, 1500.0, 2000.0, 3000.0] {
                let config = LayoutConfig {
                    wall_distance: wall,
                    ..Default::default()
                };
                let count = run(boundary, &[], &config).tables.len();
                assert!(count <= previous, "wall {wall}: {count} > {previous}");
                previous = count;
            }

            let mut previous = usize::MAX;
            for gap in [0.0, 700.0, 1400.0, 2000.0, 3500.0] {
                let config = LayoutConfig {
                    table_distance: gap,
                    ..Default::default()
                };
                let count = run(boundary, &[], &config).tables.len();
                assert!(count <= previous, "table gap {gap}: {count} > {previous}");
                previous = count;
            }
        }
    }
}
