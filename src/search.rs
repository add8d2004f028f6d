use std::cmp::Ordering;

use rand::Rng;

use crate::candidates::{self, Candidate, CandidateScan, ScanOrder};
use crate::config::LayoutConfig;
use crate::geometry::EPSILON;
use crate::grid::GridStrategy;
use crate::scoring;
use crate::types::{Rect, Rotation, Table};
use crate::validator::PlacementValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seed {
    Grid,
    Sweep(ScanOrder, [Rotation; 2]),
}

const SEEDS: [Seed; 4] = [
    Seed::Grid,
    Seed::Sweep(ScanOrder::RowMajor, [Rotation::Deg0, Rotation::Deg90]),
    Seed::Sweep(ScanOrder::ColumnMajor, [Rotation::Deg90, Rotation::Deg0]),
    Seed::Sweep(ScanOrder::CornerFirst, [Rotation::Deg0, Rotation::Deg90]),
];

/// Multi-seed ruin-and-recreate search: every seed layout goes through
/// rounds of random removal, compaction and greedy reinsertion, and the
/// best layout by `(count, utilization)` over all seeds and rounds wins.
pub struct TraditionalSearch<'a> {
    validator: PlacementValidator<'a>,
    config: &'a LayoutConfig,
}

impl<'a> TraditionalSearch<'a> {
    pub fn new(validator: PlacementValidator<'a>, config: &'a LayoutConfig) -> Self {
        Self { validator, config }
    }

    pub fn solve<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Table> {
        let Some(bounds) = self.validator.region().bounds() else {
            return Vec::new();
        };
        let area = self.validator.region().boundary_area();

        let mut best: Vec<Table> = Vec::new();
        for seed in SEEDS {
            let mut current = self.seed_layout(seed, bounds);
            tracing::debug!(?seed, count = current.len(), "seed layout");
            if scoring::compare(&current, &best, area) == Ordering::Greater {
                best = current.clone();
            }

            for round in 0..self.config.max_iterations {
                let Some(trial) = self.perturb(&current, bounds, rng) else {
                    break;
                };
                if scoring::compare(&trial, &current, area) != Ordering::Less {
                    current = trial;
                }
                if scoring::compare(&current, &best, area) == Ordering::Greater {
                    tracing::debug!(?seed, round, count = current.len(), "search improved");
                    best = current.clone();
                }
            }
        }

        best
    }

    fn seed_layout(&self, seed: Seed, bounds: Rect) -> Vec<Table> {
        match seed {
            Seed::Grid => GridStrategy::new(
                self.validator,
                self.config.table_distance,
                self.config.layout_mode,
            )
            .solve()
            .tables,
            Seed::Sweep(order, rotations) => {
                let mut tables = Vec::new();
                let scan = CandidateScan::uniform(
                    bounds,
                    self.validator.nominal(),
                    self.config.grid_size,
                    order,
                    &rotations,
                    self.config.alignment_tolerance,
                );
                self.validator.fill(scan, &mut tables);
                tables
            }
        }
    }

    fn removal_count(&self, len: usize) -> usize {
        if len == 0 || self.config.remove_ratio <= 0.0 {
            return 0;
        }
        ((len as f64 * self.config.remove_ratio).floor() as usize).clamp(1, len)
    }

    /// One round: drop a random subset, compact the rest, then refill.
    /// `None` when there is nothing to remove.
    fn perturb<R: Rng + ?Sized>(&self, current: &[Table], bounds: Rect, rng: &mut R) -> Option<Vec<Table>> {
        let remove = self.removal_count(current.len());
        if remove == 0 {
            return None;
        }

        let mut doomed = rand::seq::index::sample(rng, current.len(), remove).into_vec();
        doomed.sort_unstable();
        let mut trial: Vec<Table> = current
            .iter()
            .enumerate()
            .filter(|(i, _)| doomed.binary_search(i).is_err())
            .map(|(_, t)| *t)
            .collect();

        self.compact(&mut trial, bounds);
        self.refill(&mut trial, bounds);
        Some(trial)
    }

    /// Slides every table up, then left, in `compression_step` moves while
    /// it stays valid. Tables nearest the origin move first.
    fn compact(&self, tables: &mut [Table], bounds: Rect) {
        let step = self.config.compression_step;
        let tolerance = self.config.alignment_tolerance;

        let mut order: Vec<usize> = (0..tables.len()).collect();
        order.sort_by(|&a, &b| {
            (tables[a].y, tables[a].x)
                .partial_cmp(&(tables[b].y, tables[b].x))
                .unwrap_or(Ordering::Equal)
        });

        for i in order {
            let mut others: Vec<Table> = tables.to_vec();
            let table = others.remove(i);
            let mut at = Candidate {
                x: table.x,
                y: table.y,
                rotation: table.rotation,
            };

            loop {
                let up = Candidate {
                    y: candidates::snap(at.y - step, bounds.y, tolerance),
                    ..at
                };
                let left = Candidate {
                    x: candidates::snap(at.x - step, bounds.x, tolerance),
                    ..at
                };
                let next = [(up, up.y < at.y - EPSILON), (left, left.x < at.x - EPSILON)]
                    .into_iter()
                    .find(|(c, moved)| {
                        *moved
                            && self
                                .validator
                                .accepts(&c.footprint(self.validator.nominal()), &others)
                    });
                match next {
                    Some((c, _)) => at = c,
                    None => break,
                }
            }

            if at.x != table.x || at.y != table.y {
                tables[i] = at.into_table(self.validator.nominal());
            }
        }
    }

    /// Greedy reinsertion at each configured step size, coarse to fine.
    fn refill(&self, tables: &mut Vec<Table>, bounds: Rect) {
        let steps: &[f64] = if self.config.grid_search_sizes.is_empty() {
            std::slice::from_ref(&self.config.grid_size)
        } else {
            &self.config.grid_search_sizes
        };
        for &step in steps {
            let scan = CandidateScan::uniform(
                bounds,
                self.validator.nominal(),
                step,
                ScanOrder::RowMajor,
                &[Rotation::Deg0, Rotation::Deg90],
                self.config.alignment_tolerance,
            );
            self.validator.fill(scan, tables);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::UsableRegion;
    use crate::types::{Obstacle, Point, Polygon, Size};
    use crate::validator::tests::assert_layout_valid;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn run(boundary: &Polygon, obstacles: &[Obstacle], config: &LayoutConfig, seed: u64) -> Vec<Table> {
        let region = UsableRegion::build(boundary, obstacles, config);
        let validator = PlacementValidator::new(&region, config);
        let mut rng = StdRng::seed_from_u64(seed);
        TraditionalSearch::new(validator, config).solve(&mut rng)
    }

    fn grid_count(boundary: &Polygon, obstacles: &[Obstacle], config: &LayoutConfig) -> usize {
        let region = UsableRegion::build(boundary, obstacles, config);
        let validator = PlacementValidator::new(&region, config);
        GridStrategy::new(validator, config.table_distance, config.layout_mode)
            .solve()
            .tables
            .len()
    }

    #[test]
    fn test_at_least_grid_count() {
        let boundary = Polygon::rectangle(0.0, 0.0, 10000.0, 15000.0);
        let obstacles = [Obstacle::new(Point::new(3000.0, 5000.0), Size::new(400.0, 400.0))];
        let config = LayoutConfig::default();
        let tables = run(&boundary, &obstacles, &config, 7);
        assert!(tables.len() >= grid_count(&boundary, &obstacles, &config));
        assert_layout_valid(&boundary, &obstacles, &tables, &config);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let boundary = Polygon::rectangle(0.0, 0.0, 14000.0, 11000.0);
        let obstacles = [Obstacle::new(Point::new(7000.0, 5500.0), Size::new(500.0, 500.0))];
        let config = LayoutConfig {
            max_iterations: 5,
            ..Default::default()
        };
        let a = run(&boundary, &obstacles, &config, 99);
        let b = run(&boundary, &obstacles, &config, 99);
        assert_eq!(a, b);
        assert_layout_valid(&boundary, &obstacles, &a, &config);
    }

    #[test]
    fn test_no_removal_keeps_best_seed() {
        let boundary = Polygon::rectangle(0.0, 0.0, 14000.0, 8000.0);
        let config = LayoutConfig {
            remove_ratio: 0.0,
            ..Default::default()
        };
        let tables = run(&boundary, &[], &config, 1);
        assert!(tables.len() >= grid_count(&boundary, &[], &config));
        assert_layout_valid(&boundary, &[], &tables, &config);
    }

    #[test]
    fn test_compact_moves_toward_origin() {
        let boundary = Polygon::rectangle(0.0, 0.0, 10000.0, 15000.0);
        let config = LayoutConfig::default();
        let region = UsableRegion::build(&boundary, &[], &config);
        let validator = PlacementValidator::new(&region, &config);
        let search = TraditionalSearch::new(validator, &config);
        let bounds = region.bounds().unwrap();

        let mut tables = vec![
            Table::new(3000.0, 6000.0, config.table_size(), Rotation::Deg0),
            Table::new(3000.0, 9500.0, config.table_size(), Rotation::Deg0),
        ];
        search.compact(&mut tables, bounds);
        assert_eq!((tables[0].x, tables[0].y), (1500.0, 1500.0));
        assert_eq!((tables[1].x, tables[1].y), (1500.0, 4450.0));
        assert_layout_valid(&boundary, &[], &tables, &config);
    }

    #[test]
    fn test_l_shaped_room_valid() {
        let boundary = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(20000.0, 0.0),
            Point::new(20000.0, 8000.0),
            Point::new(9000.0, 8000.0),
            Point::new(9000.0, 18000.0),
            Point::new(0.0, 18000.0),
        ]);
        let config = LayoutConfig {
            max_iterations: 3,
            ..Default::default()
        };
        let tables = run(&boundary, &[], &config, 3);
        assert_layout_valid(&boundary, &[], &tables, &config);
    }

    #[test]
    fn test_empty_region() {
        let boundary = Polygon::rectangle(0.0, 0.0, 2000.0, 2000.0);
        assert!(run(&boundary, &[], &LayoutConfig::default(), 0).is_empty());
    }
}
