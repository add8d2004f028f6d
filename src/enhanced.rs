use std::cmp::Ordering;

use crate::candidates::{Candidate, CandidateScan, ScanOrder, tidy};
use crate::config::{LayoutConfig, LayoutMode};
use crate::geometry::EPSILON;
use crate::grid::{GridFill, GridStrategy};
use crate::scoring;
use crate::types::{Rotation, Table};
use crate::validator::PlacementValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    GridFill,
    AlignedFill,
    FineFill,
    Done,
}

/// Starting grids. `Auto` tries both pure orientations, and with obstacles
/// also the mixed split and the bands around the obstacles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seed {
    Grid(LayoutMode),
    ObstacleBands,
}

/// Grid fill followed by gap filling, run from several seed grids with the
/// best result kept.
///
/// Gap filling first tries positions at exactly `table_distance` from the
/// tables already placed, then falls back to a fine sweep over the region.
/// Both passes try the alternate orientation before the base one at every
/// position, and repeat until a fine sweep adds nothing.
pub struct EnhancedStrategy<'a> {
    validator: PlacementValidator<'a>,
    config: &'a LayoutConfig,
}

impl<'a> EnhancedStrategy<'a> {
    pub fn new(validator: PlacementValidator<'a>, config: &'a LayoutConfig) -> Self {
        Self { validator, config }
    }

    pub fn solve(&self) -> Vec<Table> {
        let area = self.validator.region().boundary_area();
        let mut best: Vec<Table> = Vec::new();
        for seed in self.seeds() {
            let tables = self.run(seed);
            tracing::debug!(?seed, count = tables.len(), "seed filled");
            if scoring::compare(&tables, &best, area) == Ordering::Greater {
                best = tables;
            }
        }
        best
    }

    fn seeds(&self) -> Vec<Seed> {
        match self.config.layout_mode {
            LayoutMode::Auto => {
                let mut seeds = vec![
                    Seed::Grid(LayoutMode::Horizontal),
                    Seed::Grid(LayoutMode::Vertical),
                ];
                if !self.validator.region().obstacles().is_empty() {
                    seeds.extend([Seed::Grid(LayoutMode::Mixed), Seed::ObstacleBands]);
                }
                seeds
            }
            mode => vec![Seed::Grid(mode)],
        }
    }

    fn run(&self, seed: Seed) -> Vec<Table> {
        let mut tables = Vec::new();
        let mut base = Rotation::Deg0;
        let mut phase = Phase::GridFill;

        loop {
            phase = match phase {
                Phase::GridFill => {
                    let fill = self.grid(seed);
                    tables = fill.tables;
                    base = fill.rotation;
                    Phase::AlignedFill
                }
                Phase::AlignedFill => {
                    if self.aligned(base, &mut tables) == 0 {
                        Phase::FineFill
                    } else {
                        Phase::AlignedFill
                    }
                }
                Phase::FineFill => {
                    let added = self.sweep(base, &mut tables);
                    tracing::debug!(added, "gap fill sweep");
                    if added == 0 {
                        Phase::Done
                    } else {
                        Phase::AlignedFill
                    }
                }
                Phase::Done => break,
            };
        }

        tables
    }

    fn grid(&self, seed: Seed) -> GridFill {
        match seed {
            Seed::Grid(mode) => GridStrategy::new(self.validator, self.config.table_distance, mode).solve(),
            Seed::ObstacleBands => {
                GridStrategy::new(self.validator, self.config.table_distance, LayoutMode::Auto)
                    .obstacle_bands()
            }
        }
    }

    /// Tries every position flush with the region origin or at exactly
    /// `table_distance` beside, above or below a placed table, in row-major
    /// order. Returns how many tables were added.
    fn aligned(&self, base: Rotation, tables: &mut Vec<Table>) -> usize {
        let Some(bounds) = self.validator.region().bounds() else {
            return 0;
        };
        let gap = self.config.table_distance;
        let nominal = self.validator.nominal();

        let mut candidates: Vec<(usize, Candidate)> = Vec::new();
        for (rank, rotation) in [base.alternate(), base].into_iter().enumerate() {
            let size = rotation.apply(nominal);
            let mut xs = vec![tidy(bounds.x)];
            let mut ys = vec![tidy(bounds.y)];
            for t in tables.iter() {
                let r = t.footprint();
                xs.extend([tidy(r.x), tidy(r.max_x() + gap), tidy(r.x - gap - size.w)]);
                ys.extend([tidy(r.y), tidy(r.max_y() + gap), tidy(r.y - gap - size.h)]);
            }
            for axis in [&mut xs, &mut ys] {
                axis.sort_by(f64::total_cmp);
                axis.dedup();
            }

            for &y in &ys {
                for &x in &xs {
                    if x >= bounds.x - EPSILON
                        && y >= bounds.y - EPSILON
                        && x + size.w <= bounds.max_x() + EPSILON
                        && y + size.h <= bounds.max_y() + EPSILON
                    {
                        candidates.push((rank, Candidate { x, y, rotation }));
                    }
                }
            }
        }

        candidates.sort_by(|(ra, a), (rb, b)| {
            a.y.total_cmp(&b.y)
                .then(a.x.total_cmp(&b.x))
                .then(ra.cmp(rb))
        });
        self.validator.fill(candidates.into_iter().map(|(_, c)| c), tables)
    }

    /// One fine sweep over the region. At each anchor the alternate
    /// orientation is tried before the base one.
    fn sweep(&self, base: Rotation, tables: &mut Vec<Table>) -> usize {
        let Some(bounds) = self.validator.region().bounds() else {
            return 0;
        };
        let scan = CandidateScan::uniform(
            bounds,
            self.validator.nominal(),
            self.config.fine_scan_step,
            ScanOrder::RowMajor,
            &[base.alternate(), base],
            self.config.alignment_tolerance,
        );
        self.validator.fill(scan, tables)
    }
}
