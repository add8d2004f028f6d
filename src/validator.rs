use serde::Serialize;

use crate::candidates::Candidate;
use crate::config::LayoutConfig;
use crate::geometry::{self, EPSILON};
use crate::region::UsableRegion;
use crate::types::{Obstacle, Polygon, Rect, Size, Table};

/// Tolerance used when auditing finished layouts (mm).
pub const AUDIT_TOLERANCE: f64 = 1e-3;

/// Accept/reject test for candidate placements against a usable region and
/// the tables placed so far.
#[derive(Debug, Clone, Copy)]
pub struct PlacementValidator<'a> {
    region: &'a UsableRegion,
    nominal: Size,
    table_distance: f64,
}

impl<'a> PlacementValidator<'a> {
    pub fn new(region: &'a UsableRegion, config: &LayoutConfig) -> Self {
        Self {
            region,
            nominal: config.table_size(),
            table_distance: config.table_distance,
        }
    }

    pub fn region(&self) -> &'a UsableRegion {
        self.region
    }

    pub fn nominal(&self) -> Size {
        self.nominal
    }

    pub fn accepts(&self, rect: &Rect, placed: &[Table]) -> bool {
        self.region.clear_of_obstacles(rect)
            && placed.iter().all(|t| {
                geometry::clearance(rect, &t.footprint()) >= self.table_distance - EPSILON
            })
            && self.region.contains(rect)
    }

    /// Appends the candidate as a new table when it is valid. Rejection has
    /// no side effects.
    pub fn try_place(&self, candidate: Candidate, placed: &mut Vec<Table>) -> bool {
        if self.accepts(&candidate.footprint(self.nominal), placed) {
            placed.push(candidate.into_table(self.nominal));
            true
        } else {
            false
        }
    }

    /// Places every acceptable candidate in order, returning how many were added.
    pub fn fill(&self, candidates: impl Iterator<Item = Candidate>, placed: &mut Vec<Table>) -> usize {
        let before = placed.len();
        for candidate in candidates {
            self.try_place(candidate, placed);
        }
        placed.len() - before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    WallDistance,
    TableDistance,
    ObstacleDistance,
}

#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub description: String,
    pub severity: &'static str,
    /// Zero-based indices of the tables involved.
    pub tables: Vec<usize>,
}

/// Lists every constraint an arbitrary layout breaks.
///
/// Wall clearance is measured directly against the boundary outline, so the
/// audit does not depend on how the usable region was eroded.
pub fn audit_layout(
    boundary: &Polygon,
    obstacles: &[Obstacle],
    tables: &[Table],
    config: &LayoutConfig,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let footprints: Vec<Rect> = tables.iter().map(Table::footprint).collect();

    for (i, rect) in footprints.iter().enumerate() {
        if !geometry::rect_fully_inside(rect, boundary) {
            violations.push(Violation {
                kind: ViolationKind::WallDistance,
                description: format!("table {i} extends outside the boundary"),
                severity: "error",
                tables: vec![i],
            });
            continue;
        }
        let wall = geometry::rect_outline_distance(rect, boundary);
        if wall < config.wall_distance - AUDIT_TOLERANCE {
            violations.push(Violation {
                kind: ViolationKind::WallDistance,
                description: format!(
                    "table {i} is {wall:.0}mm from the wall, {}mm required",
                    config.wall_distance
                ),
                severity: "error",
                tables: vec![i],
            });
        }
    }

    for i in 0..footprints.len() {
        for j in (i + 1)..footprints.len() {
            let gap = geometry::clearance(&footprints[i], &footprints[j]);
            if gap < config.table_distance - AUDIT_TOLERANCE {
                violations.push(Violation {
                    kind: ViolationKind::TableDistance,
                    description: format!(
                        "tables {i} and {j} are {gap:.0}mm apart, {}mm required",
                        config.table_distance
                    ),
                    severity: "error",
                    tables: vec![i, j],
                });
            }
        }
    }

    let required = config.obstacle_clearance();
    for (i, rect) in footprints.iter().enumerate() {
        for (k, obstacle) in obstacles.iter().enumerate() {
            let gap = geometry::clearance(rect, &obstacle.footprint());
            if gap < required - AUDIT_TOLERANCE {
                violations.push(Violation {
                    kind: ViolationKind::ObstacleDistance,
                    description: format!(
                        "table {i} is {gap:.0}mm from obstacle {k}, {required}mm required"
                    ),
                    severity: "error",
                    tables: vec![i],
                });
            }
        }
    }

    violations
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{Point, Rotation};

    /// Panics with every violation when the layout breaks a constraint.
    pub(crate) fn assert_layout_valid(
        boundary: &Polygon,
        obstacles: &[Obstacle],
        tables: &[Table],
        config: &LayoutConfig,
    ) {
        let violations = audit_layout(boundary, obstacles, tables, config);
        assert!(
            violations.is_empty(),
            "layout of {} tables has violations: {:#?}",
            tables.len(),
            violations
        );
    }

    fn setup() -> (Polygon, UsableRegion, LayoutConfig) {
        let boundary = Polygon::rectangle(0.0, 0.0, 10000.0, 15000.0);
        let config = LayoutConfig::default();
        let obstacle = Obstacle::new(Point::new(3000.0, 5000.0), Size::new(400.0, 400.0));
        let region = UsableRegion::build(&boundary, &[obstacle], &config);
        (boundary, region, config)
    }

    #[test]
    fn test_try_place_appends_only_on_accept() {
        let (_, region, config) = setup();
        let validator = PlacementValidator::new(&region, &config);
        let mut placed = Vec::new();

        let first = Candidate { x: 1500.0, y: 1500.0, rotation: Rotation::Deg0 };
        assert!(validator.try_place(first, &mut placed));
        assert_eq!(placed.len(), 1);

        // 1000mm below the first table.
        let close = Candidate { x: 1500.0, y: 4050.0, rotation: Rotation::Deg0 };
        assert!(!validator.try_place(close, &mut placed));
        assert_eq!(placed.len(), 1);

        // Overlaps the obstacle's clearance zone.
        let near_obstacle = Candidate { x: 4450.0, y: 4450.0, rotation: Rotation::Deg0 };
        assert!(!validator.try_place(near_obstacle, &mut placed));

        // Outside the eroded boundary.
        let near_wall = Candidate { x: 6000.0, y: 10000.0, rotation: Rotation::Deg0 };
        assert!(!validator.try_place(near_wall, &mut placed));

        let far = Candidate { x: 1500.0, y: 10000.0, rotation: Rotation::Deg0 };
        assert!(validator.try_place(far, &mut placed));
        assert_eq!(placed.len(), 2);
    }

    #[test]
    fn test_exact_spacing_is_accepted() {
        let (_, region, config) = setup();
        let validator = PlacementValidator::new(&region, &config);
        let mut placed = vec![Table::new(1500.0, 7000.0, config.table_size(), Rotation::Deg0)];
        let rect = Rect::new(1500.0, 7000.0 + 1550.0 + 1400.0, 2850.0, 1550.0);
        assert!(validator.accepts(&rect, &placed));
        let rect = Rect::new(1500.0 + 2850.0 + 1399.0, 7000.0, 1550.0, 2850.0);
        assert!(!validator.accepts(&rect, &placed));
        placed.clear();
        assert!(validator.accepts(&rect, &placed));
    }

    #[test]
    fn test_audit_reports_each_kind() {
        let (boundary, _, config) = setup();
        let obstacle = Obstacle::new(Point::new(3000.0, 5000.0), Size::new(400.0, 400.0));
        let nominal = config.table_size();
        let tables = vec![
            Table::new(500.0, 10000.0, nominal, Rotation::Deg0),
            Table::new(5000.0, 10000.0, nominal, Rotation::Deg0),
            Table::new(5000.0, 12000.0, nominal, Rotation::Deg0),
            Table::new(3000.0, 5500.0, nominal, Rotation::Deg0),
        ];
        let violations = audit_layout(&boundary, &[obstacle], &tables, &config);
        let kinds: Vec<ViolationKind> = violations.iter().map(|v| v.kind).collect();
        assert!(kinds.contains(&ViolationKind::WallDistance));
        assert!(kinds.contains(&ViolationKind::TableDistance));
        assert!(kinds.contains(&ViolationKind::ObstacleDistance));
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::TableDistance && v.tables == vec![1, 2]));
    }

    #[test]
    fn test_audit_accepts_valid_layout() {
        let (boundary, _, config) = setup();
        let nominal = config.table_size();
        let tables = vec![
            Table::new(1500.0, 1500.0, nominal, Rotation::Deg0),
            Table::new(5750.0, 1500.0, nominal, Rotation::Deg90),
            Table::new(5750.0, 5750.0, nominal, Rotation::Deg90),
        ];
        assert_layout_valid(&boundary, &[], &tables, &config);
    }

    #[test]
    fn test_audit_flags_table_outside_boundary() {
        let boundary = Polygon::rectangle(0.0, 0.0, 5000.0, 5000.0);
        let config = LayoutConfig::default();
        let tables = vec![Table::new(4000.0, 1500.0, config.table_size(), Rotation::Deg0)];
        let violations = audit_layout(&boundary, &[], &tables, &config);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::WallDistance);
    }
}
