use std::cmp::Ordering;

use crate::geometry;
use crate::types::{LayoutStats, Table};

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Percentage of the boundary covered by table footprints, unrounded.
pub fn utilization(tables: &[Table], boundary_area: f64) -> f64 {
    if boundary_area <= 0.0 {
        return 0.0;
    }
    tables.iter().map(Table::area).sum::<f64>() / boundary_area * 100.0
}

/// Mean over tables of the clearance to their nearest neighbour.
pub fn average_distance(tables: &[Table]) -> f64 {
    if tables.len() < 2 {
        return 0.0;
    }
    let footprints: Vec<_> = tables.iter().map(Table::footprint).collect();
    let total: f64 = footprints
        .iter()
        .enumerate()
        .map(|(i, a)| {
            footprints
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, b)| geometry::clearance(a, b))
                .fold(f64::INFINITY, f64::min)
        })
        .sum();
    total / footprints.len() as f64
}

/// Lexicographic `(table_count, utilization)` ordering of two layouts.
pub fn compare(a: &[Table], b: &[Table], boundary_area: f64) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| {
        utilization(a, boundary_area)
            .partial_cmp(&utilization(b, boundary_area))
            .unwrap_or(Ordering::Equal)
    })
}

pub fn stats(tables: &[Table], boundary_area: f64, algorithm_used: &'static str) -> LayoutStats {
    LayoutStats {
        table_count: tables.len(),
        total_area: round_to(boundary_area / 1_000_000.0, 2),
        space_utilization: round_to(utilization(tables, boundary_area), 2),
        average_distance: round_to(average_distance(tables), 0),
        algorithm_used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rotation, Size};

    const TABLE: Size = Size { w: 2850.0, h: 1550.0 };

    #[test]
    fn test_stats_two_tables() {
        let tables = vec![
            Table::new(1500.0, 1500.0, TABLE, Rotation::Deg0),
            Table::new(1500.0, 4450.0, TABLE, Rotation::Deg0),
        ];
        let stats = stats(&tables, 70_000_000.0, "regular");
        assert_eq!(stats.table_count, 2);
        assert_eq!(stats.total_area, 70.0);
        assert_eq!(stats.space_utilization, 12.62);
        assert_eq!(stats.average_distance, 1400.0);
        assert_eq!(stats.algorithm_used, "regular");
    }

    #[test]
    fn test_average_uses_nearest_neighbour() {
        let tables = vec![
            Table::new(0.0, 0.0, TABLE, Rotation::Deg0),
            Table::new(0.0, 3000.0, TABLE, Rotation::Deg0),
            Table::new(0.0, 10000.0, TABLE, Rotation::Deg0),
        ];
        // Nearest gaps: 1450, 1450, 5450.
        assert!((average_distance(&tables) - 8350.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_layout() {
        let stats = stats(&[], 4_000_000.0, "enhanced");
        assert_eq!(stats.table_count, 0);
        assert_eq!(stats.space_utilization, 0.0);
        assert_eq!(stats.average_distance, 0.0);
        assert_eq!(stats.total_area, 4.0);
        assert_eq!(utilization(&[], 0.0), 0.0);
    }

    #[test]
    fn test_compare_prefers_count() {
        let one = vec![Table::new(0.0, 0.0, TABLE, Rotation::Deg0)];
        let two = vec![
            Table::new(0.0, 0.0, TABLE, Rotation::Deg0),
            Table::new(5000.0, 0.0, TABLE, Rotation::Deg90),
        ];
        assert_eq!(compare(&two, &one, 1e8), Ordering::Greater);
        assert_eq!(compare(&one, &two, 1e8), Ordering::Less);
        assert_eq!(compare(&one, &one, 1e8), Ordering::Equal);
    }
}
