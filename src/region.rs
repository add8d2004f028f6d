use crate::config::LayoutConfig;
use crate::geometry::{self, EPSILON, Erosion};
use crate::types::{Obstacle, Polygon, Rect};

/// Placeable area: the boundary eroded by the wall clearance, with obstacles
/// excluded by a clearance test rather than by polygon subtraction.
#[derive(Debug, Clone)]
pub struct UsableRegion {
    boundary: Polygon,
    eroded: Erosion,
    bounds: Option<Rect>,
    obstacles: Vec<Rect>,
    obstacle_clearance: f64,
}

impl UsableRegion {
    pub fn build(boundary: &Polygon, obstacles: &[Obstacle], config: &LayoutConfig) -> Self {
        let boundary = geometry::counter_clockwise(boundary);
        let eroded = geometry::erode_polygon(&boundary, config.wall_distance);
        if eroded.is_empty() {
            tracing::warn!(
                wall_distance = config.wall_distance,
                "usable region collapsed after wall erosion"
            );
        }

        let bounds = eroded
            .parts()
            .iter()
            .map(Polygon::bounding_box)
            .reduce(|a, b| {
                let x = a.x.min(b.x);
                let y = a.y.min(b.y);
                Rect::new(x, y, a.max_x().max(b.max_x()) - x, a.max_y().max(b.max_y()) - y)
            });

        Self {
            boundary,
            eroded,
            bounds,
            obstacles: obstacles.iter().map(Obstacle::footprint).collect(),
            obstacle_clearance: config.obstacle_clearance(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.eroded.is_empty()
    }

    pub fn parts(&self) -> &[Polygon] {
        self.eroded.parts()
    }

    /// Bounding box of the eroded boundary, `None` when nothing is left.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Obstacle footprints.
    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    pub fn obstacle_clearance(&self) -> f64 {
        self.obstacle_clearance
    }

    pub fn boundary_area(&self) -> f64 {
        geometry::polygon_area(&self.boundary)
    }

    pub fn contains(&self, rect: &Rect) -> bool {
        let Some(bounds) = self.bounds else {
            return false;
        };
        if rect.x < bounds.x - EPSILON
            || rect.y < bounds.y - EPSILON
            || rect.max_x() > bounds.max_x() + EPSILON
            || rect.max_y() > bounds.max_y() + EPSILON
        {
            return false;
        }
        self.parts()
            .iter()
            .any(|part| geometry::rect_fully_inside(rect, part))
    }

    pub fn clear_of_obstacles(&self, rect: &Rect) -> bool {
        self.obstacles
            .iter()
            .all(|o| geometry::clearance(rect, o) >= self.obstacle_clearance - EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Point, Size};

    #[test]
    fn test_rectangle_region() {
        let boundary = Polygon::rectangle(0.0, 0.0, 7000.0, 10000.0);
        let region = UsableRegion::build(&boundary, &[], &LayoutConfig::default());
        assert!(!region.is_empty());
        assert_eq!(region.boundary_area(), 70_000_000.0);

        assert!(region.contains(&Rect::new(1500.0, 1500.0, 2850.0, 1550.0)));
        assert!(region.contains(&Rect::new(1500.0, 1500.0, 4000.0, 7000.0)));
        assert!(!region.contains(&Rect::new(1400.0, 1500.0, 2850.0, 1550.0)));
        assert!(!region.contains(&Rect::new(3000.0, 7000.0, 2850.0, 1550.0)));
    }

    #[test]
    fn test_collapsed_region() {
        let boundary = Polygon::rectangle(0.0, 0.0, 2000.0, 2000.0);
        let region = UsableRegion::build(&boundary, &[], &LayoutConfig::default());
        assert!(region.is_empty());
        assert!(region.bounds().is_none());
        assert!(!region.contains(&Rect::new(900.0, 900.0, 10.0, 10.0)));
    }

    #[test]
    fn test_obstacle_clearance_defaults_to_wall_distance() {
        let boundary = Polygon::rectangle(0.0, 0.0, 10000.0, 15000.0);
        let obstacle = Obstacle::new(Point::new(3000.0, 5000.0), Size::new(400.0, 400.0));
        let region = UsableRegion::build(&boundary, &[obstacle], &LayoutConfig::default());
        assert_eq!(region.obstacle_clearance(), 1500.0);
        assert_eq!(region.obstacles(), &[Rect::new(2800.0, 4800.0, 400.0, 400.0)]);

        // 1750 below the obstacle, overlapping on X.
        assert!(region.clear_of_obstacles(&Rect::new(1500.0, 1500.0, 2850.0, 1550.0)));
        // 450 above the obstacle.
        assert!(!region.clear_of_obstacles(&Rect::new(1500.0, 1500.0, 1550.0, 2850.0)));

        let config = LayoutConfig {
            obstacle_distance: Some(400.0),
            ..Default::default()
        };
        let region = UsableRegion::build(&boundary, &[obstacle], &config);
        assert!(region.clear_of_obstacles(&Rect::new(1500.0, 1500.0, 1550.0, 2850.0)));
    }
}
