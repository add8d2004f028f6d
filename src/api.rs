//! JSON payloads shared by the CLI and the HTTP server.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::solver::Solver;
use crate::types::{LayoutResult, LayoutStats, Obstacle, Point, Polygon, Rotation, Size, Table};
use crate::validator::{self, Violation};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObstacleRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub center: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl ObstacleRequest {
    /// Circles are reduced to their bounding square.
    pub fn to_obstacle(&self, index: usize) -> Result<Obstacle> {
        let center = Point::from(self.center);
        match self.kind.as_deref() {
            Some("rectangle") => {
                let [w, h] = self.size.ok_or_else(|| {
                    LayoutError::InvalidObstacle(format!("obstacle {index} is missing its size"))
                })?;
                Ok(Obstacle::new(center, Size::new(w, h)))
            }
            Some("circle") => {
                let radius = self.radius.ok_or_else(|| {
                    LayoutError::InvalidObstacle(format!("obstacle {index} is missing its radius"))
                })?;
                Ok(Obstacle::new(center, Size::new(radius * 2.0, radius * 2.0)))
            }
            Some(other) => Err(LayoutError::InvalidObstacle(format!(
                "obstacle {index} has unsupported type '{other}', expected rectangle or circle"
            ))),
            None => Err(LayoutError::InvalidObstacle(format!(
                "obstacle {index} is missing its type"
            ))),
        }
    }
}

fn build_boundary(points: &[[f64; 2]]) -> Polygon {
    Polygon::new(points.iter().copied().map(Point::from).collect())
}

fn build_obstacles(obstacles: &[ObstacleRequest]) -> Result<Vec<Obstacle>> {
    obstacles
        .iter()
        .enumerate()
        .map(|(i, o)| o.to_obstacle(i))
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptimizeRequest {
    pub boundary: Vec<[f64; 2]>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleRequest>,
    #[serde(default)]
    pub config: LayoutConfig,
}

impl OptimizeRequest {
    pub fn solver(&self) -> Result<Solver> {
        Ok(Solver::new(
            build_boundary(&self.boundary),
            build_obstacles(&self.obstacles)?,
            self.config.clone(),
        ))
    }
}

/// A placed table as reported to callers, numbered from 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableResponse {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: u32,
}

impl TableResponse {
    fn new(index: usize, table: &Table) -> Self {
        Self {
            index: index + 1,
            x: table.x,
            y: table.y,
            width: table.width,
            height: table.height,
            rotation: table.rotation.degrees(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    pub success: bool,
    pub count: usize,
    pub tables: Vec<TableResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<LayoutStats>,
    /// Wall-clock seconds spent in the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OptimizeResponse {
    pub fn from_result(result: &LayoutResult, seconds: f64) -> Self {
        Self {
            success: true,
            count: result.count(),
            tables: result
                .tables
                .iter()
                .enumerate()
                .map(|(i, t)| TableResponse::new(i, t))
                .collect(),
            stats: Some(result.stats),
            optimization_time: Some(seconds),
            error: None,
        }
    }

    pub fn failure(error: &LayoutError) -> Self {
        Self::failure_message(&error.to_string())
    }

    pub fn failure_message(message: &str) -> Self {
        Self {
            success: false,
            count: 0,
            tables: Vec::new(),
            stats: None,
            optimization_time: None,
            error: Some(message.to_string()),
        }
    }
}

/// Runs one optimization request end to end.
pub fn optimize(request: &OptimizeRequest) -> Result<OptimizeResponse> {
    let solver = request.solver()?;
    let start = Instant::now();
    let result = solver.solve()?;
    Ok(OptimizeResponse::from_result(&result, start.elapsed().as_secs_f64()))
}

/// A table submitted for auditing. Missing dimensions fall back to the
/// configured table size.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableRequest {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub rotation: f64,
}

impl TableRequest {
    fn to_table(&self, index: usize, config: &LayoutConfig) -> Result<Table> {
        let rotation = Rotation::from_degrees(self.rotation).ok_or_else(|| {
            LayoutError::InvalidTable(format!(
                "table {index} has rotation {}, expected a whole multiple of 90 degrees",
                self.rotation
            ))
        })?;
        let size = Size::new(
            self.width.unwrap_or(config.table_width),
            self.height.unwrap_or(config.table_height),
        );
        if !(size.w > 0.0 && size.h > 0.0 && self.x.is_finite() && self.y.is_finite()) {
            return Err(LayoutError::InvalidTable(format!(
                "table {index} must have a finite position and positive size"
            )));
        }
        Ok(Table::new(self.x, self.y, size, rotation))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidateRequest {
    pub boundary: Vec<[f64; 2]>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleRequest>,
    #[serde(default)]
    pub tables: Vec<TableRequest>,
    #[serde(default)]
    pub config: LayoutConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub valid: bool,
    pub violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidateResponse {
    pub fn failure(error: &LayoutError) -> Self {
        Self {
            success: false,
            valid: false,
            violations: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Audits a caller-supplied layout against the same constraints the
/// strategies enforce.
pub fn validate(request: &ValidateRequest) -> Result<ValidateResponse> {
    let solver = Solver::new(
        build_boundary(&request.boundary),
        build_obstacles(&request.obstacles)?,
        request.config.clone(),
    );
    solver.validate()?;

    let tables = request
        .tables
        .iter()
        .enumerate()
        .map(|(i, t)| t.to_table(i, solver.config()))
        .collect::<Result<Vec<_>>>()?;

    let violations =
        validator::audit_layout(solver.boundary(), solver.obstacles(), &tables, solver.config());
    Ok(ValidateResponse {
        success: true,
        valid: violations.is_empty(),
        violations,
        error: None,
    })
}
