use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("invalid boundary: {0}")]
    InvalidBoundary(String),

    #[error("invalid obstacle: {0}")]
    InvalidObstacle(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid table: {0}")]
    InvalidTable(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
