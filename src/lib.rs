pub mod api;
pub mod candidates;
pub mod config;
pub mod enhanced;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod region;
pub mod render;
pub mod scoring;
pub mod search;
pub mod solver;
pub mod types;
pub mod validator;

pub use config::{Algorithm, LayoutConfig, LayoutMode};
pub use error::{LayoutError, Result};
pub use solver::Solver;
