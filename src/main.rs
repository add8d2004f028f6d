use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use table_layout::api::{ObstacleRequest, OptimizeRequest, OptimizeResponse};
use table_layout::render;
use table_layout::types::Size;
use table_layout::{Algorithm, LayoutConfig, LayoutMode};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "table_layout",
    about = "Places billiard tables inside a floor plan with wall, table and obstacle clearances"
)]
struct Cli {
    /// JSON request file with boundary, obstacles and config
    #[arg(long, conflicts_with_all = ["boundary", "obstacles"])]
    input: Option<PathBuf>,

    /// Boundary vertices as X,Y in mm (e.g. 0,0 10000,0 10000,15000 0,15000)
    #[arg(long, num_args = 3.., allow_negative_numbers = true, value_parser = parse_point)]
    boundary: Vec<[f64; 2]>,

    /// Rectangular obstacles as CX,CY:WxH (e.g. 3000,5000:400x400)
    #[arg(long = "obstacle", num_args = 1.., value_parser = parse_obstacle)]
    obstacles: Vec<ObstacleRequest>,

    /// Minimum clearance between tables and walls in mm
    #[arg(long)]
    wall_distance: Option<f64>,

    /// Minimum clearance between tables in mm
    #[arg(long)]
    table_distance: Option<f64>,

    /// Minimum clearance around obstacles in mm (default: wall distance)
    #[arg(long)]
    obstacle_distance: Option<f64>,

    /// Table size as WxH in mm (default: 2850x1550)
    #[arg(long, value_parser = parse_size)]
    table: Option<Size>,

    /// Strategy: regular, enhanced, or traditional
    #[arg(long)]
    algorithm: Option<Algorithm>,

    /// Orientation: auto, horizontal, vertical, or mixed
    #[arg(long)]
    mode: Option<LayoutMode>,

    /// Improvement rounds per seed for the traditional strategy
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Random seed for the traditional strategy
    #[arg(long)]
    seed: Option<u64>,

    /// Print the JSON response instead of a summary
    #[arg(long)]
    json: bool,

    /// Show an ASCII plan of the layout
    #[arg(long)]
    layout: bool,

    /// Log strategy progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_pair(s: &str, sep: char, what: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split(sep).collect();
    if parts.len() != 2 {
        return Err(format!("invalid {} '{}'", what, s));
    }
    let a = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid number in {} '{}'", what, s))?;
    let b = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid number in {} '{}'", what, s))?;
    Ok((a, b))
}

fn parse_point(s: &str) -> Result<[f64; 2], String> {
    let (x, y) = parse_pair(s, ',', "point, expected X,Y")?;
    Ok([x, y])
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = parse_pair(s, 'x', "size, expected WxH")?;
    if w <= 0.0 || h <= 0.0 {
        return Err(format!("size must be positive in '{}'", s));
    }
    Ok(Size::new(w, h))
}

fn parse_obstacle(s: &str) -> Result<ObstacleRequest, String> {
    let (center, size) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid obstacle '{}', expected CX,CY:WxH", s))?;
    let size = parse_size(size)?;
    Ok(ObstacleRequest {
        kind: Some("rectangle".to_string()),
        center: parse_point(center)?,
        size: Some([size.w, size.h]),
        radius: None,
    })
}

fn apply_overrides(cli: &Cli, config: &mut LayoutConfig) {
    if let Some(d) = cli.wall_distance {
        config.wall_distance = d;
    }
    if let Some(d) = cli.table_distance {
        config.table_distance = d;
    }
    if let Some(d) = cli.obstacle_distance {
        config.obstacle_distance = Some(d);
    }
    if let Some(size) = cli.table {
        config.table_width = size.w;
        config.table_height = size.h;
    }
    if let Some(algorithm) = cli.algorithm {
        config.algorithm = Some(algorithm);
    }
    if let Some(mode) = cli.mode {
        config.layout_mode = mode;
    }
    if let Some(n) = cli.max_iterations {
        config.max_iterations = n;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
}

fn build_request(cli: &Cli) -> Result<OptimizeRequest, String> {
    let mut request = match &cli.input {
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            serde_json::from_str::<OptimizeRequest>(&body)
                .map_err(|e| format!("invalid request in {}: {}", path.display(), e))?
        }
        None if cli.boundary.is_empty() => {
            return Err("either --input or --boundary is required".to_string());
        }
        None => OptimizeRequest {
            boundary: cli.boundary.clone(),
            obstacles: cli.obstacles.clone(),
            config: LayoutConfig::default(),
        },
    };
    apply_overrides(cli, &mut request.config);
    Ok(request)
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let request = build_request(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let solver = request.solver().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let start = Instant::now();
    let result = solver.solve().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let response = OptimizeResponse::from_result(&result, start.elapsed().as_secs_f64());

    if cli.json {
        match serde_json::to_string_pretty(&response) {
            Ok(body) => println!("{}", body),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    for t in &response.tables {
        let rot = if t.rotation == 90 { " [rotated]" } else { "" };
        println!("Table {}: {}x{} @ ({}, {}){}", t.index, t.width, t.height, t.x, t.y, rot);
    }
    if cli.layout {
        println!();
        print!(
            "{}",
            render::render_layout(solver.boundary(), solver.obstacles(), &result.tables)
        );
    }
    println!();

    let stats = result.stats;
    println!(
        "Summary: {} table{} placed ({}), {:.2}% utilization, {:.0}mm average clearance",
        stats.table_count,
        if stats.table_count == 1 { "" } else { "s" },
        stats.algorithm_used,
        stats.space_utilization,
        stats.average_distance,
    );
}
