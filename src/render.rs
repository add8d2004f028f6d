use crate::types::{Obstacle, Point, Polygon, Rect, Table};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

/// ASCII plan of a layout: `#` boundary, `X` obstacles, numbered table
/// outlines. Rows run top to bottom with increasing `y`.
pub fn render_layout(boundary: &Polygon, obstacles: &[Obstacle], tables: &[Table]) -> String {
    let bbox = boundary.bounding_box();
    if bbox.w <= 0.0 || bbox.h <= 0.0 {
        return String::new();
    }
    let scale = f64::min(MAX_WIDTH / bbox.w, MAX_HEIGHT / bbox.h);
    let grid_w = (bbox.w * scale).round() as usize;
    let grid_h = (bbox.h * scale).round() as usize;

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];
    let cell = |p: Point| -> (usize, usize) {
        (
            ((p.x - bbox.x) * scale).round().max(0.0) as usize,
            ((p.y - bbox.y) * scale).round().max(0.0) as usize,
        )
    };
    let span = |len: f64| (len * scale).round() as usize;

    for (a, b) in boundary.edges() {
        draw_line(&mut grid, cell(a), cell(b), '#');
    }

    for obstacle in obstacles {
        let r: Rect = obstacle.footprint();
        let (sx, sy) = cell(Point::new(r.x, r.y));
        fill_rect(&mut grid, sx, sy, span(r.w), span(r.h), 'X');
    }

    for (i, table) in tables.iter().enumerate() {
        let r = table.footprint();
        let (sx, sy) = cell(Point::new(r.x, r.y));
        let sw = span(r.w);
        let sh = span(r.h);

        if sw == 0 || sh == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, sy, sw, sh);

        let label: Vec<char> = (i + 1).to_string().chars().collect();
        if sw > 2 && sh > 0 {
            let cx = sx + sw / 2;
            let cy = sy + sh / 2;
            let start_x = cx.saturating_sub(label.len() / 2);

            for (k, &ch) in label.iter().enumerate() {
                let x = start_x + k;
                if x > sx && x < sx + sw && cy > sy && cy < sy + sh && cy < grid.len() && x < grid[cy].len() {
                    grid[cy][x] = ch;
                }
            }
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

fn put(grid: &mut [Vec<char>], x: usize, y: usize, ch: char) {
    if let Some(c) = grid.get_mut(y).and_then(|row| row.get_mut(x)) {
        *c = ch;
    }
}

fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (x0, y0) = (from.0 as f64, from.1 as f64);
    let (x1, y1) = (to.0 as f64, to.1 as f64);
    let steps = (x1 - x0).abs().max((y1 - y0).abs()) as usize;
    if steps == 0 {
        put(grid, from.0, from.1, ch);
        return;
    }
    for s in 0..=steps {
        let t = s as f64 / steps as f64;
        let x = (x0 + (x1 - x0) * t).round() as usize;
        let y = (y0 + (y1 - y0) * t).round() as usize;
        put(grid, x, y, ch);
    }
}

fn fill_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize, ch: char) {
    for j in y..=y + h {
        for i in x..=x + w {
            put(grid, i, j, ch);
        }
    }
}

fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let merge = |current: char, line: char| {
        if current == '+' || (current == '|' && line == '-') || (current == '-' && line == '|') {
            '+'
        } else {
            line
        }
    };

    for i in x..=x + w {
        for j in [y, y + h] {
            if let Some(c) = grid.get_mut(j).and_then(|row| row.get_mut(i)) {
                *c = merge(*c, '-');
            }
        }
    }
    for j in y..=y + h {
        for i in [x, x + w] {
            if let Some(c) = grid.get_mut(j).and_then(|row| row.get_mut(i)) {
                *c = merge(*c, '|');
            }
        }
    }
    for i in [x, x + w] {
        for j in [y, y + h] {
            put(grid, i, j, '+');
        }
    }
}
