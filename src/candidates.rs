use crate::geometry::EPSILON;
use crate::types::{Point, Rect, Rotation, Size, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    /// Top to bottom, left to right within each row.
    RowMajor,
    /// Left to right, top to bottom within each column.
    ColumnMajor,
    /// Anti-diagonals outward from the region origin.
    CornerFirst,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub x: f64,
    pub y: f64,
    pub rotation: Rotation,
}

impl Candidate {
    pub fn footprint(&self, nominal: Size) -> Rect {
        let size = self.rotation.apply(nominal);
        Rect::new(self.x, self.y, size.w, size.h)
    }

    pub fn into_table(self, nominal: Size) -> Table {
        Table::new(self.x, self.y, nominal, self.rotation)
    }
}

/// Drops floating point noise below a micrometre.
pub fn tidy(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Snaps `value` to the nearest multiple of `tolerance` measured from `origin`.
pub fn snap(value: f64, origin: f64, tolerance: f64) -> f64 {
    if tolerance <= 0.0 {
        return tidy(value);
    }
    tidy(origin + ((value - origin) / tolerance).round() * tolerance)
}

/// Lazy, finite sequence of placement candidates over a lattice inside
/// `bounds`. Only candidates whose footprint stays inside `bounds` are
/// produced.
#[derive(Debug, Clone)]
pub struct CandidateScan {
    xs: Vec<f64>,
    ys: Vec<f64>,
    order: ScanOrder,
    rotations: Vec<Rotation>,
    nominal: Size,
    bounds: Rect,
    /// Lattice index `(i, j)` of the next anchor, `None` once exhausted.
    anchor: Option<(usize, usize)>,
    rotation_idx: usize,
}

impl CandidateScan {
    /// Regular raster spaced by footprint plus `table_distance` on each axis.
    pub fn grid(bounds: Rect, nominal: Size, rotation: Rotation, table_distance: f64) -> Self {
        let footprint = rotation.apply(nominal);
        Self::lattice(
            bounds,
            nominal,
            footprint.w + table_distance,
            footprint.h + table_distance,
            ScanOrder::RowMajor,
            &[rotation],
            0.0,
        )
    }

    /// Uniform lattice with the same `step` on both axes.
    pub fn uniform(
        bounds: Rect,
        nominal: Size,
        step: f64,
        order: ScanOrder,
        rotations: &[Rotation],
        alignment: f64,
    ) -> Self {
        Self::lattice(bounds, nominal, step, step, order, rotations, alignment)
    }

    fn lattice(
        bounds: Rect,
        nominal: Size,
        step_x: f64,
        step_y: f64,
        order: ScanOrder,
        rotations: &[Rotation],
        alignment: f64,
    ) -> Self {
        let origin = Point::new(tidy(bounds.x), tidy(bounds.y));
        let min_w = rotations
            .iter()
            .map(|r| r.apply(nominal).w)
            .fold(f64::INFINITY, f64::min);
        let min_h = rotations
            .iter()
            .map(|r| r.apply(nominal).h)
            .fold(f64::INFINITY, f64::min);

        let xs = axis(origin.x, bounds.max_x() - min_w, step_x, alignment);
        let ys = axis(origin.y, bounds.max_y() - min_h, step_y, alignment);

        let anchor = (!xs.is_empty() && !ys.is_empty()).then_some((0, 0));

        Self {
            xs,
            ys,
            order,
            rotations: rotations.to_vec(),
            nominal,
            bounds,
            anchor,
            rotation_idx: 0,
        }
    }

    /// Anchor following `(i, j)` in scan order.
    fn advance(&self, (i, j): (usize, usize)) -> Option<(usize, usize)> {
        let (nx, ny) = (self.xs.len(), self.ys.len());
        match self.order {
            ScanOrder::RowMajor if i + 1 < nx => Some((i + 1, j)),
            ScanOrder::RowMajor => (j + 1 < ny).then_some((0, j + 1)),
            ScanOrder::ColumnMajor if j + 1 < ny => Some((i, j + 1)),
            ScanOrder::ColumnMajor => (i + 1 < nx).then_some((i + 1, 0)),
            // Along the anti-diagonal i + j with j ascending, then the next one.
            ScanOrder::CornerFirst if i > 0 && j + 1 < ny => Some((i - 1, j + 1)),
            ScanOrder::CornerFirst => {
                let d = i + j + 1;
                if d > nx + ny - 2 {
                    return None;
                }
                let j = d.saturating_sub(nx - 1);
                Some((d - j, j))
            }
        }
    }

    fn fits(&self, candidate: &Candidate) -> bool {
        let rect = candidate.footprint(self.nominal);
        rect.max_x() <= self.bounds.max_x() + EPSILON && rect.max_y() <= self.bounds.max_y() + EPSILON
    }
}

impl Iterator for CandidateScan {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        while let Some((i, j)) = self.anchor {
            while self.rotation_idx < self.rotations.len() {
                let candidate = Candidate {
                    x: self.xs[i],
                    y: self.ys[j],
                    rotation: self.rotations[self.rotation_idx],
                };
                self.rotation_idx += 1;
                if self.fits(&candidate) {
                    return Some(candidate);
                }
            }
            self.rotation_idx = 0;
            self.anchor = self.advance((i, j));
        }
        None
    }
}

fn axis(start: f64, last: f64, step: f64, alignment: f64) -> Vec<f64> {
    let mut values: Vec<f64> = Vec::new();
    if step <= 0.0 || last < start - EPSILON {
        return values;
    }
    let mut k = 0usize;
    loop {
        let raw = tidy(start + k as f64 * step);
        if raw > last + EPSILON {
            break;
        }
        let v = snap(raw, start, alignment);
        if v <= last + EPSILON && values.last().is_none_or(|&prev| v > prev + EPSILON) {
            values.push(v);
        }
        k += 1;
    }
    values
}
