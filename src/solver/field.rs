use ndarray::{concatenate, Array2, ArrayViewMut2, Axis};

use crate::coord::Viewport;
use crate::error::ConfigError;
use crate::solver::escape::{evaluate, EscapeMode};
use crate::threads::{Join, JoinError, RangeSplitter, Split};

/// Everything a compute pass reads: a viewport snapshot and the iteration
/// settings. Copied into each worker, never shared mutably.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FieldRequest {
    pub viewport: Viewport,
    pub max_iter: u32,
    pub mode: EscapeMode,
}

impl FieldRequest {
    pub fn new(viewport: Viewport, max_iter: u32, mode: EscapeMode) -> Result<Self, ConfigError> {
        if max_iter == 0 {
            return Err(ConfigError::InvalidMaxIter);
        }
        Ok(Self {
            viewport,
            max_iter,
            mode,
        })
    }

    pub fn width(&self) -> usize {
        self.viewport.width()
    }

    pub fn height(&self) -> usize {
        self.viewport.height()
    }

    pub fn pixel(&self, px: usize, py: usize) -> f64 {
        evaluate(self.viewport.sample(px, py), self.max_iter).value(self.mode, self.max_iter)
    }

    pub(crate) fn allocate(&self) -> Array2<f64> {
        Array2::zeros((self.height(), self.width()))
    }

    /// Fills `out`, whose first row is image row `first_row`.
    pub(crate) fn fill_rows(&self, first_row: usize, mut out: ArrayViewMut2<f64>) {
        for (dy, mut row) in out.rows_mut().into_iter().enumerate() {
            let py = first_row + dy;
            for (px, v) in row.iter_mut().enumerate() {
                *v = self.pixel(px, py);
            }
        }
    }

    pub(crate) fn finish(&self, values: Array2<f64>) -> EscapeField {
        EscapeField::new(values, self.max_iter, self.mode)
    }
}

/// Rows `rows.0..rows.1` of a request; the unit of work for the pool.
#[derive(Copy, Clone, Debug)]
pub struct RowBand {
    pub request: FieldRequest,
    pub rows: (usize, usize),
}

impl RowBand {
    pub fn solve(&self) -> FieldBand {
        let (start, end) = self.rows;
        let mut values = Array2::zeros((end - start, self.request.width()));
        self.request.fill_rows(start, values.view_mut());
        FieldBand {
            first_row: start,
            values,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldBand {
    pub first_row: usize,
    pub values: Array2<f64>,
}

impl Split for FieldRequest {
    type Part = RowBand;

    fn split_parts(&self, n: usize) -> Vec<RowBand> {
        RangeSplitter::split(0, self.height(), n)
            .into_iter()
            .map(|rows| RowBand {
                request: *self,
                rows,
            })
            .collect()
    }
}

impl Join<FieldBand> for Array2<f64> {
    fn join_parts(parts: Vec<FieldBand>) -> Result<Self, JoinError> {
        let first = parts.first().ok_or(JoinError::Empty)?;
        let width = first.values.ncols();
        let mut next_row = first.first_row;
        for band in &parts {
            if band.first_row != next_row || band.values.ncols() != width {
                return Err(JoinError::Mismatch);
            }
            next_row += band.values.nrows();
        }
        let views: Vec<_> = parts.iter().map(|band| band.values.view()).collect();
        concatenate(Axis(0), &views).map_err(|_| JoinError::Mismatch)
    }
}

/// Per-pixel escape values, indexed `[row, column]`.
///
/// Escaped pixels hold a raw count or a smoothed value in `[0, max_iter)`,
/// interior pixels hold exactly `max_iter`.
#[derive(Clone, Debug, PartialEq)]
pub struct EscapeField {
    values: Array2<f64>,
    max_iter: u32,
    mode: EscapeMode,
}

impl EscapeField {
    pub fn new(values: Array2<f64>, max_iter: u32, mode: EscapeMode) -> Self {
        Self {
            values,
            max_iter,
            mode,
        }
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    pub fn max_iter(&self) -> u32 {
        self.max_iter
    }

    pub fn mode(&self) -> EscapeMode {
        self.mode
    }

    pub fn get(&self, px: usize, py: usize) -> f64 {
        self.values[[py, px]]
    }

    pub fn is_interior_value(&self, value: f64) -> bool {
        value >= self.max_iter as f64
    }

    pub fn is_interior(&self, px: usize, py: usize) -> bool {
        self.is_interior_value(self.get(px, py))
    }

    /// Largest escaped value, 0 when nothing escaped.
    pub fn max_escaped(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && !self.is_interior_value(*v))
            .fold(0.0, f64::max)
    }

    pub fn stats(&self) -> FieldStats {
        let mut stats = FieldStats::default();
        let mut sum = 0.0;
        for &v in self.values.iter() {
            if self.is_interior_value(v) {
                stats.interior += 1;
                continue;
            }
            stats.escaped += 1;
            sum += v;
            stats.min_escaped = Some(stats.min_escaped.map_or(v, |m: f64| m.min(v)));
            stats.max_escaped = Some(stats.max_escaped.map_or(v, |m: f64| m.max(v)));
        }
        if stats.escaped > 0 {
            stats.mean_escaped = Some(sum / stats.escaped as f64);
        }
        stats
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldStats {
    pub escaped: usize,
    pub interior: usize,
    pub min_escaped: Option<f64>,
    pub max_escaped: Option<f64>,
    pub mean_escaped: Option<f64>,
}
