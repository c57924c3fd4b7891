use std::collections::HashMap;

use thiserror::Error;

use crate::layout::Interval;
use crate::scale::{Scale, ScaleError};

/// Estimated label pixel width per character, relative to the row height.
pub const LABEL_WIDTH_FACTOR: f64 = 0.75;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("interval id '{0}' appears more than once in one layout pass")]
    DuplicateId(String),
    #[error("series label '{0}' is already present")]
    DuplicateSeries(String),
    #[error(transparent)]
    Scale(#[from] ScaleError),
}

/// Greedy leftmost-fit row assignment for intervals.
///
/// Each row remembers the right-most pixel it occupies (plus margin and any
/// trailing label). An interval goes into the first row whose occupied edge
/// lies strictly left of the interval's own left edge, or into a new row.
#[derive(Debug, Clone)]
pub struct RowPacker {
    pub row_height: f64,
    /// Horizontal gap kept after each interval on its row.
    pub margin_x: f64,
    /// Vertical gap between rows.
    pub margin_y: f64,
    pub label_width_factor: f64,
    rows: Vec<f64>,
    rows_by_id: HashMap<String, usize>,
}

impl RowPacker {
    pub fn new(row_height: f64, margin_x: f64, margin_y: f64) -> Self {
        Self {
            row_height,
            margin_x,
            margin_y,
            label_width_factor: LABEL_WIDTH_FACTOR,
            rows: Vec::new(),
            rows_by_id: HashMap::new(),
        }
    }

    /// Forget all rows and assignments.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.rows_by_id.clear();
    }

    pub fn place(&mut self, interval: &Interval, scale: &Scale) -> Result<usize, LayoutError> {
        self.place_span(
            &interval.id,
            interval.start,
            interval.end,
            interval.label.as_deref(),
            scale,
        )
    }

    /// Place a span that has no [`Interval`] of its own (e.g. a read pair).
    pub fn place_span(
        &mut self,
        id: &str,
        start: u64,
        end: u64,
        label: Option<&str>,
        scale: &Scale,
    ) -> Result<usize, LayoutError> {
        if self.rows_by_id.contains_key(id) {
            return Err(LayoutError::DuplicateId(id.to_string()));
        }

        let left = scale.to_pixels(start as f64);
        let row = match self.rows.iter().position(|&row_end| left > row_end) {
            Some(row) => row,
            None => {
                self.rows.push(f64::NEG_INFINITY);
                self.rows.len() - 1
            }
        };

        let mut new_end = scale.to_pixels(end as f64) + self.margin_x;
        if let Some(label) = label {
            new_end += label.chars().count() as f64 * self.row_height * self.label_width_factor;
        }
        self.rows[row] = new_end;
        self.rows_by_id.insert(id.to_string(), row);
        Ok(row)
    }

    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.rows_by_id.get(id).copied()
    }

    pub fn assignments(&self) -> &HashMap<String, usize> {
        &self.rows_by_id
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Pixel top of a row.
    pub fn row_top(&self, row: usize) -> f64 {
        row as f64 * (self.row_height + self.margin_y)
    }

    /// Track height: every used row plus one spare.
    pub fn height(&self) -> f64 {
        (self.rows.len() + 1) as f64 * (self.row_height + self.margin_y)
    }
}
