//! Reciprocal pairwise comparison matrices and the Saaty 1/9 … 9 scale.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::config::*;

/// The 17 points of the Saaty scale, in increasing order.
pub const SAATY_SCALE: [f64; 17] = [
    1.0 / 9.0,
    1.0 / 8.0,
    1.0 / 7.0,
    1.0 / 6.0,
    1.0 / 5.0,
    1.0 / 4.0,
    1.0 / 3.0,
    1.0 / 2.0,
    1.0,
    2.0,
    3.0,
    4.0,
    5.0,
    6.0,
    7.0,
    8.0,
    9.0,
];

/// Largest magnitude of a slider control. A slider runs from -8 to +8.
pub const SLIDER_RANGE: i32 = 8;

/// A square reciprocal comparison matrix.
///
/// Cell `(i, j)` says how many times item `i` is more important than item `j`.
/// The diagonal is 1 and `(j, i)` always holds the reciprocal of `(i, j)` as long as
/// the matrix is edited through [`PairwiseMatrix::set_comparison`].
///
/// The matrix serializes as a plain array of rows.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct PairwiseMatrix {
    size: usize,
    // Row-major
    cells: Vec<f64>,
}

impl PairwiseMatrix {
    /// A matrix of the given size where every item is equally important.
    pub fn new(size: usize) -> PairwiseMatrix {
        PairwiseMatrix {
            size,
            cells: vec![1.0; size * size],
        }
    }

    /// Builds a matrix from its rows.
    ///
    /// The values are taken as they are: they do not need to be reciprocal or on the
    /// Saaty scale, but they must be finite and non-negative.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<PairwiseMatrix, MatrixError> {
        let size = rows.len();
        let mut cells: Vec<f64> = Vec::with_capacity(size * size);
        for (row_idx, row) in rows.iter().enumerate() {
            ensure!(
                row.len() == size,
                NotSquareSnafu {
                    row: row_idx,
                    len: row.len(),
                    size
                }
            );
            for &value in row.iter() {
                ensure!(value.is_finite() && value >= 0.0, InvalidValueSnafu { value });
                cells.push(value);
            }
        }
        Ok(PairwiseMatrix { size, cells })
    }

    /// Builds a matrix from sparse judgements keyed `"<a>_<b>"`.
    ///
    /// The value of `"<a>_<b>"` is how many times `a` is more important than `b`. When
    /// both orders of a pair are present, the one following the order of `ids` wins.
    /// Pairs without a judgement stay at 1.
    pub fn from_comparisons(
        ids: &[String],
        comparisons: &HashMap<String, f64>,
    ) -> Result<PairwiseMatrix, MatrixError> {
        let mut res = PairwiseMatrix::new(ids.len());
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let forward = format!("{}_{}", ids[i], ids[j]);
                let backward = format!("{}_{}", ids[j], ids[i]);
                if let Some(v) = comparisons.get(&forward) {
                    res.set_comparison(i, j, *v)?;
                } else if let Some(v) = comparisons.get(&backward) {
                    res.set_comparison(j, i, *v)?;
                }
            }
        }
        Ok(res)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The value of cell `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics when `i` or `j` is not smaller than [`PairwiseMatrix::size`].
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.size && j < self.size,
            "cell ({}, {}) out of range for a matrix of size {}",
            i,
            j,
            self.size
        );
        self.cells[i * self.size + j]
    }

    /// The cells of row `i`.
    ///
    /// # Panics
    ///
    /// Panics when `i` is not smaller than [`PairwiseMatrix::size`].
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(
            i < self.size,
            "row {} out of range for a matrix of size {}",
            i,
            self.size
        );
        &self.cells[i * self.size..(i + 1) * self.size]
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.size).map(|i| self.row(i).to_vec()).collect()
    }

    /// Records that item `i` is `value` times as important as item `j`.
    ///
    /// Both `(i, j)` and `(j, i)` are updated so that the matrix stays reciprocal.
    /// Values off the Saaty scale are accepted; see [`PairwiseMatrix::is_on_saaty_scale`].
    pub fn set_comparison(&mut self, i: usize, j: usize, value: f64) -> Result<(), MatrixError> {
        ensure!(i != j, DiagonalComparisonSnafu { index: i });
        for index in [i, j] {
            ensure!(
                index < self.size,
                IndexOutOfRangeSnafu {
                    index,
                    size: self.size
                }
            );
        }
        ensure!(value.is_finite() && value > 0.0, InvalidValueSnafu { value });
        debug!("set_comparison: ({}, {}) = {}", i, j, value);
        self.cells[i * self.size + j] = value;
        self.cells[j * self.size + i] = 1.0 / value;
        Ok(())
    }

    /// Same as [`PairwiseMatrix::set_comparison`], with the value read from a slider position.
    pub fn set_slider(&mut self, i: usize, j: usize, slider: i32) -> Result<(), MatrixError> {
        self.set_comparison(i, j, slider_to_saaty(slider))
    }

    /// The slider position that displays cell `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics when `i` or `j` is out of range, like [`PairwiseMatrix::get`].
    pub fn slider(&self, i: usize, j: usize) -> i32 {
        saaty_to_slider(self.get(i, j))
    }

    /// True when the diagonal is 1 and every pair of cells is reciprocal within `tolerance`.
    pub fn is_reciprocal(&self, tolerance: f64) -> bool {
        (0..self.size).all(|i| {
            (self.get(i, i) - 1.0).abs() <= tolerance
                && ((i + 1)..self.size)
                    .all(|j| (self.get(i, j) * self.get(j, i) - 1.0).abs() <= tolerance)
        })
    }

    /// True when every cell holds one of the 17 Saaty scale values.
    pub fn is_on_saaty_scale(&self) -> bool {
        self.cells.iter().all(|v| is_valid_comparison_value(*v))
    }
}

impl TryFrom<Vec<Vec<f64>>> for PairwiseMatrix {
    type Error = MatrixError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        PairwiseMatrix::from_rows(&rows)
    }
}

impl From<PairwiseMatrix> for Vec<Vec<f64>> {
    fn from(m: PairwiseMatrix) -> Self {
        m.rows()
    }
}

/// Converts a slider position to the value stored in the matrix cell.
///
/// The slider sits between the left item `i` and the right item `j`:
/// - `0`: both are equally important, the cell is 1.
/// - `c > 0`: the right item is `c + 1` times as important, the cell is `1 / (c + 1)`.
/// - `c < 0`: the left item is `|c| + 1` times as important, the cell is `|c| + 1`.
///
/// ```
/// use ahp_topsis::{saaty_to_slider, slider_to_saaty};
///
/// assert_eq!(slider_to_saaty(-3), 4.0);
/// assert_eq!(slider_to_saaty(3), 0.25);
/// assert_eq!(saaty_to_slider(slider_to_saaty(5)), 5);
/// ```
pub fn slider_to_saaty(slider: i32) -> f64 {
    match slider {
        0 => 1.0,
        c if c > 0 => 1.0 / (c as f64 + 1.0),
        c => c.unsigned_abs() as f64 + 1.0,
    }
}

/// Converts a matrix cell back to the slider position. Exact inverse of [`slider_to_saaty`].
///
/// Values within 0.001 of 1 map to 0. Values that are not finite and positive cannot
/// come out of a slider and also map to 0.
pub fn saaty_to_slider(value: f64) -> i32 {
    if !value.is_finite() || value <= 0.0 || (value - 1.0).abs() < 0.001 {
        return 0;
    }
    if value > 1.0 {
        -((value - 1.0).round() as i32)
    } else {
        (1.0 / value - 1.0).round() as i32
    }
}

/// True when `value` is within 0.001 of one of the Saaty scale values.
pub fn is_valid_comparison_value(value: f64) -> bool {
    SAATY_SCALE.iter().any(|x| (x - value).abs() < 0.001)
}

/// The reciprocal of a judgement, with 0 mapped to 0.
pub fn reciprocal(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        1.0 / value
    }
}

/// Verbal meaning of the intensities of importance 1 to 9.
pub fn scale_description(intensity: u32) -> Option<&'static str> {
    match intensity {
        1 => Some("Equal importance"),
        2 => Some("Weak or slight importance"),
        3 => Some("Moderate importance"),
        4 => Some("Moderate plus"),
        5 => Some("Strong importance"),
        6 => Some("Strong plus"),
        7 => Some("Very strong or demonstrated importance"),
        8 => Some("Very, very strong"),
        9 => Some("Extreme importance"),
        _ => None,
    }
}
