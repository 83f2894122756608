use log::debug;

use crate::config::*;
use crate::pairwise::PairwiseMatrix;

/// Saaty's random consistency index for matrices of size 1 to 15.
pub const RANDOM_INDEX: [f64; 15] = [
    0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49, 1.51, 1.48, 1.56, 1.57, 1.59,
];

/// A matrix is consistent when its consistency ratio is strictly below this value.
pub const CONSISTENCY_THRESHOLD: f64 = 0.10;

/// The random index of an `n`×`n` matrix. Sizes past the table reuse its last entry.
pub fn random_index(n: usize) -> f64 {
    match n {
        0 => 0.0,
        n => RANDOM_INDEX[n.min(RANDOM_INDEX.len()) - 1],
    }
}

/// Derives the priority vector and the consistency of a comparison matrix.
///
/// The weights are the row averages of the column-normalized matrix. They always sum
/// to 1; a degenerate matrix (a weight of 0, for example from a row of zeros) gets
/// uniform weights instead. The consistency is only reported, never enforced.
///
/// ```
/// use ahp_topsis::{solve, PairwiseMatrix};
///
/// let mut m = PairwiseMatrix::new(3);
/// m.set_comparison(0, 1, 2.0)?;
/// m.set_comparison(0, 2, 4.0)?;
/// m.set_comparison(1, 2, 2.0)?;
/// let res = solve(&m);
/// assert!((res.weights[0] - 4.0 / 7.0).abs() < 1e-9);
/// assert!(res.consistency.is_consistent);
/// # Ok::<(), ahp_topsis::MatrixError>(())
/// ```
pub fn solve(matrix: &PairwiseMatrix) -> AhpResult {
    let n = matrix.size();
    if n == 0 {
        return AhpResult {
            weights: Vec::new(),
            consistency: ConsistencyResult::trivial(0),
        };
    }
    if n == 1 {
        return AhpResult {
            weights: vec![1.0],
            consistency: ConsistencyResult::trivial(1),
        };
    }

    let column_sums: Vec<f64> = (0..n)
        .map(|j| (0..n).map(|i| matrix.get(i, j)).sum())
        .collect();
    debug!("solve: column_sums: {:?}", column_sums);

    let raw_weights: Vec<f64> = (0..n)
        .map(|i| {
            let row_total: f64 = (0..n)
                .map(|j| {
                    if column_sums[j] == 0.0 {
                        0.0
                    } else {
                        matrix.get(i, j) / column_sums[j]
                    }
                })
                .sum();
            row_total / n as f64
        })
        .collect();

    let weights = if raw_weights.iter().any(|w| *w == 0.0 || !w.is_finite()) {
        debug!(
            "solve: degenerate weights {:?}, falling back to uniform weights",
            raw_weights
        );
        vec![1.0 / n as f64; n]
    } else {
        normalize_weights(&raw_weights)
    };
    debug!("solve: weights: {:?}", weights);

    let consistency = consistency(matrix, &weights);
    AhpResult {
        weights,
        consistency,
    }
}

/// Scales a weight vector so that it sums to 1. A vector summing to 0 becomes uniform.
pub fn normalize_weights(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total == 0.0 || !total.is_finite() {
        vec![1.0 / weights.len() as f64; weights.len()]
    } else {
        weights.iter().map(|w| w / total).collect()
    }
}

// The weights must all be strictly positive.
fn consistency(matrix: &PairwiseMatrix, weights: &[f64]) -> ConsistencyResult {
    let n = matrix.size();
    if n <= 2 {
        return ConsistencyResult::trivial(n);
    }

    let lambda_max: f64 = (0..n)
        .map(|i| {
            let row_product: f64 = (0..n).map(|j| matrix.get(i, j) * weights[j]).sum();
            row_product / weights[i]
        })
        .sum::<f64>()
        / n as f64;

    // lambda_max >= n for a positive reciprocal matrix: anything below is rounding noise.
    let consistency_index = ((lambda_max - n as f64) / (n - 1) as f64).max(0.0);
    let consistency_ratio = consistency_index / random_index(n);
    debug!(
        "consistency: lambda_max: {} CI: {} CR: {}",
        lambda_max, consistency_index, consistency_ratio
    );
    ConsistencyResult {
        consistency_index,
        consistency_ratio,
        is_consistent: consistency_ratio < CONSISTENCY_THRESHOLD,
        max_eigenvalue: lambda_max,
    }
}
