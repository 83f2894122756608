//! Ranking of alternatives by their closeness to the ideal solution.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::{debug, info};
use snafu::prelude::*;

use crate::config::*;

/// Two closeness coefficients closer than this are a tie, broken by the secondary key.
pub const TIE_TOLERANCE: f64 = 0.0001;

/// Ranks the alternatives of a decision matrix, best first.
///
/// ```
/// use ahp_topsis::{rank, Polarity, TopsisInput};
///
/// let input = TopsisInput {
///     alternatives: vec!["A1".to_string(), "A2".to_string(), "A3".to_string()],
///     criteria: vec!["output".to_string(), "incidents".to_string()],
///     matrix: vec![vec![7.0, 3.0], vec![5.0, 5.0], vec![9.0, 1.0]],
///     weights: vec![0.5, 0.5],
///     criteria_types: vec![Polarity::Benefit, Polarity::Cost],
/// };
/// let results = rank(&input)?;
/// assert_eq!(results[0].alternative, "A3");
/// assert_eq!(results[0].rank, 1);
/// assert_eq!(results[2].alternative, "A2");
/// # Ok::<(), ahp_topsis::RankingError>(())
/// ```
pub fn rank(input: &TopsisInput) -> Result<Vec<RankedAlternative>, RankingError> {
    Ok(rank_detailed(input)?.results)
}

/// Same ranking as [rank], together with every intermediate step of the computation.
pub fn rank_detailed(input: &TopsisInput) -> Result<TopsisDetailedResult, RankingError> {
    check_dimensions(input)?;
    let num_criteria = input.criteria.len();

    let normalized_matrix = normalize_matrix(&input.matrix, num_criteria);
    let weighted_matrix: Vec<Vec<f64>> = normalized_matrix
        .iter()
        .map(|row| {
            row.iter()
                .zip(input.weights.iter())
                .map(|(x, w)| x * w)
                .collect()
        })
        .collect();
    debug!("rank_detailed: weighted_matrix: {:?}", weighted_matrix);

    let (ideal_solution, negative_ideal_solution) =
        ideal_solutions(&weighted_matrix, &input.criteria_types);
    debug!(
        "rank_detailed: ideal: {:?} negative ideal: {:?}",
        ideal_solution, negative_ideal_solution
    );

    let distances: Vec<AlternativeDistance> = weighted_matrix
        .iter()
        .map(|row| AlternativeDistance {
            positive_distance: euclidean_distance(row, &ideal_solution),
            negative_distance: euclidean_distance(row, &negative_ideal_solution),
        })
        .collect();

    let unranked: Vec<RankedAlternative> = input
        .alternatives
        .iter()
        .zip(distances.iter())
        .map(|(alternative, d)| {
            let cc = d.negative_distance / (d.positive_distance + d.negative_distance);
            RankedAlternative {
                alternative: alternative.clone(),
                closeness_coefficient: if cc.is_finite() { cc } else { 0.0 },
                rank: 0,
                secondary_key: None,
            }
        })
        .collect();
    let results = sort_and_rank(unranked);
    info!(
        "Ranked {} alternatives over {} criteria",
        results.len(),
        num_criteria
    );

    Ok(TopsisDetailedResult {
        results,
        decision_matrix: input.matrix.clone(),
        normalized_matrix,
        weighted_matrix,
        ideal_solution,
        negative_ideal_solution,
        distances,
        criteria: input.criteria.clone(),
        alternatives: input.alternatives.clone(),
        weights: input.weights.clone(),
        criteria_types: input.criteria_types.clone(),
    })
}

/// Attaches secondary keys to already ranked results, then ranks them again.
///
/// Alternatives without a key get 0. The closeness coefficients are not touched: only
/// the order inside near ties can change.
pub fn add_secondary_keys(
    results: &[RankedAlternative],
    keys: &HashMap<String, f64>,
) -> Vec<RankedAlternative> {
    let with_keys: Vec<RankedAlternative> = results
        .iter()
        .map(|r| RankedAlternative {
            secondary_key: Some(keys.get(&r.alternative).copied().unwrap_or(0.0)),
            ..r.clone()
        })
        .collect();
    sort_and_rank(with_keys)
}

fn check_dimensions(input: &TopsisInput) -> Result<(), RankingError> {
    ensure!(
        input.matrix.first().map(|row| !row.is_empty()).unwrap_or(false),
        EmptyMatrixSnafu {}
    );
    ensure!(
        input.alternatives.len() == input.matrix.len(),
        AlternativesMismatchSnafu {
            alternatives: input.alternatives.len(),
            rows: input.matrix.len(),
        }
    );
    let criteria = input.criteria.len();
    for (row, values) in input.matrix.iter().enumerate() {
        ensure!(
            values.len() == criteria,
            CriteriaMismatchSnafu {
                row,
                columns: values.len(),
                criteria,
            }
        );
    }
    ensure!(
        input.weights.len() == criteria,
        WeightsMismatchSnafu {
            weights: input.weights.len(),
            criteria,
        }
    );
    ensure!(
        input.criteria_types.len() == criteria,
        CriteriaTypesMismatchSnafu {
            criteria_types: input.criteria_types.len(),
            criteria,
        }
    );
    Ok(())
}

// Each column divided by its euclidean norm. A column of zeros stays at zero.
fn normalize_matrix(matrix: &[Vec<f64>], num_criteria: usize) -> Vec<Vec<f64>> {
    let norms: Vec<f64> = (0..num_criteria)
        .map(|j| matrix.iter().map(|row| row[j] * row[j]).sum::<f64>().sqrt())
        .collect();
    debug!("normalize_matrix: column norms: {:?}", norms);
    matrix
        .iter()
        .map(|row| {
            row.iter()
                .zip(norms.iter())
                .map(|(x, norm)| if *norm == 0.0 { 0.0 } else { x / norm })
                .collect()
        })
        .collect()
}

fn ideal_solutions(weighted: &[Vec<f64>], criteria_types: &[Polarity]) -> (Vec<f64>, Vec<f64>) {
    let mut ideal = Vec::with_capacity(criteria_types.len());
    let mut negative_ideal = Vec::with_capacity(criteria_types.len());
    for (j, polarity) in criteria_types.iter().enumerate() {
        let column = weighted.iter().map(|row| row[j]);
        let max = column.clone().fold(f64::NEG_INFINITY, f64::max);
        let min = column.fold(f64::INFINITY, f64::min);
        match polarity {
            Polarity::Benefit => {
                ideal.push(max);
                negative_ideal.push(min);
            }
            Polarity::Cost => {
                ideal.push(min);
                negative_ideal.push(max);
            }
        }
    }
    (ideal, negative_ideal)
}

fn euclidean_distance(row: &[f64], target: &[f64]) -> f64 {
    row.iter()
        .zip(target.iter())
        .map(|(x, t)| (x - t) * (x - t))
        .sum::<f64>()
        .sqrt()
}

fn by_secondary_key(a: &RankedAlternative, b: &RankedAlternative) -> Ordering {
    let ka = a.secondary_key.unwrap_or(0.0);
    let kb = b.secondary_key.unwrap_or(0.0);
    kb.total_cmp(&ka)
}

// Sorts by decreasing closeness, then reorders each run of near ties by decreasing
// secondary key. A run is anchored on its first element so that every member is within
// the tolerance of its head. Ranks are assigned from 1.
fn sort_and_rank(mut results: Vec<RankedAlternative>) -> Vec<RankedAlternative> {
    results.sort_by(|a, b| b.closeness_coefficient.total_cmp(&a.closeness_coefficient));

    let mut start = 0;
    while start < results.len() {
        let head = results[start].closeness_coefficient;
        let mut end = start + 1;
        while end < results.len() && (head - results[end].closeness_coefficient).abs() < TIE_TOLERANCE
        {
            end += 1;
        }
        if end - start > 1 {
            debug!(
                "sort_and_rank: near tie between {} alternatives at {}",
                end - start,
                head
            );
            results[start..end].sort_by(by_secondary_key);
        }
        start = end;
    }

    for (idx, r) in results.iter_mut().enumerate() {
        r.rank = (idx + 1) as u32;
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn example() -> TopsisInput {
        TopsisInput {
            alternatives: names(&["A1", "A2", "A3"]),
            criteria: names(&["output", "incidents"]),
            matrix: vec![vec![7.0, 3.0], vec![5.0, 5.0], vec![9.0, 1.0]],
            weights: vec![0.5, 0.5],
            criteria_types: vec![Polarity::Benefit, Polarity::Cost],
        }
    }

    fn cc_of(results: &[RankedAlternative], name: &str) -> f64 {
        results
            .iter()
            .find(|r| r.alternative == name)
            .unwrap()
            .closeness_coefficient
    }

    #[test]
    fn end_to_end_example() {
        init();
        let results = rank(&example()).unwrap();
        assert_eq!(
            results.iter().map(|r| r.alternative.as_str()).collect::<Vec<_>>(),
            vec!["A3", "A1", "A2"]
        );
        assert_eq!(
            results.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!((cc_of(&results, "A3") - 1.0).abs() < 1e-12);
        assert!((cc_of(&results, "A1") - 0.5).abs() < 1e-9);
        assert!(cc_of(&results, "A2").abs() < 1e-12);
        for r in results.iter() {
            assert!((0.0..=1.0).contains(&r.closeness_coefficient));
            assert_eq!(r.secondary_key, None);
        }
    }

    #[test]
    fn detailed_result() {
        let d = rank_detailed(&example()).unwrap();
        assert_eq!(d.results, rank(&example()).unwrap());
        assert_eq!(d.decision_matrix, example().matrix);
        let norm0 = 155f64.sqrt();
        assert!((d.normalized_matrix[0][0] - 7.0 / norm0).abs() < 1e-12);
        assert!((d.weighted_matrix[0][0] - 3.5 / norm0).abs() < 1e-12);
        // Cost column: the ideal is the smallest value.
        assert_eq!(d.ideal_solution[1], d.weighted_matrix[2][1]);
        assert_eq!(d.negative_ideal_solution[1], d.weighted_matrix[1][1]);
        assert_eq!(d.distances.len(), 3);
        assert!(d.distances[2].positive_distance.abs() < 1e-12);
        assert!(d.distances[1].negative_distance.abs() < 1e-12);
    }

    #[test]
    fn near_ties_follow_the_secondary_key() {
        init();
        let input = TopsisInput {
            alternatives: names(&["short", "long", "other"]),
            criteria: names(&["c"]),
            matrix: vec![vec![4.0], vec![4.0], vec![1.0]],
            weights: vec![1.0],
            criteria_types: vec![Polarity::Benefit],
        };
        let results = rank(&input).unwrap();
        // Exact tie without keys: input order.
        assert_eq!(results[0].alternative, "short");
        assert_eq!(results[1].alternative, "long");

        let mut keys = HashMap::new();
        keys.insert("short".to_string(), 50.0);
        keys.insert("long".to_string(), 100.0);
        let merged = add_secondary_keys(&results, &keys);
        assert_eq!(merged[0].alternative, "long");
        assert_eq!(merged[0].rank, 1);
        assert_eq!(merged[0].secondary_key, Some(100.0));
        assert_eq!(merged[1].alternative, "short");
        assert_eq!(merged[1].rank, 2);
        assert_eq!(merged[2].alternative, "other");
        assert_eq!(merged[2].secondary_key, Some(0.0));
        assert_eq!(merged[2].rank, 3);
    }

    #[test]
    fn secondary_key_does_not_override_real_differences() {
        let results = vec![
            RankedAlternative {
                alternative: "b".to_string(),
                closeness_coefficient: 0.8,
                rank: 1,
                secondary_key: None,
            },
            RankedAlternative {
                alternative: "a".to_string(),
                closeness_coefficient: 0.79995,
                rank: 2,
                secondary_key: None,
            },
            RankedAlternative {
                alternative: "c".to_string(),
                closeness_coefficient: 0.7,
                rank: 3,
                secondary_key: None,
            },
        ];
        let mut keys = HashMap::new();
        keys.insert("a".to_string(), 10.0);
        keys.insert("c".to_string(), 1000.0);
        let merged = add_secondary_keys(&results, &keys);
        assert_eq!(
            merged.iter().map(|r| r.alternative.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            merged.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn tie_runs_are_anchored_on_their_head() {
        // 0.50000 ~ 0.49994 ~ 0.49988, but the first and the last are not within tolerance.
        let results: Vec<RankedAlternative> = [("x", 0.5), ("y", 0.49994), ("z", 0.49988)]
            .iter()
            .map(|(name, cc)| RankedAlternative {
                alternative: name.to_string(),
                closeness_coefficient: *cc,
                rank: 0,
                secondary_key: None,
            })
            .collect();
        let keys: HashMap<String, f64> = [("x", 1.0), ("y", 2.0), ("z", 3.0)]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        let merged = add_secondary_keys(&results, &keys);
        assert_eq!(
            merged.iter().map(|r| r.alternative.as_str()).collect::<Vec<_>>(),
            vec!["y", "x", "z"]
        );
        assert_eq!(merged, add_secondary_keys(&merged, &keys));
    }

    #[test]
    fn dimension_mismatches() {
        let mut input = example();
        input.alternatives.push("A4".to_string());
        assert_eq!(
            rank(&input).unwrap_err(),
            RankingError::AlternativesMismatch {
                alternatives: 4,
                rows: 3
            }
        );

        let mut input = example();
        input.matrix[1].push(2.0);
        assert_eq!(
            rank(&input).unwrap_err(),
            RankingError::CriteriaMismatch {
                row: 1,
                columns: 3,
                criteria: 2
            }
        );

        let mut input = example();
        input.weights.pop();
        assert_eq!(
            rank(&input).unwrap_err(),
            RankingError::WeightsMismatch {
                weights: 1,
                criteria: 2
            }
        );

        let mut input = example();
        input.criteria_types.push(Polarity::Cost);
        assert_eq!(
            rank(&input).unwrap_err(),
            RankingError::CriteriaTypesMismatch {
                criteria_types: 3,
                criteria: 2
            }
        );

        let mut input = example();
        input.matrix.clear();
        assert_eq!(rank(&input).unwrap_err(), RankingError::EmptyMatrix {});

        let mut input = example();
        input.matrix = vec![vec![], vec![], vec![]];
        assert_eq!(rank(&input).unwrap_err(), RankingError::EmptyMatrix {});
    }

    #[test]
    fn zero_columns_and_zero_weights() {
        init();
        let mut input = example();
        for row in input.matrix.iter_mut() {
            row[1] = 0.0;
        }
        let d = rank_detailed(&input).unwrap();
        assert!(d.normalized_matrix.iter().all(|row| row[1] == 0.0));
        assert_eq!(d.results[0].alternative, "A3");

        let mut input = example();
        input.weights = vec![0.0, 0.0];
        let results = rank(&input).unwrap();
        assert!(results.iter().all(|r| r.closeness_coefficient == 0.0));
        assert_eq!(
            results.iter().map(|r| r.alternative.as_str()).collect::<Vec<_>>(),
            vec!["A1", "A2", "A3"]
        );
    }

    #[test]
    fn single_alternative() {
        let input = TopsisInput {
            alternatives: names(&["only"]),
            criteria: names(&["c1", "c2"]),
            matrix: vec![vec![3.0, 2.0]],
            weights: vec![0.6, 0.4],
            criteria_types: vec![Polarity::Benefit, Polarity::Cost],
        };
        let results = rank(&input).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[0].closeness_coefficient, 0.0);
    }

    #[test]
    fn ranking_is_idempotent() {
        assert_eq!(rank(&example()).unwrap(), rank(&example()).unwrap());
    }
}
