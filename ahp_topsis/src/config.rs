// ********* Input data structures ***********

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::pairwise::PairwiseMatrix;

/// Weights keyed by criterion identifier.
///
/// Ordered so that iterating, averaging and serializing always happen in the same order.
pub type WeightMap = BTreeMap<String, f64>;

/// Whether larger raw values are better (benefit) or worse (cost) for a criterion.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Benefit,
    Cost,
}

/// One node of the criteria catalog.
///
/// The polarity of internal nodes is kept for display but is never used when ranking.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub polarity: Polarity,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Alternative column headers under which this criterion may appear in raw data files.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Criterion {
    pub fn new(id: &str, name: &str, polarity: Polarity, children: &[&str]) -> Criterion {
        Criterion {
            id: id.to_string(),
            name: name.to_string(),
            polarity,
            children: children.iter().map(|c| c.to_string()).collect(),
            description: None,
            aliases: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The decision matrix handed to the TOPSIS ranker.
///
/// `matrix` has one row per alternative and one column per criterion. The weights are
/// used as given and do not need to sum to 1.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopsisInput {
    pub alternatives: Vec<String>,
    pub criteria: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
    pub weights: Vec<f64>,
    pub criteria_types: Vec<Polarity>,
}

impl TopsisInput {
    /// Assembles the input from ranking criteria, keeping their order for the columns.
    pub fn from_criteria(
        alternatives: Vec<String>,
        criteria: &[RankingCriterion],
        matrix: Vec<Vec<f64>>,
    ) -> TopsisInput {
        TopsisInput {
            alternatives,
            criteria: criteria.iter().map(|c| c.name.clone()).collect(),
            matrix,
            weights: criteria.iter().map(|c| c.weight).collect(),
            criteria_types: criteria.iter().map(|c| c.polarity).collect(),
        }
    }
}

/// A leaf criterion selected for ranking, with its consensus weight.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankingCriterion {
    pub id: String,
    pub name: String,
    pub weight: f64,
    pub polarity: Polarity,
    pub aliases: Vec<String>,
}

// ******** Output data structures *********

/// Consistency of one pairwise comparison matrix.
#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyResult {
    #[serde(default)]
    pub consistency_index: f64,
    pub consistency_ratio: f64,
    pub is_consistent: bool,
    #[serde(default)]
    pub max_eigenvalue: f64,
}

impl ConsistencyResult {
    /// The result for matrices too small to be inconsistent.
    pub fn trivial(n: usize) -> ConsistencyResult {
        ConsistencyResult {
            consistency_index: 0.0,
            consistency_ratio: 0.0,
            is_consistent: true,
            max_eigenvalue: n as f64,
        }
    }
}

/// Priority vector and consistency of one comparison matrix.
#[derive(PartialEq, Debug, Clone)]
pub struct AhpResult {
    pub weights: Vec<f64>,
    pub consistency: ConsistencyResult,
}

/// Everything derived from the comparison matrices of one evaluator.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct HierarchyResult {
    /// Local weight of each criterion inside its sibling group.
    pub criteria_weights: WeightMap,
    /// Weight of each leaf relative to the whole hierarchy.
    pub global_weights: WeightMap,
    /// Keyed by the identifier of the node whose children were compared.
    pub consistency_results: BTreeMap<String, ConsistencyResult>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAlternative {
    pub alternative: String,
    pub closeness_coefficient: f64,
    pub rank: u32,
    /// Only used to break near ties (for drivers, the distance driven).
    pub secondary_key: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeDistance {
    pub positive_distance: f64,
    pub negative_distance: f64,
}

/// The ranking together with every intermediate matrix, for audit and export.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopsisDetailedResult {
    pub results: Vec<RankedAlternative>,
    pub decision_matrix: Vec<Vec<f64>>,
    pub normalized_matrix: Vec<Vec<f64>>,
    pub weighted_matrix: Vec<Vec<f64>>,
    pub ideal_solution: Vec<f64>,
    pub negative_ideal_solution: Vec<f64>,
    /// In input order, parallel to `alternatives`.
    pub distances: Vec<AlternativeDistance>,
    pub criteria: Vec<String>,
    pub alternatives: Vec<String>,
    pub weights: Vec<f64>,
    pub criteria_types: Vec<Polarity>,
}

/// Errors that prevent the ranking from running.
///
/// These are the only failures of the numerical pipeline: they all describe a decision
/// matrix whose dimensions do not line up.
#[derive(Debug, Snafu, PartialEq, Eq, Clone)]
#[snafu(visibility(pub(crate)))]
pub enum RankingError {
    #[snafu(display("Invalid decision matrix: it has no rows or no columns"))]
    EmptyMatrix {},
    #[snafu(display(
        "The number of alternatives ({alternatives}) does not match the number of matrix rows ({rows})"
    ))]
    AlternativesMismatch { alternatives: usize, rows: usize },
    #[snafu(display(
        "Row {row} of the decision matrix has {columns} columns, but there are {criteria} criteria"
    ))]
    CriteriaMismatch {
        row: usize,
        columns: usize,
        criteria: usize,
    },
    #[snafu(display(
        "The number of weights ({weights}) does not match the number of criteria ({criteria})"
    ))]
    WeightsMismatch { weights: usize, criteria: usize },
    #[snafu(display(
        "The number of criteria types ({criteria_types}) does not match the number of criteria ({criteria})"
    ))]
    CriteriaTypesMismatch {
        criteria_types: usize,
        criteria: usize,
    },
}

/// Errors when building or editing a comparison matrix.
#[derive(Debug, Snafu, PartialEq, Clone)]
#[snafu(visibility(pub(crate)))]
pub enum MatrixError {
    #[snafu(display("Comparison matrix is not square: row {row} has {len} entries, expected {size}"))]
    NotSquare { row: usize, len: usize, size: usize },
    #[snafu(display("Cannot compare item {index} with itself"))]
    DiagonalComparison { index: usize },
    #[snafu(display("Index {index} is out of range for a {size}x{size} comparison matrix"))]
    IndexOutOfRange { index: usize, size: usize },
    #[snafu(display("Comparison value {value} is not a finite positive number"))]
    InvalidValue { value: f64 },
}

/// Errors found while validating a criteria catalog.
#[derive(Debug, Snafu, PartialEq, Eq, Clone)]
#[snafu(visibility(pub(crate)))]
pub enum CatalogError {
    #[snafu(display("The criteria catalog is empty"))]
    EmptyCatalog {},
    #[snafu(display("Criterion {id} is defined more than once"))]
    DuplicateCriterion { id: String },
    #[snafu(display("Criterion {parent} lists an unknown child {child}"))]
    UnknownChild { parent: String, child: String },
    #[snafu(display("Criterion {id} has more than one parent"))]
    MultipleParents { id: String },
    #[snafu(display("The criteria catalog has no root"))]
    MissingRoot {},
    #[snafu(display("The criteria catalog has several roots: {roots:?}"))]
    MultipleRoots { roots: Vec<String> },
    #[snafu(display("Criterion {id} cannot be reached from the root"))]
    UnreachableCriterion { id: String },
}

/// Comparison matrices of one evaluator, keyed by the node whose children they compare.
pub type HierarchyData = BTreeMap<String, PairwiseMatrix>;
