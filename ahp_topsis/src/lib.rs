//! Multi-criteria ranking with the Analytic Hierarchy Process (AHP) and TOPSIS.
//!
//! Evaluators compare criteria pairwise, node by node, in a tree of criteria. Each
//! comparison matrix gives local weights and a consistency ratio; the local weights are
//! multiplied down the tree into global weights for the leaf criteria. The global weights
//! of several evaluators are averaged into a consensus, which weighs the columns of a
//! decision matrix ranked with TOPSIS.
//!
//! Everything in this crate is synchronous and free of side effects. The only hard
//! failures are [RankingError] (decision matrix with mismatched dimensions) and the
//! validation errors raised when building the inputs ([MatrixError], [CatalogError]).
//!
//! ```
//! use ahp_topsis::*;
//!
//! let tree = CriteriaTree::new(vec![
//!     Criterion::new("goal", "Best driver", Polarity::Benefit, &["km", "incidents"]),
//!     Criterion::new("km", "Distance", Polarity::Benefit, &[]),
//!     Criterion::new("incidents", "Incidents", Polarity::Cost, &[]),
//! ])?;
//! let mut comparisons = tree.initial_hierarchy_data();
//! if let Some(m) = comparisons.get_mut("goal") {
//!     // Incidents matter three times as much as distance.
//!     m.set_comparison(1, 0, 3.0)?;
//! }
//! let result = evaluate_hierarchy(&tree, &comparisons);
//! let criteria = ranking_criteria(&tree, &result.global_weights);
//! let input = TopsisInput::from_criteria(
//!     vec!["ana".to_string(), "ben".to_string()],
//!     &criteria,
//!     vec![vec![1200.0, 1.0], vec![1500.0, 4.0]],
//! );
//! let ranking = rank(&input)?;
//! assert_eq!(ranking[0].alternative, "ana");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod ahp;
mod averaging;
mod config;
mod evaluation;
mod hierarchy;
mod pairwise;
mod topsis;

pub use crate::ahp::*;
pub use crate::averaging::*;
pub use crate::config::*;
pub use crate::evaluation::*;
pub use crate::hierarchy::*;
pub use crate::pairwise::*;
pub use crate::topsis::*;
