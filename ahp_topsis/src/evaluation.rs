use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::*;
use crate::hierarchy::{evaluate_hierarchy, CriteriaTree};

/// The comparisons of one evaluator and the weights derived from them.
///
/// This is the persisted record: the comparison matrices are the source of truth and
/// the weights are recomputed from them whenever they change.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: String,
    pub user_name: String,
    pub criteria_weights: WeightMap,
    pub global_weights: WeightMap,
    pub consistency_results: BTreeMap<String, ConsistencyResult>,
    pub hierarchy_data: HierarchyData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn from_hierarchy(
        id: &str,
        user_name: &str,
        tree: &CriteriaTree,
        hierarchy_data: HierarchyData,
        now: DateTime<Utc>,
    ) -> Evaluation {
        let res = evaluate_hierarchy(tree, &hierarchy_data);
        info!(
            "Evaluation {:?} by {:?}: {} global weights, {} inconsistent node(s)",
            id,
            user_name,
            res.global_weights.len(),
            res.consistency_results
                .values()
                .filter(|c| !c.is_consistent)
                .count()
        );
        Evaluation {
            id: id.to_string(),
            user_name: user_name.to_string(),
            criteria_weights: res.criteria_weights,
            global_weights: res.global_weights,
            consistency_results: res.consistency_results,
            hierarchy_data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the comparisons and recomputes the weights. The id and the creation
    /// time are kept.
    pub fn recompute(
        &mut self,
        tree: &CriteriaTree,
        hierarchy_data: HierarchyData,
        now: DateTime<Utc>,
    ) {
        let res = evaluate_hierarchy(tree, &hierarchy_data);
        self.criteria_weights = res.criteria_weights;
        self.global_weights = res.global_weights;
        self.consistency_results = res.consistency_results;
        self.hierarchy_data = hierarchy_data;
        self.updated_at = now;
    }

    /// True when every solved comparison matrix is acceptably consistent.
    pub fn is_consistent(&self) -> bool {
        self.consistency_results.values().all(|c| c.is_consistent)
    }

    /// The nodes whose comparisons should be revised, with their consistency ratio.
    pub fn inconsistent_nodes(&self) -> Vec<(&str, f64)> {
        self.consistency_results
            .iter()
            .filter(|(_, c)| !c.is_consistent)
            .map(|(id, c)| (id.as_str(), c.consistency_ratio))
            .collect()
    }
}
