//! The criteria catalog and the aggregation of local weights into global leaf weights.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};
use snafu::prelude::*;

use crate::ahp::solve;
use crate::config::*;
use crate::pairwise::PairwiseMatrix;

type NodeId = usize;

#[derive(Debug, Clone)]
struct CriterionNode {
    criterion: Criterion,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An immutable, validated tree of criteria.
///
/// The nodes live in a flat arena in catalog order and refer to each other by index.
/// Invariants checked at construction: identifiers are unique, there is exactly one
/// root, every other node has exactly one parent and can be reached from the root.
#[derive(Debug, Clone)]
pub struct CriteriaTree {
    nodes: Vec<CriterionNode>,
    index: HashMap<String, NodeId>,
    root: NodeId,
}

impl CriteriaTree {
    pub fn new(criteria: Vec<Criterion>) -> Result<CriteriaTree, CatalogError> {
        ensure!(!criteria.is_empty(), EmptyCatalogSnafu {});

        let mut index: HashMap<String, NodeId> = HashMap::new();
        for (idx, c) in criteria.iter().enumerate() {
            if index.insert(c.id.clone(), idx).is_some() {
                return DuplicateCriterionSnafu { id: c.id.clone() }.fail();
            }
        }

        let mut parents: Vec<Option<NodeId>> = vec![None; criteria.len()];
        let mut children: Vec<Vec<NodeId>> = Vec::with_capacity(criteria.len());
        for (parent_idx, c) in criteria.iter().enumerate() {
            let mut child_ids: Vec<NodeId> = Vec::with_capacity(c.children.len());
            for child in c.children.iter() {
                let child_idx = *index.get(child).context(UnknownChildSnafu {
                    parent: c.id.clone(),
                    child: child.clone(),
                })?;
                ensure!(
                    parents[child_idx].is_none(),
                    MultipleParentsSnafu { id: child.clone() }
                );
                parents[child_idx] = Some(parent_idx);
                child_ids.push(child_idx);
            }
            children.push(child_ids);
        }

        let roots: Vec<NodeId> = parents
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| if p.is_none() { Some(idx) } else { None })
            .collect();
        let root = match roots.as_slice() {
            [] => return MissingRootSnafu {}.fail(),
            [r] => *r,
            _ => {
                return MultipleRootsSnafu {
                    roots: roots
                        .iter()
                        .map(|idx| criteria[*idx].id.clone())
                        .collect::<Vec<String>>(),
                }
                .fail()
            }
        };

        // A cycle that does not touch the root still gives every node one parent.
        let mut seen = vec![false; criteria.len()];
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if !seen[idx] {
                seen[idx] = true;
                stack.extend(children[idx].iter().copied());
            }
        }
        if let Some(idx) = seen.iter().position(|s| !s) {
            return UnreachableCriterionSnafu {
                id: criteria[idx].id.clone(),
            }
            .fail();
        }

        let nodes: Vec<CriterionNode> = criteria
            .into_iter()
            .zip(parents.into_iter().zip(children.into_iter()))
            .map(|(criterion, (parent, children))| CriterionNode {
                criterion,
                parent,
                children,
            })
            .collect();
        info!(
            "Criteria catalog: {} criteria, root {:?}",
            nodes.len(),
            nodes[root].criterion.id
        );
        Ok(CriteriaTree { nodes, index, root })
    }

    pub fn root(&self) -> &Criterion {
        &self.nodes[self.root].criterion
    }

    pub fn get(&self, id: &str) -> Option<&Criterion> {
        self.index.get(id).map(|idx| &self.nodes[*idx].criterion)
    }

    /// All the criteria, in catalog order.
    pub fn criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.nodes.iter().map(|n| &n.criterion)
    }

    /// The leaf criteria, in catalog order.
    pub fn leaves(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria().filter(|c| c.is_leaf())
    }

    /// The nodes whose children are compared pairwise (those with at least two children).
    pub fn comparison_nodes(&self) -> impl Iterator<Item = &Criterion> {
        self.nodes
            .iter()
            .filter(|n| n.children.len() >= 2)
            .map(|n| &n.criterion)
    }

    pub fn parent(&self, id: &str) -> Option<&Criterion> {
        let idx = *self.index.get(id)?;
        self.nodes[idx].parent.map(|p| &self.nodes[p].criterion)
    }

    pub fn children(&self, id: &str) -> Vec<&Criterion> {
        match self.index.get(id) {
            Some(idx) => self.nodes[*idx]
                .children
                .iter()
                .map(|c| &self.nodes[*c].criterion)
                .collect(),
            None => Vec::new(),
        }
    }

    /// The criteria from the root down to `id` (both included). Empty for unknown ids.
    pub fn path(&self, id: &str) -> Vec<&Criterion> {
        let mut res: Vec<&Criterion> = Vec::new();
        let mut current = self.index.get(id).copied();
        while let Some(idx) = current {
            res.push(&self.nodes[idx].criterion);
            current = self.nodes[idx].parent;
        }
        res.reverse();
        res
    }

    /// The polarity of a criterion, benefit when it is unknown.
    pub fn polarity(&self, id: &str) -> Polarity {
        self.get(id).map(|c| c.polarity).unwrap_or_default()
    }

    /// An all-ones comparison matrix for every comparison node.
    pub fn initial_hierarchy_data(&self) -> HierarchyData {
        self.nodes
            .iter()
            .filter(|n| n.children.len() >= 2)
            .map(|n| {
                (
                    n.criterion.id.clone(),
                    PairwiseMatrix::new(n.children.len()),
                )
            })
            .collect()
    }
}

/// Multiplies local weights down the tree into global leaf weights.
///
/// The global weight of a leaf is the product of the local weights of every node between
/// the root (excluded) and the leaf (included). A leaf with a missing local weight on its
/// path gets 0. The result is normalized to sum to 1, unless every leaf is at 0.
pub fn aggregate(tree: &CriteriaTree, local_weights: &WeightMap) -> WeightMap {
    let mut global: WeightMap = BTreeMap::new();
    for (idx, node) in tree.nodes.iter().enumerate() {
        if !node.children.is_empty() {
            continue;
        }
        let mut weight = 1.0;
        let mut current = idx;
        while let Some(parent) = tree.nodes[current].parent {
            match local_weights.get(&tree.nodes[current].criterion.id) {
                Some(w) if w.is_finite() && *w >= 0.0 => {
                    weight *= w;
                }
                _ => {
                    debug!(
                        "aggregate: no local weight for {:?}, leaf {:?} scores 0",
                        tree.nodes[current].criterion.id, node.criterion.id
                    );
                    weight = 0.0;
                    break;
                }
            }
            current = parent;
        }
        global.insert(node.criterion.id.clone(), weight);
    }

    let total: f64 = global.values().sum();
    debug!("aggregate: raw total of global weights: {}", total);
    if total > 0.0 {
        for w in global.values_mut() {
            *w /= total;
        }
    }
    global
}

/// Solves every comparison matrix of an evaluator and aggregates the result.
///
/// The weights of a matrix are assigned to the children of its node in catalog order.
/// The only child of a node gets a local weight of 1. A node whose matrix is missing or
/// does not match its number of children is skipped: the leaves below it score 0 until
/// the evaluation is completed.
pub fn evaluate_hierarchy(tree: &CriteriaTree, hierarchy_data: &HierarchyData) -> HierarchyResult {
    let mut criteria_weights: WeightMap = BTreeMap::new();
    let mut consistency_results: BTreeMap<String, ConsistencyResult> = BTreeMap::new();

    for node in tree.nodes.iter() {
        let node_id = &node.criterion.id;
        match node.children.as_slice() {
            [] => {}
            [only_child] => {
                criteria_weights.insert(tree.nodes[*only_child].criterion.id.clone(), 1.0);
            }
            children => match hierarchy_data.get(node_id) {
                Some(matrix) if matrix.size() == children.len() => {
                    let res = solve(matrix);
                    debug!(
                        "evaluate_hierarchy: node {:?} weights: {:?} consistency: {:?}",
                        node_id, res.weights, res.consistency
                    );
                    for (child, w) in children.iter().zip(res.weights.iter()) {
                        criteria_weights.insert(tree.nodes[*child].criterion.id.clone(), *w);
                    }
                    consistency_results.insert(node_id.clone(), res.consistency);
                }
                Some(matrix) => {
                    warn!(
                        "evaluate_hierarchy: node {:?} has {} children but its comparison matrix has size {}, skipping",
                        node_id,
                        children.len(),
                        matrix.size()
                    );
                }
                None => {
                    warn!(
                        "evaluate_hierarchy: no comparison matrix for node {:?}, skipping",
                        node_id
                    );
                }
            },
        }
    }

    let global_weights = aggregate(tree, &criteria_weights);
    HierarchyResult {
        criteria_weights,
        global_weights,
        consistency_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // goal -> (cost_side -> (fuel, repairs), comfort)
    fn small_tree() -> CriteriaTree {
        CriteriaTree::new(vec![
            Criterion::new("goal", "Goal", Polarity::Benefit, &["cost_side", "comfort"]),
            Criterion::new("cost_side", "Costs", Polarity::Cost, &["fuel", "repairs"]),
            Criterion::new("comfort", "Comfort", Polarity::Benefit, &[]),
            Criterion::new("fuel", "Fuel", Polarity::Cost, &[]),
            Criterion::new("repairs", "Repairs", Polarity::Cost, &[]),
        ])
        .unwrap()
    }

    fn total(m: &WeightMap) -> f64 {
        m.values().sum()
    }

    #[test]
    fn tree_navigation() {
        let tree = small_tree();
        assert_eq!(tree.root().id, "goal");
        assert_eq!(
            tree.leaves().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            vec!["comfort", "fuel", "repairs"]
        );
        assert_eq!(
            tree.path("repairs")
                .iter()
                .map(|c| c.id.as_str())
                .collect::<Vec<_>>(),
            vec!["goal", "cost_side", "repairs"]
        );
        assert_eq!(tree.parent("fuel").map(|c| c.id.as_str()), Some("cost_side"));
        assert_eq!(tree.parent("goal"), None);
        assert_eq!(tree.children("goal").len(), 2);
        assert_eq!(tree.polarity("fuel"), Polarity::Cost);
        assert_eq!(tree.polarity("unknown"), Polarity::Benefit);
        assert!(tree.path("unknown").is_empty());

        let data = tree.initial_hierarchy_data();
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["cost_side", "goal"]);
        assert_eq!(data["goal"], PairwiseMatrix::new(2));
    }

    #[test]
    fn catalog_validation() {
        assert_eq!(
            CriteriaTree::new(vec![]).unwrap_err(),
            CatalogError::EmptyCatalog {}
        );
        assert_eq!(
            CriteriaTree::new(vec![
                Criterion::new("a", "A", Polarity::Benefit, &["b"]),
                Criterion::new("a", "A", Polarity::Benefit, &[]),
            ])
            .unwrap_err(),
            CatalogError::DuplicateCriterion { id: "a".to_string() }
        );
        assert_eq!(
            CriteriaTree::new(vec![Criterion::new("a", "A", Polarity::Benefit, &["z"])])
                .unwrap_err(),
            CatalogError::UnknownChild {
                parent: "a".to_string(),
                child: "z".to_string()
            }
        );
        assert_eq!(
            CriteriaTree::new(vec![
                Criterion::new("a", "A", Polarity::Benefit, &["c", "b"]),
                Criterion::new("b", "B", Polarity::Benefit, &["c"]),
                Criterion::new("c", "C", Polarity::Benefit, &[]),
            ])
            .unwrap_err(),
            CatalogError::MultipleParents { id: "c".to_string() }
        );
        assert_eq!(
            CriteriaTree::new(vec![
                Criterion::new("a", "A", Polarity::Benefit, &[]),
                Criterion::new("b", "B", Polarity::Benefit, &[]),
            ])
            .unwrap_err(),
            CatalogError::MultipleRoots {
                roots: vec!["a".to_string(), "b".to_string()]
            }
        );
        assert_eq!(
            CriteriaTree::new(vec![
                Criterion::new("a", "A", Polarity::Benefit, &["b"]),
                Criterion::new("b", "B", Polarity::Benefit, &["a"]),
            ])
            .unwrap_err(),
            CatalogError::MissingRoot {}
        );
        assert_eq!(
            CriteriaTree::new(vec![
                Criterion::new("root", "Root", Polarity::Benefit, &[]),
                Criterion::new("x", "X", Polarity::Benefit, &["y"]),
                Criterion::new("y", "Y", Polarity::Benefit, &["x"]),
            ])
            .unwrap_err(),
            CatalogError::UnreachableCriterion { id: "x".to_string() }
        );
    }

    #[test]
    fn global_weights_multiply_along_the_path() {
        init();
        let tree = small_tree();
        let mut local = WeightMap::new();
        local.insert("cost_side".to_string(), 0.75);
        local.insert("comfort".to_string(), 0.25);
        local.insert("fuel".to_string(), 0.4);
        local.insert("repairs".to_string(), 0.6);
        let global = aggregate(&tree, &local);
        assert!((global["fuel"] - 0.3).abs() < 1e-12);
        assert!((global["repairs"] - 0.45).abs() < 1e-12);
        assert!((global["comfort"] - 0.25).abs() < 1e-12);
        assert!((total(&global) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_local_weights_score_zero() {
        init();
        let tree = small_tree();
        let mut local = WeightMap::new();
        local.insert("cost_side".to_string(), 0.75);
        local.insert("comfort".to_string(), 0.25);
        let global = aggregate(&tree, &local);
        assert_eq!(global["fuel"], 0.0);
        assert_eq!(global["repairs"], 0.0);
        // Renormalized over what is known.
        assert!((global["comfort"] - 1.0).abs() < 1e-12);

        let nothing = aggregate(&tree, &WeightMap::new());
        assert_eq!(nothing.len(), 3);
        assert!(nothing.values().all(|w| *w == 0.0));
    }

    #[test]
    fn evaluate_full_hierarchy() {
        init();
        let tree = small_tree();
        let mut data = tree.initial_hierarchy_data();
        data.get_mut("goal").unwrap().set_comparison(0, 1, 3.0).unwrap();
        data.get_mut("cost_side")
            .unwrap()
            .set_comparison(1, 0, 4.0)
            .unwrap();
        let res = evaluate_hierarchy(&tree, &data);
        assert!((res.criteria_weights["cost_side"] - 0.75).abs() < 1e-12);
        assert!((res.criteria_weights["repairs"] - 0.8).abs() < 1e-12);
        assert!((res.global_weights["repairs"] - 0.6).abs() < 1e-12);
        assert!((res.global_weights["fuel"] - 0.15).abs() < 1e-12);
        assert!((total(&res.global_weights) - 1.0).abs() < 1e-9);
        assert_eq!(res.consistency_results.len(), 2);
        assert!(res.consistency_results.values().all(|c| c.is_consistent));
        assert_eq!(res, evaluate_hierarchy(&tree, &data));
    }

    #[test]
    fn incomplete_or_mismatched_matrices_are_skipped() {
        init();
        let tree = small_tree();
        let mut data = HierarchyData::new();
        data.insert("goal".to_string(), PairwiseMatrix::new(2));
        data.insert("cost_side".to_string(), PairwiseMatrix::new(3));
        let res = evaluate_hierarchy(&tree, &data);
        assert_eq!(res.global_weights["fuel"], 0.0);
        assert_eq!(res.global_weights["comfort"], 1.0);
        assert!(!res.consistency_results.contains_key("cost_side"));
    }

    #[test]
    fn single_child_gets_full_weight() {
        let tree = CriteriaTree::new(vec![
            Criterion::new("goal", "Goal", Polarity::Benefit, &["only"]),
            Criterion::new("only", "Only", Polarity::Benefit, &["leaf"]),
            Criterion::new("leaf", "Leaf", Polarity::Cost, &[]),
        ])
        .unwrap();
        assert!(tree.initial_hierarchy_data().is_empty());
        let res = evaluate_hierarchy(&tree, &HierarchyData::new());
        assert_eq!(res.global_weights["leaf"], 1.0);
        assert!(res.consistency_results.is_empty());
    }
}
