use std::collections::BTreeMap;

use log::{debug, info};

use crate::config::*;
use crate::evaluation::Evaluation;
use crate::hierarchy::CriteriaTree;

/// The consensus weights of a group of evaluators.
///
/// For every criterion that appears in at least one evaluation, the consensus is the
/// mean of the strictly positive global weights it received. A weight of 0 means the
/// evaluator never rated the criterion and does not pull the mean down. The result is
/// not renormalized.
///
/// ```
/// use ahp_topsis::{average_weight_maps, WeightMap};
///
/// let first: WeightMap = [("speed".to_string(), 0.4)].into_iter().collect();
/// let second: WeightMap = [("speed".to_string(), 0.0)].into_iter().collect();
/// let consensus = average_weight_maps([&first, &second]);
/// assert_eq!(consensus["speed"], 0.4);
/// ```
pub fn calculate_average_weights(evaluations: &[Evaluation]) -> WeightMap {
    let res = average_weight_maps(evaluations.iter().map(|e| &e.global_weights));
    info!(
        "Consensus of {} evaluation(s) over {} criteria",
        evaluations.len(),
        res.len()
    );
    res
}

pub fn average_weight_maps<'a, I>(maps: I) -> WeightMap
where
    I: IntoIterator<Item = &'a WeightMap>,
{
    // (sum, count) of the positive values
    let mut acc: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for m in maps {
        for (id, w) in m.iter() {
            let e = acc.entry(id.as_str()).or_insert((0.0, 0));
            if *w > 0.0 && w.is_finite() {
                e.0 += w;
                e.1 += 1;
            }
        }
    }
    acc.into_iter()
        .map(|(id, (total, count))| {
            let mean = if count == 0 { 0.0 } else { total / count as f64 };
            (id.to_string(), mean)
        })
        .collect()
}

/// The evaluations whose id is in `ids`, in their original order.
pub fn select_evaluations<'a>(evaluations: &'a [Evaluation], ids: &[String]) -> Vec<&'a Evaluation> {
    let res: Vec<&Evaluation> = evaluations
        .iter()
        .filter(|e| ids.iter().any(|id| *id == e.id))
        .collect();
    debug!(
        "select_evaluations: {} of {} selected",
        res.len(),
        evaluations.len()
    );
    res
}

/// The leaf criteria used as TOPSIS columns: those with a positive consensus weight,
/// in catalog order.
pub fn ranking_criteria(tree: &CriteriaTree, consensus: &WeightMap) -> Vec<RankingCriterion> {
    tree.leaves()
        .filter_map(|c| match consensus.get(&c.id) {
            Some(w) if *w > 0.0 => Some(RankingCriterion {
                id: c.id.clone(),
                name: c.name.clone(),
                weight: *w,
                polarity: c.polarity,
                aliases: c.aliases.clone(),
            }),
            _ => None,
        })
        .collect()
}
