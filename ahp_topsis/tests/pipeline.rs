use ahp_topsis::*;
use chrono::{TimeZone, Utc};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn driver_catalog() -> CriteriaTree {
    let criteria: Vec<Criterion> =
        serde_json::from_str(include_str!("../../demos/driver_criteria.json")).unwrap();
    CriteriaTree::new(criteria).unwrap()
}

// Every comparison of the sheet set to the same slider position, left item favoured
// for negative positions.
fn uniform_sheet(tree: &CriteriaTree, slider: i32) -> HierarchyData {
    let mut data = tree.initial_hierarchy_data();
    for m in data.values_mut() {
        for i in 0..m.size() {
            for j in (i + 1)..m.size() {
                m.set_slider(i, j, slider).unwrap();
            }
        }
    }
    data
}

#[test]
fn consensus_and_ranking() {
    init();
    let tree = driver_catalog();
    let now = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();

    let neutral = Evaluation::from_hierarchy("e1", "manager", &tree, uniform_sheet(&tree, 0), now);
    let skewed = Evaluation::from_hierarchy("e2", "safety", &tree, uniform_sheet(&tree, -2), now);
    for ev in [&neutral, &skewed] {
        let total: f64 = ev.global_weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(ev.global_weights.len(), tree.leaves().count());
    }
    assert!((neutral.global_weights["attendance"] - 0.125).abs() < 1e-12);
    // Favouring the first item everywhere: the administrative side dominates.
    assert!(skewed.global_weights["attendance"] > skewed.global_weights["acceleration"]);

    let consensus = calculate_average_weights(&[neutral.clone(), skewed.clone()]);
    let criteria = ranking_criteria(&tree, &consensus);
    assert_eq!(criteria.len(), tree.leaves().count());
    assert_eq!(criteria[0].id, "attendance");
    assert_eq!(criteria[0].polarity, Polarity::Cost);

    // Three drivers: the same on every criterion except speeding.
    let speed_col = criteria.iter().position(|c| c.id == "speed").unwrap();
    let mut matrix = vec![vec![1.0; criteria.len()]; 3];
    matrix[0][speed_col] = 9.0;
    matrix[1][speed_col] = 2.0;
    matrix[2][speed_col] = 5.0;
    let input = TopsisInput::from_criteria(
        vec!["D-1".to_string(), "D-2".to_string(), "D-3".to_string()],
        &criteria,
        matrix,
    );
    let results = rank(&input).unwrap();
    assert_eq!(
        results.iter().map(|r| r.alternative.as_str()).collect::<Vec<_>>(),
        vec!["D-2", "D-3", "D-1"]
    );
    assert_eq!(results[0].closeness_coefficient, 1.0);
    assert_eq!(results[2].closeness_coefficient, 0.0);
}

#[test]
fn partial_sheet_ranks_on_what_was_compared() {
    init();
    let tree = driver_catalog();
    let now = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
    let mut data = tree.initial_hierarchy_data();
    data.remove("technical");
    let ev = Evaluation::from_hierarchy("e3", "partial", &tree, data, now);
    assert_eq!(ev.global_weights["idle"], 0.0);
    assert!(!ev.consistency_results.contains_key("technical"));

    let criteria = ranking_criteria(&tree, &calculate_average_weights(&[ev]));
    assert!(criteria.iter().all(|c| c.id != "idle"));
    let total: f64 = criteria.iter().map(|c| c.weight).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn evaluation_round_trip_through_json() {
    let tree = driver_catalog();
    let now = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
    let ev = Evaluation::from_hierarchy("e4", "dispatcher", &tree, uniform_sheet(&tree, 3), now);
    let js = serde_json::to_string_pretty(&ev).unwrap();
    let back: Evaluation = serde_json::from_str(&js).unwrap();
    assert_eq!(back, ev);
}
