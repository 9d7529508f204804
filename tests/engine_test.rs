//! Properties of the aggregation engine that must hold across every chart.

use mortality_insight::models::{Aggregate, Field, FlatRecord, Metric, RankedEdge, OTHER_LABEL};
use mortality_insight::services::flow_graph::{self, FlowConfig};
use mortality_insight::services::grouping::{reduce, reduce_per_period, GroupKey};
use mortality_insight::services::normalize::{normalize, normalize_by_period};
use mortality_insight::services::pivot::pivot;
use mortality_insight::services::top_n::collapse;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn random_records(rng: &mut StdRng, len: usize) -> Vec<FlatRecord> {
    (0..len)
        .map(|_| {
            let period = format!("2024-{:02}", rng.gen_range(1..=4));
            let code = format!("C{}", rng.gen_range(0..6));
            let level1 = format!("L{}", rng.gen_range(0..3));
            FlatRecord::new()
                .with("period", period)
                .with("category_code", code.as_str())
                .with("category_short_name", format!("short {}", code))
                .with("level1_name", level1)
                .with("count", rng.gen_range(0..50) as f64)
        })
        .collect()
}

fn scenario_records() -> Vec<FlatRecord> {
    [("2024-01", "A", 10.0), ("2024-01", "B", 30.0), ("2024-02", "A", 5.0)]
        .into_iter()
        .map(|(period, code, value)| {
            FlatRecord::new()
                .with("period", period)
                .with("category_code", code)
                .with("value", value)
        })
        .collect()
}

#[test]
fn test_scenario_a_reduce_and_normalize() {
    let records = scenario_records();

    let aggregates = reduce(&records, GroupKey::Code, Metric::Value);
    let values: Vec<(&str, f64)> = aggregates
        .iter()
        .map(|a| (a.key.as_str(), a.value))
        .collect();
    assert_eq!(values, vec![("A", 15.0), ("B", 30.0)]);

    let periods = reduce_per_period(&records, Field::Period, GroupKey::Code, Metric::Value);
    let shares = normalize_by_period(&periods);
    assert_eq!(shares[0].period, "2024-01");
    let january: Vec<(&str, f64)> = shares[0]
        .shares
        .iter()
        .map(|s| (s.key.as_str(), s.share))
        .collect();
    assert_eq!(january, vec![("A", 0.25), ("B", 0.75)]);
}

#[test]
fn test_scenario_b_collapse_edges() {
    let edges = vec![
        RankedEdge::new("X", "a", 50.0),
        RankedEdge::new("X", "b", 30.0),
        RankedEdge::new("X", "c", 5.0),
    ];

    let collapsed = collapse(edges, 1);

    assert_eq!(collapsed.kept, vec![RankedEdge::new("X", "a", 50.0)]);
    assert_eq!(
        collapsed.overflow,
        vec![RankedEdge::new("X", "Andre kategorier", 35.0)]
    );
}

#[test]
fn test_scenario_c_flow_graph_below_threshold() {
    let records = vec![
        FlatRecord::new()
            .with("level1_name", "X")
            .with("category_short_name", "a")
            .with("count", 3.0),
        FlatRecord::new()
            .with("level1_name", "X")
            .with("category_short_name", "b")
            .with("count", 4.0),
    ];
    let config = FlowConfig {
        min_threshold: 5.0,
        ..Default::default()
    };

    let graph = flow_graph::build(&records, &config);

    assert!(graph.nodes.is_empty());
    assert!(graph.links.is_empty());
    assert_eq!(graph.total_value, 0.0);
}

#[test]
fn test_scenario_d_pivot_last_write_wins() {
    let records = vec![
        FlatRecord::new()
            .with("period", "2024-01")
            .with("category_code", "A")
            .with("count", 10.0),
        FlatRecord::new()
            .with("period", "2024-01")
            .with("category_code", "A")
            .with("count", 20.0),
    ];

    let table = pivot(&records, Field::Period, Field::CategoryCode, Metric::Count);

    assert_eq!(table.rows[0].get("A"), Some(20.0));
}

#[test]
fn test_mass_conservation() {
    let mut rng = StdRng::seed_from_u64(7);
    for round in 0..50 {
        let len = rng.gen_range(0..20);
        let edges: Vec<RankedEdge> = (0..len)
            .map(|_| {
                RankedEdge::new(
                    format!("S{}", rng.gen_range(0..4)),
                    format!("T{}", rng.gen_range(0..10)),
                    rng.gen_range(0..1000) as f64 / 7.0,
                )
            })
            .collect();
        let total: f64 = edges.iter().map(|e| e.value).sum();
        let n = rng.gen_range(0..8);

        let collapsed = collapse(edges, n);

        assert!(
            (collapsed.total() - total).abs() < 1e-9,
            "round {}: {} != {}",
            round,
            collapsed.total(),
            total
        );
        assert!(collapsed.kept.len() <= n);
        assert!(collapsed.overflow.iter().all(|e| e.target == OTHER_LABEL));
    }
}

#[test]
fn test_collapse_aggregates_mass_conservation() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..50 {
        let len = rng.gen_range(0..15);
        let aggregates: Vec<Aggregate> = (0..len)
            .map(|i| Aggregate::new(format!("k{}", i), "", rng.gen_range(0..100) as f64 + 0.5))
            .collect();
        let total: f64 = aggregates.iter().map(|a| a.value).sum();

        let collapsed = collapse(aggregates, rng.gen_range(0..5));

        assert!((collapsed.total() - total).abs() < 1e-9);
        assert!(collapsed.overflow.len() <= 1);
    }
}

#[test]
fn test_normalization_bound() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..50 {
        let len = rng.gen_range(0..10);
        let aggregates: Vec<Aggregate> = (0..len)
            .map(|i| Aggregate::new(format!("k{}", i), "", rng.gen_range(0..5) as f64))
            .collect();
        let total: f64 = aggregates.iter().map(|a| a.value).sum();

        let shares = normalize(&aggregates);

        assert!(shares.iter().all(|s| (0.0..=1.0).contains(&s.share)));
        let share_sum: f64 = shares.iter().map(|s| s.share).sum();
        if total > 0.0 {
            assert!((share_sum - 1.0).abs() < 1e-9);
        } else {
            assert!(shares.iter().all(|s| s.share == 0.0));
        }
    }
}

#[test]
fn test_pivot_column_completeness() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..20 {
        let len = rng.gen_range(0..30);
        let records = random_records(&mut rng, len);

        let table = pivot(&records, Field::Period, Field::CategoryCode, Metric::Count);

        for record in &records {
            let code = record.text(Field::CategoryCode).unwrap();
            assert!(table.columns.contains(&code));
        }
        for row in &table.rows {
            for column in &table.columns {
                assert!(row.cells.contains_key(column));
            }
        }
    }
}

fn sorted_totals(records: &[FlatRecord], group_key: GroupKey) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = reduce(records, group_key, Metric::Count)
        .into_iter()
        .map(|a| (a.key, a.value))
        .collect();
    totals.sort_by(|a, b| a.0.cmp(&b.0));
    totals
}

#[test]
fn test_reduce_is_order_independent() {
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let records = random_records(&mut rng, 60);

        let mut shuffled = records.clone();
        shuffled.shuffle(&mut rng);

        for group_key in [GroupKey::Level1, GroupKey::Code, GroupKey::Category] {
            assert_eq!(
                sorted_totals(&records, group_key),
                sorted_totals(&shuffled, group_key),
                "seed {}",
                seed
            );
        }
    }
}

#[test]
fn test_flow_graph_nodes_match_links() {
    let mut rng = StdRng::seed_from_u64(9);
    let records = random_records(&mut rng, 80);
    let config = FlowConfig {
        target_field: Field::CategoryCode,
        top_n: 4,
        ..Default::default()
    };

    let graph = flow_graph::build(&records, &config);

    let link_total: f64 = graph.links.iter().map(|l| l.value).sum();
    assert!((link_total - graph.total_value).abs() < 1e-9);
    for node in &graph.nodes {
        let incident: f64 = graph
            .links
            .iter()
            .filter(|l| l.source == node.name || l.target == node.name)
            .map(|l| l.value)
            .sum();
        assert!((incident - node.value).abs() < 1e-9, "{}", node.name);
    }
}
