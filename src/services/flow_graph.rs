//! Two-level flow graph (level-1 category -> sub-category) for sankey views.
//!
//! Records are thresholded and summed into edges, the edges are collapsed to
//! the top N with one "Andre kategorier" edge per source, and node weights
//! are re-derived from the surviving edges so nodes and links always agree.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::models::{Field, FlatRecord, Metric, RankedEdge};
use crate::services::top_n::{collapse, Rankable};

/// Suffix appended to a target node whose name collides with a source node.
pub const TARGET_COLLISION_SUFFIX: &str = " (sub)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnit {
    Kg,
    Tonnes,
}

impl WeightUnit {
    fn grams_per_unit(&self) -> f64 {
        match self {
            Self::Kg => 1_000.0,
            Self::Tonnes => 1_000_000.0,
        }
    }
}

/// How an edge weight is derived from a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueSelector {
    #[default]
    Count,
    /// `count * avg_weight_grams` converted to the given unit.
    Weight(WeightUnit),
    Rate,
}

impl ValueSelector {
    /// Parse a metric/unit pair such as `("weight", Some("tonnes"))`. The unit
    /// only applies to weight and defaults to kilograms.
    pub fn parse(value: &str, unit: Option<&str>) -> Result<Self, String> {
        match (value, unit) {
            ("count", None | Some("")) => Ok(Self::Count),
            ("rate", None | Some("")) => Ok(Self::Rate),
            ("weight", None | Some("") | Some("kg")) => Ok(Self::Weight(WeightUnit::Kg)),
            ("weight", Some("tonnes")) => Ok(Self::Weight(WeightUnit::Tonnes)),
            ("weight", Some(other)) => Err(format!("Unknown weight unit '{}'", other)),
            ("count" | "rate", Some(other)) => {
                Err(format!("Unit '{}' does not apply to '{}'", other, value))
            }
            (other, _) => Err(format!("Unknown flow value '{}'", other)),
        }
    }

    pub fn select(&self, record: &FlatRecord) -> Option<f64> {
        match self {
            Self::Count => record.number(Metric::Count),
            Self::Rate => record.number(Metric::Rate),
            Self::Weight(unit) => {
                let count = record.number(Metric::Count)?;
                let grams = record.number(Metric::AvgWeightGrams)?;
                Some(count * grams / unit.grams_per_unit())
            }
        }
    }
}

impl FromStr for ValueSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, None)
    }
}

#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub source_field: Field,
    pub target_field: Field,
    pub value: ValueSelector,
    pub min_threshold: f64,
    pub top_n: usize,
    /// Append `" (12.5%)"` style share-of-total suffixes to node labels.
    pub decorate_labels: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            source_field: Field::Level1Name,
            target_field: Field::CategoryShortName,
            value: ValueSelector::Count,
            min_threshold: 0.0,
            top_n: 8,
            decorate_labels: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Source,
    Target,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    /// Identity used by links. Never decorated.
    pub name: String,
    pub label: String,
    pub value: f64,
    pub role: NodeRole,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<RankedEdge>,
    pub total_value: f64,
    #[serde(skip)]
    contributors: HashMap<(String, String), Vec<FlatRecord>>,
}

impl FlowGraph {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Records behind a link, for drill-down. The overflow link of a source
    /// carries every record that was folded into it.
    pub fn records_for(&self, source: &str, target: &str) -> &[FlatRecord] {
        self.contributors
            .get(&(source.to_string(), target.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// An edge under construction together with the records that fed it.
struct EdgeGroup {
    edge: RankedEdge,
    records: Vec<FlatRecord>,
}

impl Rankable for EdgeGroup {
    fn weight(&self) -> f64 {
        self.edge.value
    }

    fn overflow_group(&self) -> String {
        self.edge.source.clone()
    }

    fn fold_overflow(group: String, members: Vec<Self>) -> Self {
        let mut records = Vec::new();
        let mut edges = Vec::with_capacity(members.len());
        for member in members {
            records.extend(member.records);
            edges.push(member.edge);
        }
        EdgeGroup {
            edge: RankedEdge::fold_overflow(group, edges),
            records,
        }
    }

    fn same_slot(&self, other: &Self) -> bool {
        self.edge.same_slot(&other.edge)
    }

    fn absorb(&mut self, other: Self) {
        self.edge.absorb(other.edge);
        self.records.extend(other.records);
    }
}

/// Build the source -> target flow graph for `records`.
///
/// Records below `min_threshold` or without a positive value are dropped, the
/// remaining pairs are summed into edges and collapsed to the top
/// `config.top_n` with one "Andre kategorier" edge per source. Node weights
/// are the sums of their surviving edges. An empty graph comes back when
/// nothing survives.
pub fn build(records: &[FlatRecord], config: &FlowConfig) -> FlowGraph {
    let mut groups: Vec<EdgeGroup> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut dropped = 0usize;

    for record in records {
        let value = match config.value.select(record) {
            Some(v) if v >= config.min_threshold && v > 0.0 => v,
            _ => {
                dropped += 1;
                continue;
            }
        };
        let (Some(source), Some(target)) = (
            record.text(config.source_field),
            record.text(config.target_field),
        ) else {
            dropped += 1;
            continue;
        };

        let pair = (source, target);
        match index.get(&pair) {
            Some(&i) => {
                groups[i].edge.value += value;
                groups[i].records.push(record.clone());
            }
            None => {
                index.insert(pair.clone(), groups.len());
                groups.push(EdgeGroup {
                    edge: RankedEdge::new(pair.0, pair.1, value),
                    records: vec![record.clone()],
                });
            }
        }
    }

    let collapsed = collapse(groups, config.top_n);
    let edge_groups = collapsed.into_vec();
    let total_value: f64 = edge_groups.iter().map(|g| g.edge.value).sum();

    if edge_groups.is_empty() || total_value <= 0.0 {
        debug!(dropped, "Flow graph is empty after thresholding");
        return FlowGraph::default();
    }

    let source_names: HashSet<String> = edge_groups.iter().map(|g| g.edge.source.clone()).collect();

    let mut links = Vec::with_capacity(edge_groups.len());
    let mut contributors = HashMap::new();
    for group in edge_groups {
        let mut edge = group.edge;
        if source_names.contains(&edge.target) {
            edge.target = format!("{}{}", edge.target, TARGET_COLLISION_SUFFIX);
        }
        contributors.insert((edge.source.clone(), edge.target.clone()), group.records);
        links.push(edge);
    }

    let mut nodes = derive_nodes(&links, NodeRole::Source);
    nodes.extend(derive_nodes(&links, NodeRole::Target));

    for node in &mut nodes {
        node.label = if config.decorate_labels {
            format!("{} ({:.1}%)", node.name, node.value / total_value * 100.0)
        } else {
            node.name.clone()
        };
    }

    debug!(
        nodes = nodes.len(),
        links = links.len(),
        dropped,
        total_value,
        "Built flow graph"
    );

    FlowGraph {
        nodes,
        links,
        total_value,
        contributors,
    }
}

/// One node per distinct name on the given side, weighted by the edges
/// incident on that side only. Nodes keep first-seen link order.
fn derive_nodes(links: &[RankedEdge], role: NodeRole) -> Vec<GraphNode> {
    let mut nodes: Vec<GraphNode> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for link in links {
        let name = match role {
            NodeRole::Source => link.source.as_str(),
            NodeRole::Target => link.target.as_str(),
        };
        match index.get(name) {
            Some(&i) => nodes[i].value += link.value,
            None => {
                index.insert(name, nodes.len());
                nodes.push(GraphNode {
                    name: name.to_string(),
                    label: String::new(),
                    value: link.value,
                    role,
                });
            }
        }
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OTHER_LABEL;

    fn record(level1: &str, category: &str, count: f64) -> FlatRecord {
        FlatRecord::new()
            .with("level1_name", level1)
            .with("category_short_name", category)
            .with("count", count)
            .with("avg_weight_grams", 2_000.0)
    }

    fn config(top_n: usize) -> FlowConfig {
        FlowConfig {
            top_n,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_sums_duplicate_pairs() {
        let records = vec![
            record("Sykdom", "Sår", 10.0),
            record("Sykdom", "Sår", 15.0),
            record("Miljø", "Alger", 5.0),
        ];

        let graph = build(&records, &config(10));

        assert_eq!(
            graph.links,
            vec![
                RankedEdge::new("Sykdom", "Sår", 25.0),
                RankedEdge::new("Miljø", "Alger", 5.0),
            ]
        );
        assert_eq!(graph.total_value, 30.0);
        assert_eq!(graph.records_for("Sykdom", "Sår").len(), 2);
    }

    #[test]
    fn test_build_collapses_and_rederives_nodes() {
        let records = vec![
            record("X", "a", 50.0),
            record("X", "b", 30.0),
            record("X", "c", 5.0),
        ];

        let graph = build(&records, &config(1));

        assert_eq!(
            graph.links,
            vec![
                RankedEdge::new("X", "a", 50.0),
                RankedEdge::new("X", OTHER_LABEL, 35.0),
            ]
        );
        assert_eq!(graph.node("X").unwrap().value, 85.0);
        assert_eq!(graph.node(OTHER_LABEL).unwrap().value, 35.0);
        assert_eq!(graph.node(OTHER_LABEL).unwrap().role, NodeRole::Target);
        assert_eq!(graph.records_for("X", OTHER_LABEL).len(), 2);
    }

    #[test]
    fn test_build_below_threshold_is_empty() {
        let records = vec![record("X", "a", 1.0), record("X", "b", 2.0)];
        let config = FlowConfig {
            min_threshold: 10.0,
            ..Default::default()
        };

        let graph = build(&records, &config);

        assert!(graph.nodes.is_empty());
        assert!(graph.links.is_empty());
        assert_eq!(graph.total_value, 0.0);
    }

    #[test]
    fn test_build_drops_records_missing_names() {
        let records = vec![
            FlatRecord::new().with("level1_name", "X").with("count", 4.0),
            record("X", "a", 1.0),
        ];

        let graph = build(&records, &config(5));

        assert_eq!(graph.links, vec![RankedEdge::new("X", "a", 1.0)]);
    }

    #[test]
    fn test_weight_in_kg_and_tonnes() {
        let records = vec![record("X", "a", 500.0)];

        let kg = build(
            &records,
            &FlowConfig {
                value: ValueSelector::Weight(WeightUnit::Kg),
                ..Default::default()
            },
        );
        assert_eq!(kg.total_value, 1_000.0);

        let tonnes = build(
            &records,
            &FlowConfig {
                value: ValueSelector::Weight(WeightUnit::Tonnes),
                ..Default::default()
            },
        );
        assert_eq!(tonnes.total_value, 1.0);
    }

    #[test]
    fn test_decorated_labels_keep_identity() {
        let records = vec![record("X", "a", 3.0), record("X", "b", 1.0)];
        let config = FlowConfig {
            decorate_labels: true,
            ..Default::default()
        };

        let graph = build(&records, &config);

        let node = graph.node("a").unwrap();
        assert_eq!(node.label, "a (75.0%)");
        assert!(graph.links.iter().any(|l| l.target == "a"));
        assert_eq!(graph.node("X").unwrap().label, "X (100.0%)");
    }

    #[test]
    fn test_target_colliding_with_source_is_renamed() {
        let records = vec![record("Miljø", "Sykdom", 2.0), record("Sykdom", "Sår", 3.0)];

        let graph = build(&records, &config(5));

        assert!(graph
            .links
            .contains(&RankedEdge::new("Miljø", "Sykdom (sub)", 2.0)));
        assert_eq!(graph.node("Sykdom").unwrap().role, NodeRole::Source);
        assert_eq!(graph.node("Sykdom").unwrap().value, 3.0);
        assert_eq!(graph.node("Sykdom (sub)").unwrap().value, 2.0);
    }

    #[test]
    fn test_real_other_category_shares_the_overflow_link() {
        let records = vec![
            record("X", "a", 50.0),
            record("X", OTHER_LABEL, 10.0),
            record("X", "b", 5.0),
        ];

        let graph = build(&records, &config(2));

        assert_eq!(
            graph.links,
            vec![
                RankedEdge::new("X", "a", 50.0),
                RankedEdge::new("X", OTHER_LABEL, 15.0),
            ]
        );
        let pairs: HashSet<(&str, &str)> = graph
            .links
            .iter()
            .map(|l| (l.source.as_str(), l.target.as_str()))
            .collect();
        assert_eq!(pairs.len(), graph.links.len());
        assert_eq!(graph.records_for("X", OTHER_LABEL).len(), 2);
        assert_eq!(graph.node(OTHER_LABEL).unwrap().value, 15.0);
    }

    #[test]
    fn test_value_selector_parse() {
        assert_eq!(ValueSelector::parse("count", None), Ok(ValueSelector::Count));
        assert_eq!(
            ValueSelector::parse("weight", Some("tonnes")),
            Ok(ValueSelector::Weight(WeightUnit::Tonnes))
        );
        assert!(ValueSelector::parse("weight", Some("lbs")).is_err());
        assert!(ValueSelector::parse("count", Some("kg")).is_err());
        assert!("biomass".parse::<ValueSelector>().is_err());
    }
}
