pub mod charts;
pub mod csv_export;
pub mod csv_import;
pub mod flow_graph;
pub mod grouping;
pub mod normalize;
pub mod pivot;
pub mod top_n;
