use serde::{Deserialize, Serialize};

/// Line/bar chart: one x-axis category per period, one series per code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesChart {
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    /// Period-aligned values; `None` marks a period without data.
    pub data: Vec<Option<f64>>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    pub color: String,
}

/// Neutral colour reserved for the "Andre kategorier" bucket.
pub const OTHER_COLOR: &str = "#6b7280";

const PALETTE: &[&str] = &[
    "#2563eb", "#dc2626", "#16a34a", "#d97706", "#7c3aed", "#0891b2", "#db2777", "#65a30d",
    "#ea580c", "#4f46e5", "#0d9488", "#b91c1c",
];

/// Deterministic colour for the series or slice at `index`.
pub fn palette_color(index: usize) -> String {
    PALETTE[index % PALETTE.len()].to_string()
}
