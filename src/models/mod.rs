pub mod aggregate;
pub mod chart;
pub mod observation;
pub mod query;
pub mod record;

pub use aggregate::{
    Aggregate, PercentageShare, PeriodAggregates, PeriodShares, RankedEdge, OTHER_KEY,
    OTHER_LABEL,
};
pub use chart::{ChartSeries, PieSlice, SeriesChart};
pub use observation::Observation;
pub use query::QueryParams;
pub use record::{Field, FlatRecord, Metric, Scalar};
