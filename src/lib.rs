pub mod chart;
pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod peer;
pub mod stats;
pub mod view;

// Re-export commonly used types
pub use chart::{ChartKind, ChartSpec, Metric};
pub use dataset::{Dataset, ReportRecord};
pub use error::BenchError;
pub use peer::{GroupRule, PeerGroup, Selection};
pub use view::{BenchmarkView, SortOrder, ViewOptions};
