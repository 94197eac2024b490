// Cost of Living Dashboard - Core Library
// Exposes all modules for use in the terminal UI, the API server, and tests

pub mod config;
pub mod dashboard;
pub mod error;
pub mod history;
pub mod indicators;
pub mod loader;
pub mod logging;
pub mod selection;
pub mod view;

#[cfg(feature = "server")]
pub mod server;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use config::{DashboardConfig, SourceFile, Variant, FIXED_COMPARISONS};
pub use dashboard::{
    outputs_for, Control, ControlInput, ControlState, Dashboard, DashboardSession,
    DashboardUpdate, Mode, Output, SessionStore,
};
pub use error::{DataLoadError, SelectionError, ViewError};
pub use history::{HistoryBatch, SelectionHistory};
pub use indicators::{Indicator, IndicatorCatalog, IndicatorSpec};
pub use loader::{
    load, load_from_config, parse_year, read_csv_file, read_csv_source, AnnualRecord,
    AnnualTable, RawRow, SeriesSource,
};
pub use selection::{
    PairOptions, Selection, SelectionModel, ValidatedSelection, YearBounds, YearSelection,
};
pub use view::{
    dtick_for_span, AxisHint, Cell, ChangeSummary, ComparisonChart, ComparisonPoint, Direction,
    LineChart, LinePoint, PairView, Placeholder, RangeView, TableRow, ViewEngine, ViewResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
