// ⚠️ Error Taxonomy
// Load errors are fatal at startup; selection and view errors become placeholders

use crate::indicators::Indicator;
use thiserror::Error;

// ============================================================================
// LOAD ERRORS (fatal)
// ============================================================================

/// DataLoadError - the dashboard must not start with an incomplete dataset
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("no source configured for indicator {0}")]
    MissingSource(Indicator),

    #[error("failed to read source {source_name}: {error}")]
    Csv {
        source_name: String,
        #[source]
        error: csv::Error,
    },

    #[error("source {0} contains no observations")]
    EmptySource(String),

    #[error("source {source_name} has {found} column(s); expected a date column and a value column")]
    MissingColumns { source_name: String, found: usize },

    #[error("source {0} has no parsable date column")]
    NoParsableDates(String),

    #[error("merged dataset has no year with a value for every indicator")]
    NoCompleteRows,
}

// ============================================================================
// SELECTION ERRORS (recoverable)
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("year {year} is outside the available range {min}-{max}")]
    OutOfBounds { year: i32, min: i32, max: i32 },

    #[error("range start {start} is after range end {end}")]
    InvertedRange { start: i32, end: i32 },

    #[error("years {year_a} and {year_b} are not consecutive")]
    NonConsecutive { year_a: i32, year_b: i32 },

    #[error("unknown indicator: {0}")]
    UnknownIndicator(String),
}

// ============================================================================
// VIEW ERRORS (recoverable)
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("no {indicator} value recorded for {year}")]
    MissingValue { year: i32, indicator: Indicator },

    #[error("no data between {start} and {end}")]
    EmptyWindow { start: i32, end: i32 },
}
