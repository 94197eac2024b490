// 📂 Dataset Loader
// Per-indicator CSV series → one merged, gap-free annual table

use crate::config::DashboardConfig;
use crate::error::DataLoadError;
use crate::indicators::{Indicator, IndicatorCatalog};
use crate::selection::YearBounds;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// RAW SOURCES
// ============================================================================

/// RawRow - one (date, value) observation exactly as the source recorded it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub date: String,
    pub value: f64,
}

impl RawRow {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        RawRow {
            date: date.into(),
            value,
        }
    }
}

/// SeriesSource - all observations of one indicator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSource {
    pub indicator: Indicator,
    /// File name or other label used in error messages
    pub name: String,
    pub rows: Vec<RawRow>,
}

impl SeriesSource {
    pub fn new(indicator: Indicator, name: impl Into<String>, rows: Vec<RawRow>) -> Self {
        SeriesSource {
            indicator,
            name: name.into(),
            rows,
        }
    }
}

// ============================================================================
// MERGED TABLE
// ============================================================================

/// AnnualRecord - one calendar year with a value for every configured indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualRecord {
    pub year: i32,
    pub values: BTreeMap<Indicator, f64>,
}

impl AnnualRecord {
    pub fn value(&self, indicator: Indicator) -> Option<f64> {
        self.values.get(&indicator).copied()
    }
}

/// AnnualTable - immutable after load, sorted ascending by year, never empty
#[derive(Debug, Clone, Serialize)]
pub struct AnnualTable {
    indicators: Vec<Indicator>,
    records: Vec<AnnualRecord>,
}

impl AnnualTable {
    /// Build a table from complete records
    ///
    /// Records are sorted by year; duplicates keep the last one.
    pub fn from_records(
        indicators: Vec<Indicator>,
        records: Vec<AnnualRecord>,
    ) -> Result<Self, DataLoadError> {
        let mut by_year: BTreeMap<i32, AnnualRecord> = BTreeMap::new();
        for record in records {
            if indicators.iter().all(|i| record.values.contains_key(i)) {
                by_year.insert(record.year, record);
            }
        }

        if by_year.is_empty() {
            return Err(DataLoadError::NoCompleteRows);
        }

        Ok(AnnualTable {
            indicators,
            records: by_year.into_values().collect(),
        })
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    pub fn records(&self) -> &[AnnualRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First year present (MIN_YR)
    pub fn min_year(&self) -> i32 {
        self.records.first().map(|r| r.year).unwrap_or_default()
    }

    /// Last year present (MAX_YR)
    pub fn max_year(&self) -> i32 {
        self.records.last().map(|r| r.year).unwrap_or_default()
    }

    pub fn bounds(&self) -> YearBounds {
        YearBounds::new(self.min_year(), self.max_year())
    }

    pub fn years(&self) -> Vec<i32> {
        self.records.iter().map(|r| r.year).collect()
    }

    pub fn get(&self, year: i32) -> Option<&AnnualRecord> {
        self.records
            .binary_search_by_key(&year, |r| r.year)
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn value(&self, year: i32, indicator: Indicator) -> Option<f64> {
        self.get(year).and_then(|r| r.value(indicator))
    }

    /// Records with `start <= year <= end`, in ascending order
    pub fn window(&self, start: i32, end: i32) -> &[AnnualRecord] {
        let from = self.records.partition_point(|r| r.year < start);
        let to = self.records.partition_point(|r| r.year <= end);
        if from >= to {
            &[]
        } else {
            &self.records[from..to]
        }
    }
}

// ============================================================================
// DATE HANDLING
// ============================================================================

/// Extract the calendar year from a recorded date
///
/// Accepts `YYYY-MM-DD`, `MM/DD/YYYY`, `YYYY/MM/DD`, `YYYY-MM`, `YYYY`,
/// and timestamps whose date part is one of those.
pub fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);

    for format in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Some(date.year());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", date_part), "%Y-%m-%d") {
        return Some(date.year());
    }

    if date_part.len() == 4 && date_part.chars().all(|c| c.is_ascii_digit()) {
        return date_part.parse().ok();
    }

    None
}

// ============================================================================
// CSV INGESTION
// ============================================================================

/// Read one indicator's CSV from any reader
///
/// The date column is the first header mentioning "date", "year" or
/// "period" (falling back to the first column); the value column is the
/// first other column. Cells that are not numbers (FRED writes "." for
/// missing observations) are skipped.
pub fn read_csv_source<R: io::Read>(
    indicator: Indicator,
    name: &str,
    reader: R,
) -> Result<SeriesSource, DataLoadError> {
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    read_rows(indicator, name, rdr)
}

/// Read one indicator's CSV file from disk
pub fn read_csv_file(indicator: Indicator, path: &Path) -> Result<SeriesSource, DataLoadError> {
    let name = path.display().to_string();
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|error| DataLoadError::Csv {
            source_name: name.clone(),
            error,
        })?;
    read_rows(indicator, &name, rdr)
}

fn read_rows<R: io::Read>(
    indicator: Indicator,
    name: &str,
    mut rdr: csv::Reader<R>,
) -> Result<SeriesSource, DataLoadError> {
    let headers = rdr
        .headers()
        .map_err(|error| DataLoadError::Csv {
            source_name: name.to_string(),
            error,
        })?
        .clone();

    if headers.len() < 2 {
        return Err(DataLoadError::MissingColumns {
            source_name: name.to_string(),
            found: headers.len(),
        });
    }

    let date_idx = headers
        .iter()
        .position(|h| {
            let h = h.to_lowercase();
            h.contains("date") || h == "year" || h == "period"
        })
        .unwrap_or(0);
    let value_idx = if date_idx == 0 { 1 } else { 0 };

    let mut rows = Vec::new();
    let mut seen = 0usize;

    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|error| DataLoadError::Csv {
            source_name: name.to_string(),
            error,
        })?;
        seen += 1;

        let date = record.get(date_idx).unwrap_or_default();
        let raw_value = record.get(value_idx).unwrap_or_default();

        match raw_value.parse::<f64>() {
            Ok(value) if value.is_finite() => rows.push(RawRow::new(date, value)),
            _ => debug!(source = name, line = line + 2, value = raw_value, "skipping non-numeric value"),
        }
    }

    if seen == 0 || rows.is_empty() {
        return Err(DataLoadError::EmptySource(name.to_string()));
    }

    Ok(SeriesSource::new(indicator, name, rows))
}

// ============================================================================
// MERGE
// ============================================================================

/// Merge per-indicator sources into one annual table
///
/// 1. Bucket each source by calendar year; years with several samples are
///    averaged and rounded to the indicator's display decimals.
/// 2. Full outer join on year.
/// 3. Drop every year missing any of `indicators`.
pub fn load(
    sources: &[SeriesSource],
    indicators: &[Indicator],
    catalog: &IndicatorCatalog,
) -> Result<AnnualTable, DataLoadError> {
    let mut joined: BTreeMap<i32, BTreeMap<Indicator, f64>> = BTreeMap::new();

    for &indicator in indicators {
        let source = sources
            .iter()
            .find(|s| s.indicator == indicator)
            .ok_or(DataLoadError::MissingSource(indicator))?;

        let yearly = annualize(source, catalog)?;
        debug!(
            indicator = %indicator,
            source = %source.name,
            years = yearly.len(),
            "annualized source"
        );

        for (year, value) in yearly {
            joined.entry(year).or_default().insert(indicator, value);
        }
    }

    let total_years = joined.len();
    let records: Vec<AnnualRecord> = joined
        .into_iter()
        .filter(|(_, values)| indicators.iter().all(|i| values.contains_key(i)))
        .map(|(year, values)| AnnualRecord { year, values })
        .collect();

    let dropped = total_years - records.len();
    if dropped > 0 {
        debug!(dropped, "dropped incomplete years");
    }

    AnnualTable::from_records(indicators.to_vec(), records)
}

/// Collapse a source to one value per year
fn annualize(
    source: &SeriesSource,
    catalog: &IndicatorCatalog,
) -> Result<BTreeMap<i32, f64>, DataLoadError> {
    if source.rows.is_empty() {
        return Err(DataLoadError::EmptySource(source.name.clone()));
    }

    let mut buckets: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for row in &source.rows {
        match parse_year(&row.date) {
            Some(year) => {
                let bucket = buckets.entry(year).or_insert((0.0, 0));
                bucket.0 += row.value;
                bucket.1 += 1;
            }
            None => debug!(source = %source.name, date = %row.date, "unparsable date"),
        }
    }

    if buckets.is_empty() {
        return Err(DataLoadError::NoParsableDates(source.name.clone()));
    }

    let spec = catalog.spec(source.indicator);
    Ok(buckets
        .into_iter()
        .map(|(year, (sum, count))| {
            let value = if count == 1 {
                sum
            } else {
                spec.round(sum / count as f64)
            };
            (year, value)
        })
        .collect())
}

/// Read every configured source file and merge them
pub fn load_from_config(
    config: &DashboardConfig,
    catalog: &IndicatorCatalog,
) -> Result<AnnualTable, DataLoadError> {
    let indicators = config.variant.indicators();
    let mut sources = Vec::with_capacity(indicators.len());

    for indicator in &indicators {
        let Some(path) = config.source_path(*indicator) else {
            warn!(indicator = %indicator, "no source file configured");
            return Err(DataLoadError::MissingSource(*indicator));
        };
        sources.push(read_csv_file(*indicator, &path)?);
    }

    let table = load(&sources, &indicators, catalog)?;
    info!(
        years = table.len(),
        min_year = table.min_year(),
        max_year = table.max_year(),
        "dataset loaded"
    );
    Ok(table)
}

// ============================================================================
// TESTS
// ============================================================================
