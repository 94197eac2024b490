// 🧮 View Derivation Engine
// (table, selection) → chart payloads, change summaries, table rows
//
// Pure: nothing here logs, allocates global state, or touches I/O.
// Invalid selections never fail; they come back as a Placeholder view.

use crate::error::{SelectionError, ViewError};
use crate::indicators::{Indicator, IndicatorCatalog, IndicatorSpec};
use crate::loader::{AnnualRecord, AnnualTable};
use crate::selection::{Selection, SelectionModel, ValidatedSelection};
use serde::Serialize;
use std::collections::BTreeMap;

/// Baseline every chart is drawn against
const BASELINE: Indicator = Indicator::MedianHouseholdIncome;

const DUAL_AXIS_NOTE: &str = "Note: The y-axes are independent and do not imply a direct correlation.";

// ============================================================================
// CHART PAYLOADS
// ============================================================================

/// AxisHint - what a renderer needs to draw one y-axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisHint {
    pub title: String,
    pub prefix: String,
    pub suffix: String,
    pub range: Option<[f64; 2]>,
    pub color: String,
}

impl From<&IndicatorSpec> for AxisHint {
    fn from(spec: &IndicatorSpec) -> Self {
        AxisHint {
            title: spec.axis_title.clone(),
            prefix: spec.prefix.clone(),
            suffix: spec.suffix.clone(),
            range: spec.display_range,
            color: spec.color.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinePoint {
    pub year: i32,
    pub income: f64,
    pub value: f64,
}

/// LineChart - income (left axis) vs one indicator (right axis) over a range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub indicator: Indicator,
    pub title: String,
    pub subtitle: String,
    /// Ascending by year, one point per year in range
    pub points: Vec<LinePoint>,
    /// Years between x-axis ticks
    pub dtick: u32,
    pub income_axis: AxisHint,
    pub indicator_axis: AxisHint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub year: i32,
    pub value: f64,
    /// e.g. "2019: 3.9%"
    pub label: String,
}

/// ComparisonChart - slope chart between two adjacent years
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonChart {
    pub indicator: Indicator,
    pub title: String,
    /// Chronological
    pub points: [ComparisonPoint; 2],
    pub axis: AxisHint,
}

// ============================================================================
// SUMMARY & TABLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increased,
    Decreased,
}

impl Direction {
    /// Strictly positive is an increase; zero counts as a decrease
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 {
            Direction::Increased
        } else {
            Direction::Decreased
        }
    }

    pub fn word(&self) -> &'static str {
        match self {
            Direction::Increased => "increased",
            Direction::Decreased => "decreased",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSummary {
    pub indicator: Indicator,
    pub start_year: i32,
    pub end_year: i32,
    /// value(end) - value(start), rounded to display precision
    pub delta: f64,
    pub direction: Direction,
    /// e.g. "Average Gas Price increased by $0.50 from 2019 to 2020"
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

/// TableRow - one year of the results table
///
/// `change` is the window delta of the primary indicator and is the same on
/// every row of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(flatten)]
    pub cells: BTreeMap<Indicator, Cell>,
    #[serde(rename = "Change")]
    pub change: String,
}

// ============================================================================
// VIEW RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeView {
    pub selection: ValidatedSelection,
    pub charts: Vec<LineChart>,
    pub summaries: Vec<ChangeSummary>,
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairView {
    pub selection: ValidatedSelection,
    pub charts: Vec<ComparisonChart>,
    pub summaries: Vec<ChangeSummary>,
    pub table_rows: Vec<TableRow>,
}

/// Placeholder - shown instead of charts when a selection cannot be drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    pub title: String,
    pub reason: String,
}

impl Placeholder {
    pub fn new(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Placeholder {
            title: reason.clone(),
            reason,
        }
    }

    pub fn for_selection_error(err: &SelectionError) -> Self {
        match err {
            SelectionError::NonConsecutive { .. } => {
                Placeholder::new("Please select two consecutive years.")
            }
            SelectionError::OutOfBounds { min, max, .. } => {
                Placeholder::new(format!("Please select years between {} and {}.", min, max))
            }
            SelectionError::InvertedRange { .. } => {
                Placeholder::new("Please select a start year before the end year.")
            }
            SelectionError::UnknownIndicator(name) => {
                Placeholder::new(format!("Unknown indicator '{}'.", name))
            }
        }
    }

    pub fn for_view_error(err: &ViewError) -> Self {
        match err {
            ViewError::MissingValue { year, indicator } => {
                Placeholder::new(format!("No {} data for {}.", indicator, year))
            }
            ViewError::EmptyWindow { start, end } => {
                Placeholder::new(format!("No data between {} and {}.", start, end))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewResult {
    Range(RangeView),
    Pair(PairView),
    Placeholder(Placeholder),
}

impl ViewResult {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ViewResult::Placeholder(_))
    }

    pub fn table_rows(&self) -> &[TableRow] {
        match self {
            ViewResult::Range(view) => &view.table_rows,
            ViewResult::Pair(view) => &view.table_rows,
            ViewResult::Placeholder(_) => &[],
        }
    }

    pub fn summaries(&self) -> &[ChangeSummary] {
        match self {
            ViewResult::Range(view) => &view.summaries,
            ViewResult::Pair(view) => &view.summaries,
            ViewResult::Placeholder(_) => &[],
        }
    }

    pub fn selection(&self) -> Option<&ValidatedSelection> {
        match self {
            ViewResult::Range(view) => Some(&view.selection),
            ViewResult::Pair(view) => Some(&view.selection),
            ViewResult::Placeholder(_) => None,
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// x-axis tick spacing from the span (end - start) of a range
pub fn dtick_for_span(span: i32) -> u32 {
    if span < 16 {
        1
    } else if span < 30 {
        2
    } else {
        5
    }
}

/// ViewEngine - borrows the shared table and catalog; holds no state
pub struct ViewEngine<'a> {
    table: &'a AnnualTable,
    catalog: &'a IndicatorCatalog,
}

impl<'a> ViewEngine<'a> {
    pub fn new(table: &'a AnnualTable, catalog: &'a IndicatorCatalog) -> Self {
        ViewEngine { table, catalog }
    }

    /// Validate and derive; invalid input yields a Placeholder, never an error
    pub fn render(&self, model: &SelectionModel, selection: &Selection) -> ViewResult {
        match model.validate(selection) {
            Ok(validated) => self
                .derive(&validated)
                .unwrap_or_else(|err| ViewResult::Placeholder(Placeholder::for_view_error(&err))),
            Err(err) => ViewResult::Placeholder(Placeholder::for_selection_error(&err)),
        }
    }

    /// Derive every payload for an already validated selection
    pub fn derive(&self, selection: &ValidatedSelection) -> Result<ViewResult, ViewError> {
        let (start, end) = selection.window();
        let primary = selection.primary();

        let summaries = selection
            .indicators()
            .iter()
            .map(|&indicator| self.change_summary(indicator, start, end))
            .collect::<Result<Vec<_>, _>>()?;

        let primary_delta = summaries
            .iter()
            .find(|s| s.indicator == primary)
            .map(|s| s.delta)
            .unwrap_or_default();
        let change = self.catalog.spec(primary).format_signed(primary_delta);

        match selection {
            ValidatedSelection::Range { indicators, .. } => {
                let records = self.records_in(start, end)?;
                let charts = indicators
                    .iter()
                    .map(|&indicator| self.line_chart(indicator, start, end, records))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ViewResult::Range(RangeView {
                    selection: selection.clone(),
                    charts,
                    summaries,
                    table_rows: self.table_rows(records, &change),
                }))
            }
            ValidatedSelection::Pair {
                earlier,
                later,
                indicators,
            } => {
                let records = self.records_in(*earlier, *later)?;
                let charts = indicators
                    .iter()
                    .map(|&indicator| self.comparison_chart(indicator, *earlier, *later))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ViewResult::Pair(PairView {
                    selection: selection.clone(),
                    charts,
                    summaries,
                    table_rows: self.table_rows(records, &change),
                }))
            }
        }
    }

    fn records_in(&self, start: i32, end: i32) -> Result<&'a [AnnualRecord], ViewError> {
        let records = self.table.window(start, end);
        if records.is_empty() {
            Err(ViewError::EmptyWindow { start, end })
        } else {
            Ok(records)
        }
    }

    fn value(&self, year: i32, indicator: Indicator) -> Result<f64, ViewError> {
        self.table
            .value(year, indicator)
            .ok_or(ViewError::MissingValue { year, indicator })
    }

    /// value(end) - value(start), with wording driven by its sign
    pub fn change_summary(
        &self,
        indicator: Indicator,
        start: i32,
        end: i32,
    ) -> Result<ChangeSummary, ViewError> {
        let spec = self.catalog.spec(indicator);
        let delta = spec.round(self.value(end, indicator)? - self.value(start, indicator)?);
        let direction = Direction::of(delta);

        Ok(ChangeSummary {
            indicator,
            start_year: start,
            end_year: end,
            delta,
            direction,
            text: format!(
                "{} {} by {} from {} to {}",
                indicator,
                direction.word(),
                spec.format_magnitude(delta),
                start,
                end
            ),
        })
    }

    fn line_chart(
        &self,
        indicator: Indicator,
        start: i32,
        end: i32,
        records: &[AnnualRecord],
    ) -> Result<LineChart, ViewError> {
        let points = records
            .iter()
            .map(|record| {
                let income = record.value(BASELINE).ok_or(ViewError::MissingValue {
                    year: record.year,
                    indicator: BASELINE,
                })?;
                let value = record.value(indicator).ok_or(ViewError::MissingValue {
                    year: record.year,
                    indicator,
                })?;
                Ok(LinePoint {
                    year: record.year,
                    income,
                    value,
                })
            })
            .collect::<Result<Vec<_>, ViewError>>()?;

        Ok(LineChart {
            indicator,
            title: format!("{} vs. {} ({} - {})", BASELINE, indicator, start, end),
            subtitle: DUAL_AXIS_NOTE.to_string(),
            points,
            dtick: dtick_for_span(end - start),
            income_axis: AxisHint::from(self.catalog.spec(BASELINE)),
            indicator_axis: AxisHint::from(self.catalog.spec(indicator)),
        })
    }

    fn comparison_chart(
        &self,
        indicator: Indicator,
        earlier: i32,
        later: i32,
    ) -> Result<ComparisonChart, ViewError> {
        let spec = self.catalog.spec(indicator);
        let point = |year: i32| -> Result<ComparisonPoint, ViewError> {
            let value = self.value(year, indicator)?;
            Ok(ComparisonPoint {
                year,
                value,
                label: format!("{}: {}", year, spec.format(value)),
            })
        };

        Ok(ComparisonChart {
            indicator,
            title: format!("{} Change", indicator.short_name()),
            points: [point(earlier)?, point(later)?],
            axis: AxisHint::from(spec),
        })
    }

    /// Project records into display rows
    ///
    /// Unemployment is always rendered as "x.y%", whatever the selection.
    pub fn table_rows(&self, records: &[AnnualRecord], change: &str) -> Vec<TableRow> {
        records
            .iter()
            .map(|record| {
                let cells = record
                    .values
                    .iter()
                    .map(|(&indicator, &value)| {
                        let cell = if indicator == Indicator::UnemploymentRate {
                            Cell::Text(self.catalog.format(indicator, value))
                        } else {
                            Cell::Number(value)
                        };
                        (indicator, cell)
                    })
                    .collect();

                TableRow {
                    year: record.year,
                    cells,
                    change: change.to_string(),
                }
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Variant, FIXED_COMPARISONS};
    use crate::fixtures::{sample_table, table_with, FIRST_YEAR, LAST_YEAR};

    fn render(selection: Selection) -> ViewResult {
        let table = sample_table();
        let catalog = IndicatorCatalog::standard();
        let model = SelectionModel::new(table.bounds(), Variant::Extended);
        ViewEngine::new(&table, &catalog).render(&model, &selection)
    }

    fn range_view(result: ViewResult) -> RangeView {
        match result {
            ViewResult::Range(view) => view,
            other => panic!("expected range view, got {:?}", other),
        }
    }

    fn pair_view(result: ViewResult) -> PairView {
        match result {
            ViewResult::Pair(view) => view,
            other => panic!("expected pair view, got {:?}", other),
        }
    }

    #[test]
    fn test_line_series_covers_every_year_in_order() {
        for start in FIRST_YEAR..=LAST_YEAR {
            for end in start..=LAST_YEAR {
                let view = range_view(render(Selection::range(start, end).with_indicator("housing")));
                let years: Vec<i32> = view.charts[0].points.iter().map(|p| p.year).collect();

                assert_eq!(years.len() as i32, end - start + 1);
                assert!(years.windows(2).all(|w| w[0] < w[1]), "years ascend");
                assert_eq!(years.first(), Some(&start));
                assert_eq!(years.last(), Some(&end));
            }
        }
    }

    #[test]
    fn test_single_year_range_is_one_point() {
        let view = range_view(render(Selection::range(2015, 2015)));

        for chart in &view.charts {
            assert_eq!(chart.points.len(), 1);
            assert_eq!(chart.dtick, 1);
        }
        assert_eq!(view.table_rows.len(), 1);
        assert_eq!(view.summaries[0].delta, 0.0);
    }

    #[test]
    fn test_fixed_comparisons_without_indicator() {
        let view = range_view(render(Selection::range(2012, 2018)));

        let charted: Vec<Indicator> = view.charts.iter().map(|c| c.indicator).collect();
        assert_eq!(charted, FIXED_COMPARISONS.to_vec());
        assert_eq!(view.summaries.len(), 2);
        assert_eq!(
            view.charts[0].title,
            "Median Household Income vs. Unemployment Rate (2012 - 2018)"
        );
        assert_eq!(view.charts[0].indicator_axis.range, Some([0.0, 15.0]));
        assert_eq!(view.charts[0].income_axis.prefix, "$");
    }

    #[test]
    fn test_dtick_thresholds() {
        assert_eq!(dtick_for_span(0), 1);
        assert_eq!(dtick_for_span(15), 1);
        assert_eq!(dtick_for_span(16), 2);
        assert_eq!(dtick_for_span(29), 2);
        assert_eq!(dtick_for_span(30), 5);
        assert_eq!(dtick_for_span(60), 5);
    }

    #[test]
    fn test_gas_price_increase_summary() {
        let view = range_view(render(Selection::range(2019, 2020).with_indicator("Average Gas Price")));
        let summary = &view.summaries[0];

        assert_eq!(summary.direction, Direction::Increased);
        assert_eq!(summary.delta, 0.5);
        assert!(summary.text.contains("increased by $0.50"), "got: {}", summary.text);
        assert_eq!(summary.text, "Average Gas Price increased by $0.50 from 2019 to 2020");
    }

    #[test]
    fn test_decrease_summary_uses_magnitude() {
        let view = range_view(render(Selection::range(2020, 2022).with_indicator("unemployment")));
        let summary = &view.summaries[0];

        assert_eq!(summary.direction, Direction::Decreased);
        assert_eq!(summary.text, "Unemployment Rate decreased by 5.5% from 2020 to 2022");
    }

    #[test]
    fn test_zero_change_reads_decreased() {
        // gas was $2.50 in both 2017 and 2019
        let view = range_view(render(Selection::range(2017, 2019).with_indicator("gas")));
        let summary = &view.summaries[0];

        assert_eq!(summary.direction, Direction::Decreased);
        assert!(summary.text.contains("decreased by $0.00"), "got: {}", summary.text);
        assert!(view.table_rows.iter().all(|row| row.change == "$0.00"));
    }

    #[test]
    fn test_income_summary_uses_thousands_separator() {
        let table = sample_table();
        let catalog = IndicatorCatalog::standard();
        let engine = ViewEngine::new(&table, &catalog);

        let summary = engine
            .change_summary(Indicator::MedianHouseholdIncome, 2010, 2022)
            .unwrap();
        assert_eq!(
            summary.text,
            "Median Household Income increased by $12,000 from 2010 to 2022"
        );
    }

    #[test]
    fn test_pair_is_two_chronological_points() {
        let forward = pair_view(render(Selection::pair(2019, 2020)));
        let backward = pair_view(render(Selection::pair(2020, 2019)));

        assert_eq!(forward, backward);
        for chart in &forward.charts {
            assert_eq!(chart.points[0].year, 2019);
            assert_eq!(chart.points[1].year, 2020);
        }
        assert_eq!(forward.charts[0].title, "Unemployment Rate Change");
        assert_eq!(forward.charts[1].title, "Housing Price Change");
        assert_eq!(forward.charts[0].points[0].label, "2019: 3.9%");
        assert_eq!(forward.charts[1].points[1].label, "2020: $500,000");
        assert_eq!(forward.table_rows.len(), 2);
    }

    #[test]
    fn test_non_adjacent_pair_is_placeholder() {
        let result = render(Selection::pair(2017, 2020));

        assert!(result.is_placeholder());
        assert!(result.table_rows().is_empty());
        match result {
            ViewResult::Placeholder(p) => assert_eq!(p.reason, "Please select two consecutive years."),
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_bounds_and_unknown_indicator_are_placeholders() {
        assert!(render(Selection::range(1990, 2015)).is_placeholder());
        assert!(render(Selection::range(2015, 2018).with_indicator("rent")).is_placeholder());
    }

    #[test]
    fn test_unemployment_always_percent_in_table() {
        for name in ["housing", "gas", "unemployment"] {
            let view = range_view(render(Selection::range(2018, 2020).with_indicator(name)));

            for row in &view.table_rows {
                match row.cells.get(&Indicator::UnemploymentRate) {
                    Some(Cell::Text(text)) => {
                        assert!(text.ends_with('%'), "got {}", text);
                        let digits = text.trim_end_matches('%');
                        assert_eq!(digits.split('.').nth(1).map(str::len), Some(1));
                    }
                    other => panic!("unemployment cell should be text, got {:?}", other),
                }
                assert!(matches!(
                    row.cells.get(&Indicator::AverageGasPrice),
                    Some(Cell::Number(_))
                ));
            }
        }
    }

    #[test]
    fn test_change_repeated_on_every_row() {
        let view = range_view(render(Selection::range(2015, 2020).with_indicator("housing")));

        assert_eq!(view.table_rows.len(), 6);
        assert!(view.table_rows.iter().all(|row| row.change == "+$50,000"));
    }

    #[test]
    fn test_missing_indicator_value_becomes_placeholder() {
        let table = table_with(vec![
            Indicator::MedianHouseholdIncome,
            Indicator::MedianHousingPrice,
            Indicator::UnemploymentRate,
        ]);
        let catalog = IndicatorCatalog::standard();
        let engine = ViewEngine::new(&table, &catalog);

        let selection = ValidatedSelection::Range {
            start: 2015,
            end: 2016,
            indicators: vec![Indicator::AverageGasPrice],
        };
        let err = engine.derive(&selection).unwrap_err();
        assert_eq!(
            err,
            ViewError::MissingValue {
                year: 2016,
                indicator: Indicator::AverageGasPrice
            }
        );

        let placeholder = Placeholder::for_view_error(&err);
        assert_eq!(placeholder.reason, "No Average Gas Price data for 2016.");
    }

    #[test]
    fn test_table_row_serializes_with_column_names() {
        let view = range_view(render(Selection::range(2019, 2019).with_indicator("gas")));
        let json = serde_json::to_value(&view.table_rows[0]).unwrap();

        assert_eq!(json["Year"], 2019);
        assert_eq!(json["UnemploymentRate"], "3.9%");
        assert_eq!(json["AverageGasPrice"], 2.5);
        assert_eq!(json["Change"], "$0.00");
    }
}
