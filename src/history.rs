// 🕰️ Selection History
// Every computed results table is kept, newest first, for the session's lifetime
//
// Append-only: no deduplication, no cap. A batch is never edited after it
// is recorded; the history only grows until its session ends.

use crate::indicators::Indicator;
use crate::view::{TableRow, ViewResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

// ============================================================================
// HISTORY BATCH
// ============================================================================

/// HistoryBatch - the table rows produced by one update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryBatch {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    /// Selection label, e.g. "2015-2020" or "2019 vs 2020"
    pub label: String,
    /// Indicator whose delta fills the Change column
    pub indicator: Indicator,
    pub rows: Vec<TableRow>,
}

impl HistoryBatch {
    pub fn new(label: impl Into<String>, indicator: Indicator, rows: Vec<TableRow>) -> Self {
        HistoryBatch {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            label: label.into(),
            indicator,
            rows,
        }
    }

    /// Batch for a derived view; placeholders produce none
    pub fn from_view(view: &ViewResult) -> Option<Self> {
        let selection = view.selection()?;
        Some(HistoryBatch::new(
            selection.label(),
            selection.primary(),
            view.table_rows().to_vec(),
        ))
    }
}

// ============================================================================
// SELECTION HISTORY
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionHistory {
    batches: VecDeque<HistoryBatch>,
}

impl SelectionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// New history with `batch` in front of everything in `previous`
    pub fn append(previous: &SelectionHistory, batch: HistoryBatch) -> SelectionHistory {
        let mut next = previous.clone();
        next.record(batch);
        next
    }

    /// Prepend in place; empty batches are ignored
    ///
    /// Returns whether the batch was kept.
    pub fn record(&mut self, batch: HistoryBatch) -> bool {
        if batch.rows.is_empty() {
            return false;
        }
        self.batches.push_front(batch);
        true
    }

    /// Batches, newest first
    pub fn batches(&self) -> impl Iterator<Item = &HistoryBatch> {
        self.batches.iter()
    }

    pub fn latest(&self) -> Option<&HistoryBatch> {
        self.batches.front()
    }

    /// All rows, newest batch first, each batch in its own row order
    pub fn rows(&self) -> Vec<TableRow> {
        self.batches
            .iter()
            .flat_map(|batch| batch.rows.iter().cloned())
            .collect()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn row_count(&self) -> usize {
        self.batches.iter().map(|b| b.rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use crate::fixtures::sample_table;
    use crate::indicators::IndicatorCatalog;
    use crate::selection::{Selection, SelectionModel};
    use crate::view::ViewEngine;
    use std::collections::BTreeMap;

    fn rows(years: &[i32]) -> Vec<TableRow> {
        years
            .iter()
            .map(|&year| TableRow {
                year,
                cells: BTreeMap::new(),
                change: "+$1".to_string(),
            })
            .collect()
    }

    fn years(rows: &[TableRow]) -> Vec<i32> {
        rows.iter().map(|r| r.year).collect()
    }

    #[test]
    fn test_second_batch_comes_first() {
        let empty = SelectionHistory::new();
        let first = SelectionHistory::append(
            &empty,
            HistoryBatch::new("2015-2017", Indicator::UnemploymentRate, rows(&[2015, 2016, 2017])),
        );
        let second = SelectionHistory::append(
            &first,
            HistoryBatch::new("2019 vs 2020", Indicator::UnemploymentRate, rows(&[2019, 2020])),
        );

        assert_eq!(years(&second.rows()), vec![2019, 2020, 2015, 2016, 2017]);
        assert_eq!(second.latest().map(|b| b.label.as_str()), Some("2019 vs 2020"));

        // append leaves its input untouched
        assert_eq!(first.batch_count(), 1);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_no_deduplication() {
        let mut history = SelectionHistory::new();
        for _ in 0..3 {
            history.record(HistoryBatch::new("2019-2020", Indicator::AverageGasPrice, rows(&[2019, 2020])));
        }

        assert_eq!(history.batch_count(), 3);
        assert_eq!(history.row_count(), 6);
        assert_eq!(years(&history.rows()), vec![2019, 2020, 2019, 2020, 2019, 2020]);
    }

    #[test]
    fn test_empty_batch_not_recorded() {
        let mut history = SelectionHistory::new();
        let kept = history.record(HistoryBatch::new("none", Indicator::UnemploymentRate, Vec::new()));

        assert!(!kept);
        assert!(history.is_empty());
    }

    #[test]
    fn test_batch_from_views() {
        let table = sample_table();
        let catalog = IndicatorCatalog::standard();
        let model = SelectionModel::new(table.bounds(), Variant::Extended);
        let engine = ViewEngine::new(&table, &catalog);

        let range = engine.render(&model, &Selection::range(2016, 2018).with_indicator("gas"));
        let batch = HistoryBatch::from_view(&range).unwrap();
        assert_eq!(batch.label, "2016-2018");
        assert_eq!(batch.indicator, Indicator::AverageGasPrice);
        assert_eq!(batch.rows.len(), 3);

        let placeholder = engine.render(&model, &Selection::pair(2016, 2018));
        assert!(HistoryBatch::from_view(&placeholder).is_none());
    }
}
