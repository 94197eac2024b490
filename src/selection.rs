// 🎚️ Selection Model
// Holds what the user picked and decides whether it can be rendered

use crate::config::{Variant, FIXED_COMPARISONS};
use crate::error::SelectionError;
use crate::indicators::Indicator;
use serde::{Deserialize, Serialize};

// ============================================================================
// BOUNDS
// ============================================================================

/// YearBounds - [MIN_YR, MAX_YR] of the merged table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub min_year: i32,
    pub max_year: i32,
}

impl YearBounds {
    pub fn new(min_year: i32, max_year: i32) -> Self {
        YearBounds { min_year, max_year }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min_year..=self.max_year).contains(&year)
    }

    fn check(&self, year: i32) -> Result<(), SelectionError> {
        if self.contains(year) {
            Ok(())
        } else {
            Err(SelectionError::OutOfBounds {
                year,
                min: self.min_year,
                max: self.max_year,
            })
        }
    }
}

// ============================================================================
// RAW SELECTION (as received from a control)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum YearSelection {
    Range { start: i32, end: i32 },
    Pair { year_a: i32, year_b: i32 },
}

/// Selection - unvalidated UI state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub years: YearSelection,
    /// Indicator name as typed or picked; None compares the fixed pair
    #[serde(default)]
    pub indicator: Option<String>,
}

impl Selection {
    pub fn range(start: i32, end: i32) -> Self {
        Selection {
            years: YearSelection::Range { start, end },
            indicator: None,
        }
    }

    pub fn pair(year_a: i32, year_b: i32) -> Self {
        Selection {
            years: YearSelection::Pair { year_a, year_b },
            indicator: None,
        }
    }

    /// Builder: choose the compared indicator
    pub fn with_indicator(mut self, name: impl Into<String>) -> Self {
        self.indicator = Some(name.into());
        self
    }
}

// ============================================================================
// VALIDATED SELECTION
// ============================================================================

/// ValidatedSelection - in bounds, ordered, indicators resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ValidatedSelection {
    Range {
        start: i32,
        end: i32,
        indicators: Vec<Indicator>,
    },
    Pair {
        earlier: i32,
        later: i32,
        indicators: Vec<Indicator>,
    },
}

impl ValidatedSelection {
    /// Compared indicators, primary first
    pub fn indicators(&self) -> &[Indicator] {
        match self {
            ValidatedSelection::Range { indicators, .. } => indicators,
            ValidatedSelection::Pair { indicators, .. } => indicators,
        }
    }

    /// Indicator whose delta fills the table's Change column
    pub fn primary(&self) -> Indicator {
        self.indicators()
            .first()
            .copied()
            .unwrap_or(FIXED_COMPARISONS[0])
    }

    /// (first, last) year covered
    pub fn window(&self) -> (i32, i32) {
        match *self {
            ValidatedSelection::Range { start, end, .. } => (start, end),
            ValidatedSelection::Pair { earlier, later, .. } => (earlier, later),
        }
    }

    /// Short label, e.g. "2015-2020" or "2019 vs 2020"
    pub fn label(&self) -> String {
        match *self {
            ValidatedSelection::Range { start, end, .. } => format!("{}-{}", start, end),
            ValidatedSelection::Pair { earlier, later, .. } => format!("{} vs {}", earlier, later),
        }
    }
}

// ============================================================================
// SELECTION MODEL
// ============================================================================

/// Second-year dropdown contents for a given first year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairOptions {
    pub options: Vec<i32>,
    pub default: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct SelectionModel {
    bounds: YearBounds,
    selectable: Vec<Indicator>,
}

impl SelectionModel {
    pub fn new(bounds: YearBounds, variant: Variant) -> Self {
        SelectionModel {
            bounds,
            selectable: variant.selectable(),
        }
    }

    pub fn bounds(&self) -> YearBounds {
        self.bounds
    }

    pub fn selectable(&self) -> &[Indicator] {
        &self.selectable
    }

    /// Validate a raw selection against the table bounds
    ///
    /// Ranges outside the bounds are rejected, not clamped. Pairs must be
    /// adjacent years and come back in chronological order.
    pub fn validate(&self, selection: &Selection) -> Result<ValidatedSelection, SelectionError> {
        let indicators = self.resolve_indicators(selection.indicator.as_deref())?;

        match selection.years {
            YearSelection::Range { start, end } => {
                self.bounds.check(start)?;
                self.bounds.check(end)?;
                if start > end {
                    return Err(SelectionError::InvertedRange { start, end });
                }
                Ok(ValidatedSelection::Range {
                    start,
                    end,
                    indicators,
                })
            }
            YearSelection::Pair { year_a, year_b } => {
                self.bounds.check(year_a)?;
                self.bounds.check(year_b)?;
                if (year_a - year_b).abs() != 1 {
                    return Err(SelectionError::NonConsecutive { year_a, year_b });
                }
                Ok(ValidatedSelection::Pair {
                    earlier: year_a.min(year_b),
                    later: year_a.max(year_b),
                    indicators,
                })
            }
        }
    }

    /// Map an indicator name to the compared indicator list
    pub fn resolve_indicators(&self, name: Option<&str>) -> Result<Vec<Indicator>, SelectionError> {
        let Some(name) = name else {
            return Ok(FIXED_COMPARISONS.to_vec());
        };

        match Indicator::resolve(name) {
            Some(indicator) if self.selectable.contains(&indicator) => Ok(vec![indicator]),
            _ => Err(SelectionError::UnknownIndicator(name.to_string())),
        }
    }

    /// Years offered for the second pair year: everything after `year_a`
    pub fn pair_options(&self, year_a: i32) -> PairOptions {
        let first = year_a.saturating_add(1).max(self.bounds.min_year);
        let options: Vec<i32> = (first..=self.bounds.max_year).collect();
        PairOptions {
            default: options.first().copied(),
            options,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> SelectionModel {
        SelectionModel::new(YearBounds::new(2016, 2022), Variant::Extended)
    }

    #[test]
    fn test_range_within_bounds() {
        let validated = model().validate(&Selection::range(2017, 2020)).unwrap();

        assert_eq!(validated.window(), (2017, 2020));
        assert_eq!(validated.indicators(), &FIXED_COMPARISONS);
        assert_eq!(validated.label(), "2017-2020");
    }

    #[test]
    fn test_single_year_range_is_valid() {
        let validated = model().validate(&Selection::range(2019, 2019)).unwrap();
        assert_eq!(validated.window(), (2019, 2019));
    }

    #[test]
    fn test_range_out_of_bounds_rejected() {
        let err = model().validate(&Selection::range(2010, 2020)).unwrap_err();
        assert_eq!(
            err,
            SelectionError::OutOfBounds {
                year: 2010,
                min: 2016,
                max: 2022
            }
        );

        let err = model().validate(&Selection::range(2018, 2023)).unwrap_err();
        assert!(matches!(err, SelectionError::OutOfBounds { year: 2023, .. }));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = model().validate(&Selection::range(2020, 2018)).unwrap_err();
        assert_eq!(err, SelectionError::InvertedRange { start: 2020, end: 2018 });
    }

    #[test]
    fn test_pair_is_order_independent() {
        let forward = model().validate(&Selection::pair(2019, 2020)).unwrap();
        let backward = model().validate(&Selection::pair(2020, 2019)).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward.window(), (2019, 2020));
        assert_eq!(forward.label(), "2019 vs 2020");
    }

    #[test]
    fn test_non_consecutive_pair_rejected() {
        let err = model().validate(&Selection::pair(2017, 2020)).unwrap_err();
        assert_eq!(err, SelectionError::NonConsecutive { year_a: 2017, year_b: 2020 });

        let err = model().validate(&Selection::pair(2019, 2019)).unwrap_err();
        assert!(matches!(err, SelectionError::NonConsecutive { .. }));
    }

    #[test]
    fn test_indicator_selection() {
        let validated = model()
            .validate(&Selection::range(2017, 2020).with_indicator("Average Gas Price"))
            .unwrap();
        assert_eq!(validated.indicators(), &[Indicator::AverageGasPrice]);
        assert_eq!(validated.primary(), Indicator::AverageGasPrice);
    }

    #[test]
    fn test_unknown_and_baseline_indicators_rejected() {
        let err = model()
            .validate(&Selection::range(2017, 2020).with_indicator("Rent"))
            .unwrap_err();
        assert_eq!(err, SelectionError::UnknownIndicator("Rent".to_string()));

        let err = model()
            .validate(&Selection::range(2017, 2020).with_indicator("MedianHouseholdIncome"))
            .unwrap_err();
        assert!(matches!(err, SelectionError::UnknownIndicator(_)));
    }

    #[test]
    fn test_classic_variant_has_no_selector() {
        let classic = SelectionModel::new(YearBounds::new(2016, 2022), Variant::Classic);
        let err = classic
            .validate(&Selection::range(2017, 2020).with_indicator("gas"))
            .unwrap_err();
        assert!(matches!(err, SelectionError::UnknownIndicator(_)));
    }

    #[test]
    fn test_pair_options_follow_first_year() {
        let options = model().pair_options(2019);
        assert_eq!(options.options, vec![2020, 2021, 2022]);
        assert_eq!(options.default, Some(2020));

        let none = model().pair_options(2022);
        assert!(none.options.is_empty());
        assert_eq!(none.default, None);
    }

    #[test]
    fn test_pair_options_at_extreme_years() {
        let past_end = model().pair_options(i32::MAX);
        assert!(past_end.options.is_empty());
        assert_eq!(past_end.default, None);

        let before_start = model().pair_options(i32::MIN);
        assert_eq!(before_start.options, (2016..=2022).collect::<Vec<_>>());
        assert_eq!(before_start.default, Some(2016));
    }
}
