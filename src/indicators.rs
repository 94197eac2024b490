// 📊 Indicator Catalog
// One configuration table consulted by charts, summaries, and tables alike

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// INDICATORS
// ============================================================================

/// Indicator - one annual economic series
///
/// Household income is the baseline every chart is compared against;
/// the other three are selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Indicator {
    MedianHouseholdIncome,
    MedianHousingPrice,
    UnemploymentRate,
    AverageGasPrice,
}

impl Indicator {
    pub const ALL: [Indicator; 4] = [
        Indicator::MedianHouseholdIncome,
        Indicator::MedianHousingPrice,
        Indicator::UnemploymentRate,
        Indicator::AverageGasPrice,
    ];

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::MedianHouseholdIncome => "Median Household Income",
            Indicator::MedianHousingPrice => "Median Housing Price",
            Indicator::UnemploymentRate => "Unemployment Rate",
            Indicator::AverageGasPrice => "Average Gas Price",
        }
    }

    /// Name used in comparison chart titles
    pub fn short_name(&self) -> &'static str {
        match self {
            Indicator::MedianHouseholdIncome => "Household Income",
            Indicator::MedianHousingPrice => "Housing Price",
            Indicator::UnemploymentRate => "Unemployment Rate",
            Indicator::AverageGasPrice => "Gas Price",
        }
    }

    /// Short code for config keys and CLI arguments
    pub fn code(&self) -> &'static str {
        match self {
            Indicator::MedianHouseholdIncome => "income",
            Indicator::MedianHousingPrice => "housing",
            Indicator::UnemploymentRate => "unemployment",
            Indicator::AverageGasPrice => "gas",
        }
    }

    /// Income is never a selectable comparison target
    pub fn is_baseline(&self) -> bool {
        matches!(self, Indicator::MedianHouseholdIncome)
    }

    /// Resolve a user-supplied name: variant name, display name, or code
    ///
    /// Case, spaces, underscores and dashes are ignored, so
    /// "AverageGasPrice", "Average Gas Price", "average_gas_price" and
    /// "gas" all resolve to the same indicator.
    pub fn resolve(name: &str) -> Option<Indicator> {
        let wanted = normalize(name);
        if wanted.is_empty() {
            return None;
        }

        Indicator::ALL.into_iter().find(|indicator| {
            normalize(indicator.name()) == wanted
                || normalize(&format!("{:?}", indicator)) == wanted
                || indicator.code() == wanted
        })
    }

    fn index(&self) -> usize {
        match self {
            Indicator::MedianHouseholdIncome => 0,
            Indicator::MedianHousingPrice => 1,
            Indicator::UnemploymentRate => 2,
            Indicator::AverageGasPrice => 3,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

// ============================================================================
// INDICATOR SPEC
// ============================================================================

/// IndicatorSpec - how one indicator is sourced, scaled, and printed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub indicator: Indicator,

    /// Decimals shown everywhere (and used when averaging sub-annual samples)
    pub decimals: u32,

    /// Unit written before the number (e.g. "$")
    pub prefix: String,

    /// Unit written after the number (e.g. "%")
    pub suffix: String,

    /// Group integer digits with commas
    pub thousands: bool,

    /// Fixed axis range for charts; None lets the renderer autoscale
    pub display_range: Option<[f64; 2]>,

    /// Chart color (hex)
    pub color: String,

    /// Axis title, unit included
    pub axis_title: String,

    /// Column id used by the upstream data provider
    pub series_id: String,
}

impl IndicatorSpec {
    /// Create a spec with plain two-decimal formatting
    pub fn new(indicator: Indicator) -> Self {
        IndicatorSpec {
            indicator,
            decimals: 2,
            prefix: String::new(),
            suffix: String::new(),
            thousands: false,
            display_range: None,
            color: "#000000".to_string(),
            axis_title: indicator.name().to_string(),
            series_id: String::new(),
        }
    }

    /// Builder: currency with "$" prefix
    pub fn currency(mut self, decimals: u32, thousands: bool) -> Self {
        self.prefix = "$".to_string();
        self.decimals = decimals;
        self.thousands = thousands;
        self
    }

    /// Builder: percentage with "%" suffix
    pub fn percent(mut self, decimals: u32) -> Self {
        self.suffix = "%".to_string();
        self.decimals = decimals;
        self
    }

    /// Builder: fixed axis range
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.display_range = Some([min, max]);
        self
    }

    /// Builder: chart color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Builder: axis title
    pub fn with_axis_title(mut self, title: impl Into<String>) -> Self {
        self.axis_title = title.into();
        self
    }

    /// Builder: provider series id
    pub fn with_series_id(mut self, id: impl Into<String>) -> Self {
        self.series_id = id.into();
        self
    }

    /// Round to this indicator's display precision
    pub fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.decimals as i32);
        (value * factor).round() / factor
    }

    /// Format a value with unit, e.g. "$74,314", "3.9%", "$2.85"
    pub fn format(&self, value: f64) -> String {
        let rounded = self.round(value);
        let sign = if rounded < 0.0 { "-" } else { "" };
        format!("{}{}{}{}", sign, self.prefix, self.digits(rounded), self.suffix)
    }

    /// Format a delta with explicit sign, e.g. "+$0.50", "-1.2%"
    pub fn format_signed(&self, delta: f64) -> String {
        let rounded = self.round(delta);
        let sign = if rounded > 0.0 {
            "+"
        } else if rounded < 0.0 {
            "-"
        } else {
            ""
        };
        format!("{}{}{}{}", sign, self.prefix, self.digits(rounded), self.suffix)
    }

    /// Format without sign, used for "increased by ..." wording
    pub fn format_magnitude(&self, delta: f64) -> String {
        self.format(self.round(delta).abs())
    }

    fn digits(&self, value: f64) -> String {
        let plain = format!("{:.*}", self.decimals as usize, value.abs());
        if !self.thousands {
            return plain;
        }

        let (int_part, frac_part) = match plain.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (plain.as_str(), None),
        };

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        match frac_part {
            Some(frac) => format!("{}.{}", grouped, frac),
            None => grouped,
        }
    }
}

// ============================================================================
// INDICATOR CATALOG
// ============================================================================

/// IndicatorCatalog - the single table of per-indicator display rules
///
/// Every indicator always has a spec; `register` replaces one.
#[derive(Debug, Clone)]
pub struct IndicatorCatalog {
    specs: [IndicatorSpec; 4],
}

impl IndicatorCatalog {
    /// Catalog with the New York dashboard conventions
    pub fn standard() -> Self {
        IndicatorCatalog {
            specs: [
                IndicatorSpec::new(Indicator::MedianHouseholdIncome)
                    .currency(0, true)
                    .with_color("#3cb521")
                    .with_axis_title("Median Household Income ($)")
                    .with_series_id("MEHOINUSNYA672N"),
                IndicatorSpec::new(Indicator::MedianHousingPrice)
                    .currency(0, true)
                    .with_color("#fd7e14")
                    .with_axis_title("Median Housing Price ($)")
                    .with_series_id("MEDLISPRINY"),
                IndicatorSpec::new(Indicator::UnemploymentRate)
                    .percent(1)
                    .with_range(0.0, 15.0)
                    .with_color("#446e9b")
                    .with_axis_title("Unemployment Rate (%)")
                    .with_series_id("NYUR"),
                IndicatorSpec::new(Indicator::AverageGasPrice)
                    .currency(2, false)
                    .with_color("#cd0200")
                    .with_axis_title("Average Gas Price ($/gal)")
                    .with_series_id("EMM_EPMR_PTE_SNY_DPG"),
            ],
        }
    }

    /// Replace the spec for one indicator
    pub fn register(&mut self, spec: IndicatorSpec) {
        let index = spec.indicator.index();
        self.specs[index] = spec;
    }

    /// Display rules for an indicator
    pub fn spec(&self, indicator: Indicator) -> &IndicatorSpec {
        &self.specs[indicator.index()]
    }

    pub fn format(&self, indicator: Indicator, value: f64) -> String {
        self.spec(indicator).format(value)
    }

    /// All specs in declaration order
    pub fn list_all(&self) -> &[IndicatorSpec] {
        &self.specs
    }
}

impl Default for IndicatorCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_accepts_names_codes_and_variants() {
        assert_eq!(Indicator::resolve("AverageGasPrice"), Some(Indicator::AverageGasPrice));
        assert_eq!(Indicator::resolve("Average Gas Price"), Some(Indicator::AverageGasPrice));
        assert_eq!(Indicator::resolve("average_gas_price"), Some(Indicator::AverageGasPrice));
        assert_eq!(Indicator::resolve("gas"), Some(Indicator::AverageGasPrice));
        assert_eq!(Indicator::resolve("UNEMPLOYMENT"), Some(Indicator::UnemploymentRate));
        assert_eq!(Indicator::resolve("rent"), None);
        assert_eq!(Indicator::resolve("  "), None);
    }

    #[test]
    fn test_currency_uses_thousands_separator() {
        let catalog = IndicatorCatalog::standard();

        assert_eq!(catalog.format(Indicator::MedianHouseholdIncome, 74314.0), "$74,314");
        assert_eq!(catalog.format(Indicator::MedianHousingPrice, 1_250_000.4), "$1,250,000");
        assert_eq!(catalog.format(Indicator::MedianHousingPrice, 999.0), "$999");
        assert_eq!(catalog.format(Indicator::MedianHouseholdIncome, -1500.0), "-$1,500");
    }

    #[test]
    fn test_gas_price_two_decimals() {
        let catalog = IndicatorCatalog::standard();
        assert_eq!(catalog.format(Indicator::AverageGasPrice, 2.5), "$2.50");
        assert_eq!(catalog.format(Indicator::AverageGasPrice, 3.456), "$3.46");
    }

    #[test]
    fn test_unemployment_one_decimal_percent() {
        let catalog = IndicatorCatalog::standard();
        assert_eq!(catalog.format(Indicator::UnemploymentRate, 3.9), "3.9%");
        assert_eq!(catalog.format(Indicator::UnemploymentRate, 10.0), "10.0%");
        assert_eq!(catalog.format(Indicator::UnemploymentRate, 4.26), "4.3%");
    }

    #[test]
    fn test_signed_and_magnitude_formatting() {
        let gas = IndicatorCatalog::standard().spec(Indicator::AverageGasPrice).clone();

        assert_eq!(gas.format_signed(0.5), "+$0.50");
        assert_eq!(gas.format_signed(-0.25), "-$0.25");
        assert_eq!(gas.format_signed(0.0), "$0.00");
        assert_eq!(gas.format_magnitude(-0.25), "$0.25");
    }

    #[test]
    fn test_register_replaces_spec() {
        let mut catalog = IndicatorCatalog::standard();
        catalog.register(
            IndicatorSpec::new(Indicator::AverageGasPrice)
                .currency(3, false)
                .with_range(0.0, 6.0),
        );

        let spec = catalog.spec(Indicator::AverageGasPrice);
        assert_eq!(spec.decimals, 3);
        assert_eq!(spec.display_range, Some([0.0, 6.0]));
        assert_eq!(catalog.format(Indicator::AverageGasPrice, 2.5), "$2.500");
    }

    #[test]
    fn test_only_income_is_baseline() {
        let baselines: Vec<_> = Indicator::ALL.iter().filter(|i| i.is_baseline()).collect();
        assert_eq!(baselines, vec![&Indicator::MedianHouseholdIncome]);
    }
}
