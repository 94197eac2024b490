// ⚙️ Configuration
// Environment-driven settings, loaded once at startup (.env honoured)

use crate::indicators::Indicator;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

// ============================================================================
// VARIANT
// ============================================================================

/// Variant - which dashboard is being served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Income, housing, unemployment; both comparisons always shown
    Classic,
    /// Adds gas price, an indicator selector, results table and history
    Extended,
}

impl Variant {
    pub fn parse(raw: &str) -> Option<Variant> {
        match raw.trim().to_lowercase().as_str() {
            "classic" | "v1" => Some(Variant::Classic),
            "extended" | "v2" => Some(Variant::Extended),
            _ => None,
        }
    }

    /// Indicators every merged row must carry
    pub fn indicators(&self) -> Vec<Indicator> {
        match self {
            Variant::Classic => vec![
                Indicator::MedianHouseholdIncome,
                Indicator::MedianHousingPrice,
                Indicator::UnemploymentRate,
            ],
            Variant::Extended => Indicator::ALL.to_vec(),
        }
    }

    /// Indicators the selector may choose from
    pub fn selectable(&self) -> Vec<Indicator> {
        match self {
            Variant::Classic => Vec::new(),
            Variant::Extended => self
                .indicators()
                .into_iter()
                .filter(|i| !i.is_baseline())
                .collect(),
        }
    }

    /// Indicator preselected when a session starts
    pub fn default_indicator(&self) -> Option<Indicator> {
        match self {
            Variant::Classic => None,
            Variant::Extended => Some(Indicator::UnemploymentRate),
        }
    }
}

/// Comparison targets when no indicator is selected
pub const FIXED_COMPARISONS: [Indicator; 2] =
    [Indicator::UnemploymentRate, Indicator::MedianHousingPrice];

// ============================================================================
// DASHBOARD CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub indicator: Indicator,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Directory holding one CSV per indicator
    pub data_dir: PathBuf,
    /// Region shown in titles
    pub region: String,
    pub variant: Variant,
    pub sources: Vec<SourceFile>,
    /// Server listen address
    pub bind_addr: String,
    /// "production" switches logs to JSON
    pub environment: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_dir: PathBuf::from("assets"),
            region: "New York".to_string(),
            variant: Variant::Extended,
            sources: vec![
                SourceFile {
                    indicator: Indicator::MedianHouseholdIncome,
                    file_name: "real-median-household-income-NY.csv".to_string(),
                },
                SourceFile {
                    indicator: Indicator::MedianHousingPrice,
                    file_name: "median-listing-price-NY.csv".to_string(),
                },
                SourceFile {
                    indicator: Indicator::UnemploymentRate,
                    file_name: "unemployment-rate-NY.csv".to_string(),
                },
                SourceFile {
                    indicator: Indicator::AverageGasPrice,
                    file_name: "average-gas-price-NY.csv".to_string(),
                },
            ],
            bind_addr: "0.0.0.0:3000".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Read settings from the process environment
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should apply.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = DashboardConfig::default();

        if let Some(dir) = lookup("COL_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(region) = lookup("COL_REGION") {
            config.region = region;
        }
        if let Some(raw) = lookup("COL_VARIANT") {
            match Variant::parse(&raw) {
                Some(variant) => config.variant = variant,
                None => bail!("COL_VARIANT must be 'classic' or 'extended', got '{}'", raw),
            }
        }
        if let Some(addr) = lookup("COL_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(environment) = lookup("COL_ENV") {
            config.environment = environment;
        }

        for source in &mut config.sources {
            let key = format!("COL_{}_FILE", source.indicator.code().to_uppercase());
            if let Some(file_name) = lookup(&key) {
                source.file_name = file_name;
            }
        }

        Ok(config)
    }

    /// Full path of an indicator's CSV, if one is configured
    pub fn source_path(&self, indicator: Indicator) -> Option<PathBuf> {
        self.sources
            .iter()
            .find(|s| s.indicator == indicator)
            .map(|s| self.data_dir.join(&s.file_name))
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }
}

// ============================================================================
// TESTS
// ============================================================================
