// Shared test data: a gap-free 2010-2022 table with all four indicators

use crate::indicators::Indicator;
use crate::loader::{AnnualRecord, AnnualTable};
use std::collections::BTreeMap;

pub const FIRST_YEAR: i32 = 2010;
pub const LAST_YEAR: i32 = 2022;

const UNEMPLOYMENT: [f64; 13] = [8.6, 8.3, 8.5, 7.7, 6.3, 5.3, 4.9, 4.6, 4.1, 3.9, 9.8, 7.0, 4.3];
const GAS: [f64; 13] = [3.0, 3.7, 3.8, 3.6, 3.5, 2.6, 2.3, 2.5, 2.8, 2.5, 3.0, 3.3, 4.2];

pub fn sample_table() -> AnnualTable {
    table_with(Indicator::ALL.to_vec())
}

/// Same numbers restricted to `indicators`
pub fn table_with(indicators: Vec<Indicator>) -> AnnualTable {
    let records = (FIRST_YEAR..=LAST_YEAR)
        .enumerate()
        .map(|(i, year)| {
            let all = [
                (Indicator::MedianHouseholdIncome, 60000.0 + 1000.0 * i as f64),
                (Indicator::MedianHousingPrice, 400000.0 + 10000.0 * i as f64),
                (Indicator::UnemploymentRate, UNEMPLOYMENT[i]),
                (Indicator::AverageGasPrice, GAS[i]),
            ];
            let values: BTreeMap<Indicator, f64> = all
                .into_iter()
                .filter(|(indicator, _)| indicators.contains(indicator))
                .collect();
            AnnualRecord { year, values }
        })
        .collect();

    AnnualTable::from_records(indicators, records).expect("fixture table is complete")
}
