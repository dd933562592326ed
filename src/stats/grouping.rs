//! Grouped Aggregation Module
//! Region, country and daily totals over the cleaned observations table.

use crate::data::columns::{
    self, COUNTRY, CUMULATIVE_CASES, CUMULATIVE_DEATHS, DATE, NEW_CASES, NEW_DEATHS, REGION,
};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Totals for one WHO region.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub countries: usize,
    pub total_new_cases: f64,
    pub total_new_deaths: f64,
    pub mean_new_cases: f64,
    /// Sum of the latest cumulative value of each member country
    pub cumulative_cases: f64,
    pub cumulative_deaths: f64,
}

/// Totals for one country.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CountrySummary {
    pub country: String,
    pub region: String,
    pub total_new_cases: f64,
    pub total_new_deaths: f64,
    pub latest_cumulative_cases: f64,
    pub latest_cumulative_deaths: f64,
    pub mean_cumulative_deaths: f64,
}

/// Global counts for one report date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub new_cases: f64,
    pub new_deaths: f64,
}

/// Ranking key for [`GroupAggregator::top_countries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryMetric {
    TotalNewCases,
    LatestCumulativeCases,
    LatestCumulativeDeaths,
    MeanCumulativeDeaths,
}

impl CountryMetric {
    fn value(self, summary: &CountrySummary) -> f64 {
        match self {
            CountryMetric::TotalNewCases => summary.total_new_cases,
            CountryMetric::LatestCumulativeCases => summary.latest_cumulative_cases,
            CountryMetric::LatestCumulativeDeaths => summary.latest_cumulative_deaths,
            CountryMetric::MeanCumulativeDeaths => summary.mean_cumulative_deaths,
        }
    }
}

/// Handles grouped aggregations with the Polars lazy API.
pub struct GroupAggregator;

impl GroupAggregator {
    /// Per-country totals, ordered by country name.
    ///
    /// The latest cumulative value is the running maximum: cumulative counts
    /// never decrease, and a zero-filled gap on the last report date must not
    /// hide the total reached before it.
    pub fn by_country(df: &DataFrame) -> PolarsResult<Vec<CountrySummary>> {
        let grouped = df
            .clone()
            .lazy()
            .group_by([col(COUNTRY), col(REGION)])
            .agg([
                col(NEW_CASES).sum().alias("total_new_cases"),
                col(NEW_DEATHS).sum().alias("total_new_deaths"),
                col(CUMULATIVE_CASES).max().alias("latest_cumulative_cases"),
                col(CUMULATIVE_DEATHS).max().alias("latest_cumulative_deaths"),
                col(CUMULATIVE_DEATHS).mean().alias("mean_cumulative_deaths"),
            ])
            .sort([COUNTRY, REGION], SortMultipleOptions::default())
            .collect()?;

        let countries = columns::str_values(&grouped, COUNTRY)?;
        let regions = columns::str_values(&grouped, REGION)?;
        let new_cases = columns::f64_values(&grouped, "total_new_cases")?;
        let new_deaths = columns::f64_values(&grouped, "total_new_deaths")?;
        let cum_cases = columns::f64_values(&grouped, "latest_cumulative_cases")?;
        let cum_deaths = columns::f64_values(&grouped, "latest_cumulative_deaths")?;
        let mean_deaths = columns::f64_values(&grouped, "mean_cumulative_deaths")?;

        Ok((0..grouped.height())
            .map(|i| CountrySummary {
                country: countries[i].clone(),
                region: regions[i].clone(),
                total_new_cases: new_cases[i],
                total_new_deaths: new_deaths[i],
                latest_cumulative_cases: cum_cases[i],
                latest_cumulative_deaths: cum_deaths[i],
                mean_cumulative_deaths: mean_deaths[i],
            })
            .collect())
    }

    /// Per-region totals, ordered by region code.
    ///
    /// Cumulative figures are the sum of each member country's latest value,
    /// so they agree with [`GroupAggregator::by_country`].
    pub fn by_region(df: &DataFrame) -> PolarsResult<Vec<RegionSummary>> {
        let grouped = df
            .clone()
            .lazy()
            .group_by([col(REGION)])
            .agg([
                col(NEW_CASES).sum().alias("total_new_cases"),
                col(NEW_DEATHS).sum().alias("total_new_deaths"),
                col(NEW_CASES).mean().alias("mean_new_cases"),
                col(COUNTRY)
                    .n_unique()
                    .cast(DataType::UInt32)
                    .alias("countries"),
            ])
            .sort([REGION], SortMultipleOptions::default())
            .collect()?;

        let mut cumulative: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        for country in Self::by_country(df)? {
            let entry = cumulative.entry(country.region).or_default();
            entry.0 += country.latest_cumulative_cases;
            entry.1 += country.latest_cumulative_deaths;
        }

        let regions = columns::str_values(&grouped, REGION)?;
        let new_cases = columns::f64_values(&grouped, "total_new_cases")?;
        let new_deaths = columns::f64_values(&grouped, "total_new_deaths")?;
        let mean_cases = columns::f64_values(&grouped, "mean_new_cases")?;
        let country_counts: Vec<usize> = grouped
            .column("countries")?
            .u32()?
            .into_iter()
            .map(|n| n.unwrap_or(0) as usize)
            .collect();

        Ok((0..grouped.height())
            .map(|i| {
                let (cumulative_cases, cumulative_deaths) =
                    cumulative.get(&regions[i]).copied().unwrap_or_default();
                RegionSummary {
                    region: regions[i].clone(),
                    countries: country_counts[i],
                    total_new_cases: new_cases[i],
                    total_new_deaths: new_deaths[i],
                    mean_new_cases: mean_cases[i],
                    cumulative_cases,
                    cumulative_deaths,
                }
            })
            .collect())
    }

    /// Global new cases and deaths per report date, ascending.
    pub fn by_date(df: &DataFrame) -> PolarsResult<Vec<DailyTotal>> {
        let grouped = df
            .clone()
            .lazy()
            .group_by([col(DATE)])
            .agg([
                col(NEW_CASES).sum().alias(NEW_CASES),
                col(NEW_DEATHS).sum().alias(NEW_DEATHS),
            ])
            .sort([DATE], SortMultipleOptions::default())
            .collect()?;

        let dates = columns::date_values(&grouped, DATE)?;
        let new_cases = columns::f64_values(&grouped, NEW_CASES)?;
        let new_deaths = columns::f64_values(&grouped, NEW_DEATHS)?;

        Ok(dates
            .into_iter()
            .zip(new_cases.into_iter().zip(new_deaths))
            .filter_map(|(date, (new_cases, new_deaths))| {
                Some(DailyTotal {
                    date: date?,
                    new_cases,
                    new_deaths,
                })
            })
            .collect())
    }

    /// The `n` highest countries by `metric`, ties kept in name order.
    pub fn top_countries(
        countries: &[CountrySummary],
        n: usize,
        metric: CountryMetric,
    ) -> Vec<CountrySummary> {
        let mut ranked = countries.to_vec();
        ranked.sort_by(|a, b| {
            metric
                .value(b)
                .partial_cmp(&metric.value(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(n);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CleaningOptions, DataProcessor, FillStrategy};
    use pretty_assertions::assert_eq;

    fn cleaned() -> DataFrame {
        let raw = df![
            DATE => [
                "2025-02-01", "2025-02-02", "2025-02-01", "2025-02-02", "2025-02-01", "2025-02-02"
            ],
            COUNTRY => ["Spain", "Spain", "Italy", "Italy", "Ghana", "Ghana"],
            REGION => ["EUR", "EUR", "EUR", "EUR", "AFR", "AFR"],
            NEW_CASES => [10.0f64, 20.0, 5.0, 15.0, 1.0, 2.0],
            CUMULATIVE_CASES => [100.0f64, 120.0, 50.0, 65.0, 7.0, 9.0],
            NEW_DEATHS => [1.0f64, 2.0, 0.0, 1.0, 0.0, 0.0],
            CUMULATIVE_DEATHS => [10.0f64, 12.0, 4.0, 5.0, 1.0, 1.0],
        ]
        .unwrap();
        DataProcessor::clean(&raw, &CleaningOptions::default()).unwrap().0
    }

    #[test]
    fn test_by_country() {
        let countries = GroupAggregator::by_country(&cleaned()).unwrap();
        let names: Vec<&str> = countries.iter().map(|c| c.country.as_str()).collect();
        assert_eq!(names, vec!["Ghana", "Italy", "Spain"]);

        let spain = &countries[2];
        assert_eq!(spain.region, "EUR");
        assert_eq!(spain.total_new_cases, 30.0);
        assert_eq!(spain.total_new_deaths, 3.0);
        assert_eq!(spain.latest_cumulative_cases, 120.0);
        assert_eq!(spain.latest_cumulative_deaths, 12.0);
        assert_eq!(spain.mean_cumulative_deaths, 11.0);
    }

    #[test]
    fn test_region_sums_equal_country_sums() {
        let df = cleaned();
        let regions = GroupAggregator::by_region(&df).unwrap();
        let countries = GroupAggregator::by_country(&df).unwrap();

        assert_eq!(regions.len(), 2);
        for region in &regions {
            let members: Vec<&CountrySummary> = countries
                .iter()
                .filter(|c| c.region == region.region)
                .collect();
            let cases: f64 = members.iter().map(|c| c.total_new_cases).sum();
            let deaths: f64 = members.iter().map(|c| c.total_new_deaths).sum();
            let cumulative: f64 = members.iter().map(|c| c.latest_cumulative_cases).sum();

            assert_eq!(region.total_new_cases, cases);
            assert_eq!(region.total_new_deaths, deaths);
            assert_eq!(region.cumulative_cases, cumulative);
            assert_eq!(region.countries, members.len());
        }

        let eur = regions.iter().find(|r| r.region == "EUR").unwrap();
        assert_eq!(eur.total_new_cases, 50.0);
        assert_eq!(eur.mean_new_cases, 12.5);
        assert_eq!(eur.cumulative_cases, 185.0);
        assert_eq!(eur.cumulative_deaths, 17.0);
    }

    #[test]
    fn test_trailing_missing_cumulative_keeps_reached_total() {
        let raw = df![
            DATE => ["2025-02-01", "2025-02-02"],
            COUNTRY => ["Chile", "Chile"],
            REGION => ["AMR", "AMR"],
            NEW_CASES => [5.0f64, 3.0],
            CUMULATIVE_CASES => [Some(500.0f64), None],
            NEW_DEATHS => [1.0f64, 0.0],
            CUMULATIVE_DEATHS => [Some(9.0f64), None],
        ]
        .unwrap();
        let df = DataProcessor::clean(&raw, &CleaningOptions::default()).unwrap().0;

        let countries = GroupAggregator::by_country(&df).unwrap();
        assert_eq!(countries[0].latest_cumulative_cases, 500.0);
        assert_eq!(countries[0].latest_cumulative_deaths, 9.0);

        let regions = GroupAggregator::by_region(&df).unwrap();
        assert_eq!(regions[0].countries, 1);
        assert_eq!(regions[0].cumulative_cases, 500.0);
        assert_eq!(regions[0].cumulative_deaths, 9.0);
    }

    #[test]
    fn test_mid_series_gap_under_either_fill() {
        let raw = df![
            DATE => ["2025-02-01", "2025-02-02", "2025-02-03"],
            COUNTRY => ["Peru", "Peru", "Peru"],
            REGION => ["AMR", "AMR", "AMR"],
            NEW_CASES => [4.0f64, 2.0, 6.0],
            CUMULATIVE_CASES => [Some(100.0f64), None, Some(112.0)],
            NEW_DEATHS => [0.0f64, 0.0, 1.0],
            CUMULATIVE_DEATHS => [Some(3.0f64), None, Some(4.0)],
        ]
        .unwrap();

        for fill in [FillStrategy::Zero, FillStrategy::ForwardFill] {
            let df = DataProcessor::clean(&raw, &CleaningOptions { fill }).unwrap().0;
            let gap = columns::f64_values(&df, CUMULATIVE_CASES).unwrap()[1];
            let expected_gap = if fill == FillStrategy::Zero { 0.0 } else { 100.0 };
            assert_eq!(gap, expected_gap, "{fill:?}");

            let peru = &GroupAggregator::by_country(&df).unwrap()[0];
            assert_eq!(peru.latest_cumulative_cases, 112.0, "{fill:?}");
            assert_eq!(peru.latest_cumulative_deaths, 4.0, "{fill:?}");
        }
    }

    #[test]
    fn test_by_date() {
        let daily = GroupAggregator::by_date(&cleaned()).unwrap();
        assert_eq!(
            daily,
            vec![
                DailyTotal {
                    date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                    new_cases: 16.0,
                    new_deaths: 1.0,
                },
                DailyTotal {
                    date: NaiveDate::from_ymd_opt(2025, 2, 2).unwrap(),
                    new_cases: 37.0,
                    new_deaths: 3.0,
                },
            ]
        );
    }

    #[test]
    fn test_top_countries() {
        let countries = GroupAggregator::by_country(&cleaned()).unwrap();
        let top =
            GroupAggregator::top_countries(&countries, 2, CountryMetric::MeanCumulativeDeaths);
        let names: Vec<&str> = top.iter().map(|c| c.country.as_str()).collect();
        assert_eq!(names, vec!["Spain", "Italy"]);

        let none = GroupAggregator::top_countries(&countries, 0, CountryMetric::TotalNewCases);
        assert!(none.is_empty());

        let all =
            GroupAggregator::top_countries(&countries, 10, CountryMetric::LatestCumulativeCases);
        assert_eq!(all.len(), 3);

        let by_deaths =
            GroupAggregator::top_countries(&countries, 1, CountryMetric::LatestCumulativeDeaths);
        assert_eq!(by_deaths[0].country, "Spain");
    }

    #[test]
    fn test_empty_table_yields_empty_groups() {
        let df = cleaned().head(Some(0));
        assert!(GroupAggregator::by_country(&df).unwrap().is_empty());
        assert!(GroupAggregator::by_region(&df).unwrap().is_empty());
        assert!(GroupAggregator::by_date(&df).unwrap().is_empty());
    }
}
