//! Join fund returns with the factor table.
//!
//! The return frame is filtered of excluded identifiers, left-joined with the
//! factor frame on date, given an excess-return column, stripped of every
//! period where the return, the risk-free rate, or any selected factor is
//! missing, and partitioned by fund. Each partition then passes through
//! [`FundSeries::new`], which is the validation boundary: a fund that fails it
//! is set aside as a [`RejectedFund`] rather than failing the whole universe.

use crate::config::IngestConfig;
use crate::error::Result;
use crate::factors::FactorTable;
use crate::frame::{DATE, EXCESS, FUND, RETURN, RISK_FREE, dates_of};
use crate::returns::ReturnTable;
use crate::series::{FundId, FundSeries, FundUniverse, Observation, RejectedFund};
use polars::prelude::*;
use std::collections::HashMap;

/// Build one fund's series from its date-sorted partition of the aligned frame.
fn series_from_frame(fund: FundId, frame: &DataFrame, factor_names: &[String]) -> Result<FundSeries> {
    let dates = dates_of(frame)?;
    let excess = frame.column(EXCESS)?.f64()?;
    let factors = factor_names
        .iter()
        .map(|name| Ok(frame.column(name.as_str())?.f64()?))
        .collect::<Result<Vec<_>>>()?;

    let observations = dates
        .iter()
        .enumerate()
        .map(|(row, date)| {
            let factor_returns = factors
                .iter()
                .map(|values| values.get(row).unwrap_or(f64::NAN))
                .collect();
            Observation::new(*date, excess.get(row).unwrap_or(f64::NAN), factor_returns)
        })
        .collect();

    FundSeries::new(fund, factor_names.len(), observations)
}

/// Align every fund in the return table against the factor table.
///
/// Rows for excluded identifiers (benchmarks, peer-group statistics) are
/// dropped first. Funds keep the order of their first appearance; a fund whose
/// periods were all dropped becomes an empty series.
///
/// # Errors
///
/// Returns an error only for table-level failures (a polars operation on the
/// whole frame). Per-fund failures are recorded on the universe.
pub fn build_universe(
    returns: &ReturnTable,
    factors: &FactorTable,
    config: &IngestConfig,
) -> Result<FundUniverse> {
    let factor_names = factors.factor_names();
    let excluded = Series::new("excluded".into(), config.excluded_funds.clone());

    let kept = returns
        .frame()
        .clone()
        .lazy()
        .filter(col(FUND).is_not_null().and(col(FUND).is_in(lit(excluded)).not()))
        .collect()?;
    let order: Vec<FundId> = kept
        .column(FUND)?
        .as_materialized_series()
        .unique_stable()?
        .str()?
        .into_iter()
        .flatten()
        .map(FundId::from)
        .collect();

    let complete = factor_names.iter().fold(
        col(EXCESS).is_not_null().and(col(RISK_FREE).is_not_null()),
        |acc, name| acc.and(col(name.as_str()).is_not_null()),
    );
    let aligned = kept
        .clone()
        .lazy()
        .join(
            factors.frame().clone().lazy(),
            [col(DATE)],
            [col(DATE)],
            JoinArgs::new(JoinType::Left),
        )
        .with_column((col(RETURN) - col(RISK_FREE)).alias(EXCESS))
        .filter(complete)
        .sort([FUND, DATE], SortMultipleOptions::default())
        .collect()?;

    let mut partitions: HashMap<FundId, DataFrame> = HashMap::new();
    for part in aligned.partition_by_stable([FUND], true)? {
        if let Some(fund) = part.column(FUND)?.str()?.get(0) {
            partitions.insert(FundId::from(fund), part);
        }
    }

    let mut funds = Vec::with_capacity(order.len());
    let mut rejected = Vec::new();
    for fund in order {
        let built = match partitions.remove(&fund) {
            Some(part) => series_from_frame(fund.clone(), &part, factor_names),
            None => Ok(FundSeries::empty(fund.clone(), factor_names.len())),
        };
        match built {
            Ok(series) => {
                tracing::debug!(fund = %fund, kept = series.len(), "aligned fund returns");
                funds.push(series);
            }
            Err(err) => {
                tracing::warn!(fund = %fund, error = %err, "fund rejected during alignment");
                rejected.push(RejectedFund::new(fund, err.to_string()));
            }
        }
    }

    tracing::info!(
        funds = funds.len(),
        rejected = rejected.len(),
        excluded_rows = returns.len() - kept.height(),
        aligned_rows = aligned.height(),
        "built fund universe"
    );
    Ok(FundUniverse::new(factor_names.to_vec(), funds)?.with_rejected(rejected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::factors::read_factors;
    use crate::returns::read_returns;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    const FACTORS: &str = "\
Date,Mkt-RF,SMB,RF
202101,0.5,0.1,0.25
202102,0.5,0.1,0.25
202103,0.5,,0.25
202104,0.5,0.1,0.25
";

    fn month(m: u32) -> NaiveDate {
        crate::dates::month_end(2021, m).unwrap()
    }

    fn universe(returns: &str) -> FundUniverse {
        let config = IngestConfig::default();
        let names = vec!["Mkt-RF".to_string(), "SMB".to_string()];
        let factors = read_factors(FACTORS.as_bytes(), &names, &config).unwrap();
        let returns = read_returns(returns.as_bytes(), &config).unwrap();
        build_universe(&returns, &factors, &config).unwrap()
    }

    #[test]
    fn test_align_drops_incomplete_periods() {
        let universe = universe(
            "\
Date,Fund,Returns
2021-04-30,A,2.0
2021-01-31,A,1.0
2021-02-28,A,
2021-03-31,A,3.0
2021-05-31,A,5.0
",
        );
        let series = universe.get(&"A".into()).unwrap();

        // Feb missing return, Mar missing SMB, May outside factor table.
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), Some(month(1)));
        assert_eq!(series.last_date(), Some(month(4)));
        assert_relative_eq!(series.observations()[0].excess_return, 0.75);
        assert_relative_eq!(series.observations()[1].excess_return, 1.75);
        assert_eq!(series.observations()[0].factor_returns, vec![0.5, 0.1]);
    }

    #[test]
    fn test_align_all_missing_is_empty() {
        let universe = universe("Date,Fund,Returns\n2021-01-31,A,\n2021-02-28,A,NA\n");
        let series = universe.get(&"A".into()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.factor_count(), 2);
    }

    #[test]
    fn test_duplicate_dates_reject_only_that_fund() {
        let universe = universe(
            "\
Date,Fund,Returns
2021-01-31,Good,1.0
2021-01-31,Bad,1.0
2021-01-31,Bad,1.1
2021-02-28,Good,2.0
",
        );

        assert_eq!(universe.len(), 1);
        assert_eq!(universe.get(&"Good".into()).unwrap().len(), 2);
        assert!(universe.get(&"Bad".into()).is_none());

        let rejected = universe.rejected();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].fund.as_str(), "Bad");
        assert_eq!(
            rejected[0].reason,
            DataError::DuplicateDate {
                fund: "Bad".to_string(),
                date: month(1),
            }
            .to_string()
        );
    }

    #[test]
    fn test_build_universe_filters_benchmarks_and_keeps_order() {
        let universe = universe(
            "\
Date,Fund,Returns
2021-01-31,Zeta,1.0
2021-01-31,Median,1.0
2021-01-31,Alpha,1.0
2021-02-28,Zeta,1.0
",
        );
        let ids: Vec<&str> = universe.funds().iter().map(|s| s.fund().as_str()).collect();
        assert_eq!(ids, vec!["Zeta", "Alpha"]);
        assert_eq!(universe.factor_names(), &["Mkt-RF", "SMB"]);
        assert_eq!(universe.get(&"Zeta".into()).unwrap().len(), 2);
        assert!(universe.rejected().is_empty());
    }
}
