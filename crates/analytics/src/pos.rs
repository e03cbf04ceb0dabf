// Copyright 2026 Meridian Labs, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! POS terminal reward aggregation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::daily::business_day;
use crate::delta::{guarded_ratio, Delta, OnZeroDenominator};
use crate::ranking::{rank_entities, RankedEntity};
use crate::rows::PosRow;
use crate::windows::{BoundaryTable, SourceKind};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PosMetrics {
    pub total_tx: u64,
    pub total_amount: f64,
    pub max_amount: f64,
    pub min_amount: f64,
    pub total_revenue: f64,
    /// Mean payout per reward event.
    pub avg_reward: f64,
    /// Revenue taken in per token emitted over the period.
    pub emission_efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosComparison {
    pub total_tx: Delta<u64>,
    pub total_amount: Delta<f64>,
    pub max_amount: Delta<f64>,
    pub min_amount: Delta<f64>,
    pub total_revenue: Delta<f64>,
    pub avg_reward: Delta<f64>,
    pub emission_efficiency: Delta<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosDailyPoint {
    pub date: NaiveDate,
    pub token_sent: f64,
    pub revenue: f64,
}

pub fn aggregate(rows: &[PosRow]) -> PosMetrics {
    if rows.is_empty() {
        return PosMetrics::default();
    }

    let total_tx = rows.len() as u64;
    let total_amount: f64 = rows.iter().map(|r| r.amount).sum();
    let total_revenue: f64 = rows.iter().map(|r| r.revenue).sum();
    let max_amount = rows.iter().map(|r| r.amount).fold(f64::MIN, f64::max);
    let min_amount = rows.iter().map(|r| r.amount).fold(f64::MAX, f64::min);

    PosMetrics {
        total_tx,
        total_amount,
        max_amount,
        min_amount,
        total_revenue,
        avg_reward: guarded_ratio(total_amount, total_tx as f64, OnZeroDenominator::ReturnZero)
            .unwrap_or(0.0),
        emission_efficiency: guarded_ratio(
            total_revenue,
            total_amount,
            OnZeroDenominator::ReturnZero,
        )
        .unwrap_or(0.0),
    }
}

pub fn compare(current: &PosMetrics, previous: &PosMetrics) -> PosComparison {
    PosComparison {
        total_tx: Delta::<u64>::new(current.total_tx, previous.total_tx),
        total_amount: Delta::<f64>::new(current.total_amount, previous.total_amount),
        max_amount: Delta::<f64>::new(current.max_amount, previous.max_amount),
        min_amount: Delta::<f64>::new(current.min_amount, previous.min_amount),
        total_revenue: Delta::<f64>::new(current.total_revenue, previous.total_revenue),
        avg_reward: Delta::<f64>::new(current.avg_reward, previous.avg_reward),
        emission_efficiency: Delta::<f64>::new(
            current.emission_efficiency,
            previous.emission_efficiency,
        ),
    }
}

/// Daily payouts under the noon business-day boundary.
pub fn daily_series(rows: &[PosRow], boundaries: &BoundaryTable) -> Vec<PosDailyPoint> {
    let hour = boundaries.boundary_hour(SourceKind::Pos);
    let mut days: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for row in rows {
        let day = business_day(row.at, hour, boundaries.civil_offset_hours);
        let slot = days.entry(day).or_insert((0.0, 0.0));
        slot.0 += row.amount;
        slot.1 += row.revenue;
    }
    days.into_iter()
        .map(|(date, (token_sent, revenue))| PosDailyPoint { date, token_sent, revenue })
        .collect()
}

pub fn top_recipients(rows: &[PosRow]) -> Vec<RankedEntity> {
    rank_entities(rows, |r| r.address.as_str(), |r| r.amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, d, h, 0, 0).unwrap()
    }

    fn row(address: &str, at_: DateTime<Utc>, amount: f64, revenue: f64) -> PosRow {
        PosRow { address: address.to_string(), at: at_, amount, revenue }
    }

    #[test]
    fn test_empty_window_is_all_zero() {
        assert_eq!(aggregate(&[]), PosMetrics::default());
    }

    #[test]
    fn test_aggregate_extremes_and_averages() {
        let rows = vec![
            row("a0000001", at(1, 1), 100.0, 1.0),
            row("b0000002", at(1, 2), 300.0, 2.0),
            row("a0000001", at(1, 3), 200.0, 3.0),
        ];
        let m = aggregate(&rows);
        assert_eq!(m.total_tx, 3);
        assert_eq!(m.total_amount, 600.0);
        assert_eq!(m.max_amount, 300.0);
        assert_eq!(m.min_amount, 100.0);
        assert_eq!(m.total_revenue, 6.0);
        assert_eq!(m.avg_reward, 200.0);
        assert_eq!(m.emission_efficiency, 0.01);
    }

    #[test]
    fn test_emission_efficiency_zero_without_emissions() {
        let rows = vec![row("a0000001", at(1, 1), 0.0, 5.0)];
        assert_eq!(aggregate(&rows).emission_efficiency, 0.0);
    }

    #[test]
    fn test_daily_series_noon_boundary() {
        // 11:59 civil on June 2 is 03:59 UTC; before noon it belongs to
        // June 1. 12:01 civil (04:01 UTC) starts June 2.
        let before_noon = Utc.with_ymd_and_hms(2025, 6, 2, 3, 59, 0).unwrap();
        let after_noon = Utc.with_ymd_and_hms(2025, 6, 2, 4, 1, 0).unwrap();
        let rows = vec![
            row("a0000001", before_noon, 10.0, 1.0),
            row("b0000002", after_noon, 20.0, 2.0),
        ];
        let series = daily_series(&rows, &BoundaryTable::default());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(series[0].token_sent, 10.0);
        assert_eq!(series[1].date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(series[1].revenue, 2.0);
    }

    #[test]
    fn test_top_recipients_by_summed_amount() {
        let rows = vec![
            row("small001", at(1, 1), 50.0, 0.0),
            row("whale002", at(1, 2), 40.0, 0.0),
            row("whale002", at(1, 3), 40.0, 0.0),
        ];
        let top = top_recipients(&rows);
        assert_eq!(top[0].full_address, "whale002");
        assert_eq!(top[0].total, 80.0);
        assert_eq!(top[0].tx_count, 2);
    }

    #[test]
    fn test_compare_min_max() {
        let current = aggregate(&[row("a0000001", at(1, 1), 100.0, 1.0)]);
        let previous = aggregate(&[row("a0000001", at(1, 1), 50.0, 1.0)]);
        let c = compare(&current, &previous);
        assert_eq!(c.max_amount.delta_percent, Some(100.0));
        assert_eq!(c.total_tx.delta_percent, Some(0.0));
    }
}
