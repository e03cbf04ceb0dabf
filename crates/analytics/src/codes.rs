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

//! Point-redemption code aggregation.
//!
//! The only family with a nullable KPI: the per-address average is reported
//! as null rather than zero when nobody claimed, and its delta additionally
//! needs both periods to have produced a value.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::daily::business_day;
use crate::delta::{guarded_ratio, Delta, OnZeroDenominator};
use crate::ranking::{rank_entities, RankedEntity};
use crate::rows::CodeRow;
use crate::windows::{BoundaryTable, SourceKind};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodesMetrics {
    pub claim_count: u64,
    pub claim_amount: f64,
    pub unique_addresses: u64,
    pub avg_claim_per_address: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodesComparison {
    pub claim_count: Delta<u64>,
    pub claim_amount: Delta<f64>,
    pub unique_addresses: Delta<u64>,
    pub avg_claim_per_address: Delta<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodesDailyPoint {
    pub date: NaiveDate,
    pub claim_count: u64,
    pub claim_amount: f64,
    pub revenue: f64,
}

pub fn aggregate(rows: &[CodeRow]) -> CodesMetrics {
    if rows.is_empty() {
        return CodesMetrics::default();
    }

    let claim_count = rows.len() as u64;
    let claim_amount: f64 = rows.iter().map(|r| r.amount).sum();
    let unique: HashSet<&str> = rows.iter().map(|r| r.address.as_str()).collect();
    let unique_addresses = unique.len() as u64;

    CodesMetrics {
        claim_count,
        claim_amount,
        unique_addresses,
        avg_claim_per_address: guarded_ratio(
            claim_amount,
            unique_addresses as f64,
            OnZeroDenominator::ReturnNull,
        ),
    }
}

pub fn compare(current: &CodesMetrics, previous: &CodesMetrics) -> CodesComparison {
    CodesComparison {
        claim_count: Delta::<u64>::new(current.claim_count, previous.claim_count),
        claim_amount: Delta::<f64>::new(current.claim_amount, previous.claim_amount),
        unique_addresses: Delta::<u64>::new(current.unique_addresses, previous.unique_addresses),
        avg_claim_per_address: Delta::of_optional(
            current.avg_claim_per_address,
            previous.avg_claim_per_address,
        ),
    }
}

pub fn daily_series(rows: &[CodeRow], boundaries: &BoundaryTable) -> Vec<CodesDailyPoint> {
    let hour = boundaries.boundary_hour(SourceKind::Codes);
    let mut days: BTreeMap<NaiveDate, (u64, f64, f64)> = BTreeMap::new();
    for row in rows {
        let day = business_day(row.at, hour, boundaries.civil_offset_hours);
        let slot = days.entry(day).or_insert((0, 0.0, 0.0));
        slot.0 += 1;
        slot.1 += row.amount;
        slot.2 += row.revenue;
    }
    days.into_iter()
        .map(|(date, (claim_count, claim_amount, revenue))| CodesDailyPoint {
            date,
            claim_count,
            claim_amount,
            revenue,
        })
        .collect()
}

pub fn top_redeemers(rows: &[CodeRow]) -> Vec<RankedEntity> {
    rank_entities(rows, |r| r.address.as_str(), |r| r.amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, d, h, 0, 0).unwrap()
    }

    fn row(address: &str, at_: DateTime<Utc>, amount: f64, revenue: f64) -> CodeRow {
        CodeRow { address: address.to_string(), at: at_, amount, revenue }
    }

    #[test]
    fn test_empty_average_is_null_not_zero() {
        let m = aggregate(&[]);
        assert_eq!(m.claim_count, 0);
        assert_eq!(m.claim_amount, 0.0);
        assert_eq!(m.avg_claim_per_address, None);
    }

    #[test]
    fn test_aggregate_counts_addresses_once() {
        let rows = vec![
            row("alice001", at(1, 1), 30.0, 0.1),
            row("alice001", at(1, 2), 10.0, 0.1),
            row("bob00002", at(1, 3), 20.0, 0.1),
        ];
        let m = aggregate(&rows);
        assert_eq!(m.claim_count, 3);
        assert_eq!(m.claim_amount, 60.0);
        assert_eq!(m.unique_addresses, 2);
        assert_eq!(m.avg_claim_per_address, Some(30.0));
    }

    #[test]
    fn test_delta_requires_both_periods() {
        let current = aggregate(&[row("alice001", at(1, 1), 30.0, 0.0)]);
        let previous = aggregate(&[]);
        let c = compare(&current, &previous);
        assert_eq!(c.avg_claim_per_address.current, Some(30.0));
        assert_eq!(c.avg_claim_per_address.prev, None);
        assert_eq!(c.avg_claim_per_address.delta_percent, None);
        // The plain counts still follow the uniform rule.
        assert_eq!(c.claim_count.delta_percent, None);
    }

    #[test]
    fn test_delta_defined_when_both_present() {
        let current = aggregate(&[row("alice001", at(1, 1), 40.0, 0.0)]);
        let previous = aggregate(&[row("bob00002", at(1, 1), 20.0, 0.0)]);
        let c = compare(&current, &previous);
        assert_eq!(c.avg_claim_per_address.delta_percent, Some(100.0));
    }

    #[test]
    fn test_daily_series_natural_day() {
        // Codes settle at midnight civil: 23:59 civil June 1 is 15:59 UTC.
        let late_june_1 = Utc.with_ymd_and_hms(2025, 6, 1, 15, 59, 0).unwrap();
        let early_june_2 = Utc.with_ymd_and_hms(2025, 6, 1, 16, 0, 0).unwrap();
        let rows = vec![
            row("alice001", late_june_1, 5.0, 0.1),
            row("bob00002", early_june_2, 7.0, 0.2),
        ];
        let series = daily_series(&rows, &BoundaryTable::default());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(series[0].claim_amount, 5.0);
        assert_eq!(series[1].date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(series[1].claim_count, 1);
    }

    #[test]
    fn test_top_redeemers() {
        let rows = vec![
            row("alice001", at(1, 1), 30.0, 0.0),
            row("bob00002", at(1, 2), 50.0, 0.0),
            row("alice001", at(1, 3), 40.0, 0.0),
        ];
        let top = top_redeemers(&rows);
        assert_eq!(top[0].full_address, "alice001");
        assert_eq!(top[0].total, 70.0);
        assert_eq!(top[0].tx_count, 2);
    }
}
