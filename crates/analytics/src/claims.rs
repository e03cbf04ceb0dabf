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

//! Claim stream aggregation.
//!
//! The claim stream is the main reward pipe: normal claims, the referral
//! bonuses they cascade into, and lucky draws all land in the same table and
//! are told apart by payout amount. Most KPIs only look at normal claims;
//! totals, revenue and the activity interval span every tier.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::classify::{classify_claim, tier_breakdown, ClaimTier};
use crate::daily::business_day;
use crate::delta::{guarded_ratio, Delta, OnZeroDenominator};
use crate::ranking::{rank_entities, RankedEntity};
use crate::rows::ClaimRow;
use crate::windows::{BoundaryTable, SourceKind};

/// One period's claim KPIs. An empty window produces the default (all-zero)
/// vector, never a partial one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClaimsMetrics {
    pub total_tx: u64,
    pub normal_claims: u64,
    pub total_amount: f64,
    pub unique_addresses: u64,
    pub mean_claims: f64,
    pub median_claims: f64,
    pub avg_interval_minutes: f64,
    pub base_claims: i64,
    pub tier1_referrals: i64,
    pub tier2_referrals: i64,
    pub lucky_draws: u64,
    pub lucky_draw_amount: f64,
    pub lucky_draw_addresses: u64,
    pub revenue: f64,
    pub token_cost: f64,
    pub roi: f64,
}

/// Claim KPIs paired across the current and previous period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsComparison {
    pub total_tx: Delta<u64>,
    pub normal_claims: Delta<u64>,
    pub total_amount: Delta<f64>,
    pub unique_addresses: Delta<u64>,
    pub mean_claims: Delta<f64>,
    pub median_claims: Delta<f64>,
    pub avg_interval_minutes: Delta<f64>,
    pub base_claims: Delta<i64>,
    pub tier1_referrals: Delta<i64>,
    pub tier2_referrals: Delta<i64>,
    pub lucky_draws: Delta<u64>,
    pub lucky_draw_amount: Delta<f64>,
    pub lucky_draw_addresses: Delta<u64>,
    pub revenue: Delta<f64>,
    pub token_cost: Delta<f64>,
    pub roi: Delta<f64>,
}

/// One business day of claim activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsDailyPoint {
    pub date: NaiveDate,
    pub tx_count: u64,
    pub token_sent: f64,
    pub revenue: f64,
}

/// Aggregates one window of claim rows. `reference_price` is the mean token
/// price over the same period, used for the cost and ROI figures.
pub fn aggregate(rows: &[ClaimRow], reference_price: f64) -> ClaimsMetrics {
    if rows.is_empty() {
        return ClaimsMetrics::default();
    }

    let total_tx = rows.len() as u64;
    let total_amount: f64 = rows.iter().map(|r| r.amount).sum();
    let revenue: f64 = rows.iter().map(|r| r.revenue).sum();

    // Normal-claim activity per address drives the reach KPIs.
    let mut normal_per_address: HashMap<&str, u64> = HashMap::new();
    let mut lucky_draws = 0u64;
    let mut lucky_draw_amount = 0.0;
    let mut lucky_draw_addresses: HashSet<&str> = HashSet::new();
    for row in rows {
        match classify_claim(row.amount) {
            ClaimTier::Normal => {
                *normal_per_address.entry(row.address.as_str()).or_insert(0) += 1;
            }
            ClaimTier::LuckyDraw => {
                lucky_draws += 1;
                lucky_draw_amount += row.amount;
                lucky_draw_addresses.insert(row.address.as_str());
            }
            ClaimTier::Tier1Referral | ClaimTier::Tier2Referral => {}
        }
    }

    let normal_claims: u64 = normal_per_address.values().sum();
    let unique_addresses = normal_per_address.len() as u64;
    let mean_claims = guarded_ratio(
        normal_claims as f64,
        unique_addresses as f64,
        OnZeroDenominator::ReturnZero,
    )
    .unwrap_or(0.0);
    let mut counts: Vec<u64> = normal_per_address.values().copied().collect();
    let median_claims = median(&mut counts);

    let breakdown = tier_breakdown(rows);

    let token_cost = total_amount * reference_price;
    let roi = guarded_ratio(revenue, token_cost, OnZeroDenominator::ReturnZero).unwrap_or(0.0);

    ClaimsMetrics {
        total_tx,
        normal_claims,
        total_amount,
        unique_addresses,
        mean_claims,
        median_claims,
        avg_interval_minutes: average_interval_minutes(rows),
        base_claims: breakdown.base_claims,
        tier1_referrals: breakdown.tier1_referrals,
        tier2_referrals: breakdown.tier2_referrals,
        lucky_draws,
        lucky_draw_amount,
        lucky_draw_addresses: lucky_draw_addresses.len() as u64,
        revenue,
        token_cost,
        roi,
    }
}

pub fn compare(current: &ClaimsMetrics, previous: &ClaimsMetrics) -> ClaimsComparison {
    ClaimsComparison {
        total_tx: Delta::<u64>::new(current.total_tx, previous.total_tx),
        normal_claims: Delta::<u64>::new(current.normal_claims, previous.normal_claims),
        total_amount: Delta::<f64>::new(current.total_amount, previous.total_amount),
        unique_addresses: Delta::<u64>::new(current.unique_addresses, previous.unique_addresses),
        mean_claims: Delta::<f64>::new(current.mean_claims, previous.mean_claims),
        median_claims: Delta::<f64>::new(current.median_claims, previous.median_claims),
        avg_interval_minutes: Delta::<f64>::new(
            current.avg_interval_minutes,
            previous.avg_interval_minutes,
        ),
        base_claims: Delta::<i64>::new(current.base_claims, previous.base_claims),
        tier1_referrals: Delta::<i64>::new(current.tier1_referrals, previous.tier1_referrals),
        tier2_referrals: Delta::<i64>::new(current.tier2_referrals, previous.tier2_referrals),
        lucky_draws: Delta::<u64>::new(current.lucky_draws, previous.lucky_draws),
        lucky_draw_amount: Delta::<f64>::new(current.lucky_draw_amount, previous.lucky_draw_amount),
        lucky_draw_addresses: Delta::<u64>::new(
            current.lucky_draw_addresses,
            previous.lucky_draw_addresses,
        ),
        revenue: Delta::<f64>::new(current.revenue, previous.revenue),
        token_cost: Delta::<f64>::new(current.token_cost, previous.token_cost),
        roi: Delta::<f64>::new(current.roi, previous.roi),
    }
}

/// Daily activity under the claim stream's business-day boundary. Only days
/// with at least one row appear.
pub fn daily_series(rows: &[ClaimRow], boundaries: &BoundaryTable) -> Vec<ClaimsDailyPoint> {
    let hour = boundaries.boundary_hour(SourceKind::Claims);
    let mut days: BTreeMap<NaiveDate, (u64, f64, f64)> = BTreeMap::new();
    for row in rows {
        let day = business_day(row.at, hour, boundaries.civil_offset_hours);
        let slot = days.entry(day).or_insert((0, 0.0, 0.0));
        slot.0 += 1;
        slot.1 += row.amount;
        slot.2 += row.revenue;
    }
    days.into_iter()
        .map(|(date, (tx_count, token_sent, revenue))| ClaimsDailyPoint {
            date,
            tx_count,
            token_sent,
            revenue,
        })
        .collect()
}

/// Top claimers by summed payout, counting normal claims only.
pub fn top_claimers(rows: &[ClaimRow]) -> Vec<RankedEntity> {
    let normal: Vec<&ClaimRow> =
        rows.iter().filter(|r| classify_claim(r.amount) == ClaimTier::Normal).collect();
    rank_entities(&normal, |r| r.address.as_str(), |r| r.amount)
}

/// Mean gap in minutes between an address's consecutive events, pooled over
/// every address with at least two rows. All tiers count as activity.
fn average_interval_minutes(rows: &[ClaimRow]) -> f64 {
    let mut ordered: Vec<(&str, DateTime<Utc>)> =
        rows.iter().map(|r| (r.address.as_str(), r.at)).collect();
    ordered.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));

    let mut gap_minutes = 0.0;
    let mut gaps = 0u64;
    for pair in ordered.windows(2) {
        if pair[0].0 == pair[1].0 {
            gap_minutes += (pair[1].1 - pair[0].1).num_seconds() as f64 / 60.0;
            gaps += 1;
        }
    }
    if gaps == 0 {
        0.0
    } else {
        gap_minutes / gaps as f64
    }
}

fn median(values: &mut Vec<u64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2] as f64
    } else {
        (values[n / 2 - 1] + values[n / 2]) as f64 / 2.0
    }
}
