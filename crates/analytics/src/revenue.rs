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

//! Cross-source revenue composition.
//!
//! Pulls the chain-currency intake of all four revenue-bearing streams into
//! one vector, a share breakdown, and a daily series. Each stream keeps its
//! own business-day boundary in the daily series, so per-source days line up
//! with that source's own report.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::daily::business_day;
use crate::delta::Delta;
use crate::rows::{ClaimRow, CodeRow, PosRow, StakingRewardRow};
use crate::windows::{BoundaryTable, SourceKind};

pub const CLAIMS_SOURCE_LABEL: &str = "Claims";
pub const POS_SOURCE_LABEL: &str = "POS";
pub const STAKING_SOURCE_LABEL: &str = "Staking";
pub const CODES_SOURCE_LABEL: &str = "Codes";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RevenueMetrics {
    pub claims_revenue: f64,
    pub pos_revenue: f64,
    pub staking_revenue: f64,
    pub code_revenue: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueComparison {
    pub claims_revenue: Delta<f64>,
    pub pos_revenue: Delta<f64>,
    pub staking_revenue: Delta<f64>,
    pub code_revenue: Delta<f64>,
    pub total_revenue: Delta<f64>,
}

/// One source's share of the period's revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueShare {
    pub source: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueDailyPoint {
    pub date: NaiveDate,
    pub claims_revenue: f64,
    pub pos_revenue: f64,
    pub staking_revenue: f64,
    pub code_revenue: f64,
    pub total_revenue: f64,
}

pub fn aggregate(
    claims: &[ClaimRow],
    pos: &[PosRow],
    staking_rewards: &[StakingRewardRow],
    codes: &[CodeRow],
) -> RevenueMetrics {
    let claims_revenue: f64 = claims.iter().map(|r| r.revenue).sum();
    let pos_revenue: f64 = pos.iter().map(|r| r.revenue).sum();
    let staking_revenue: f64 = staking_rewards.iter().map(|r| r.revenue).sum();
    let code_revenue: f64 = codes.iter().map(|r| r.revenue).sum();

    RevenueMetrics {
        claims_revenue,
        pos_revenue,
        staking_revenue,
        code_revenue,
        total_revenue: claims_revenue + pos_revenue + staking_revenue + code_revenue,
    }
}

pub fn compare(current: &RevenueMetrics, previous: &RevenueMetrics) -> RevenueComparison {
    RevenueComparison {
        claims_revenue: Delta::<f64>::new(current.claims_revenue, previous.claims_revenue),
        pos_revenue: Delta::<f64>::new(current.pos_revenue, previous.pos_revenue),
        staking_revenue: Delta::<f64>::new(current.staking_revenue, previous.staking_revenue),
        code_revenue: Delta::<f64>::new(current.code_revenue, previous.code_revenue),
        total_revenue: Delta::<f64>::new(current.total_revenue, previous.total_revenue),
    }
}

/// Share breakdown of the period's revenue: zero-revenue sources are left
/// out, the rest sorted largest first.
pub fn composition(metrics: &RevenueMetrics) -> Vec<RevenueShare> {
    let mut shares: Vec<RevenueShare> = [
        (CLAIMS_SOURCE_LABEL, metrics.claims_revenue),
        (POS_SOURCE_LABEL, metrics.pos_revenue),
        (STAKING_SOURCE_LABEL, metrics.staking_revenue),
        (CODES_SOURCE_LABEL, metrics.code_revenue),
    ]
    .into_iter()
    .filter(|&(_, amount)| amount > 0.0)
    .map(|(source, amount)| RevenueShare { source: source.to_string(), amount })
    .collect();

    shares.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    shares
}

/// Daily revenue over the union of all four sources' business days,
/// zero-filled where a source took nothing in.
pub fn daily_series(
    claims: &[ClaimRow],
    pos: &[PosRow],
    staking_rewards: &[StakingRewardRow],
    codes: &[CodeRow],
    boundaries: &BoundaryTable,
) -> Vec<RevenueDailyPoint> {
    // (claims, pos, staking, codes) per date.
    let mut days: BTreeMap<NaiveDate, (f64, f64, f64, f64)> = BTreeMap::new();
    let offset = boundaries.civil_offset_hours;

    let claims_hour = boundaries.boundary_hour(SourceKind::Claims);
    for row in claims {
        days.entry(business_day(row.at, claims_hour, offset)).or_insert((0.0, 0.0, 0.0, 0.0)).0 +=
            row.revenue;
    }
    let pos_hour = boundaries.boundary_hour(SourceKind::Pos);
    for row in pos {
        days.entry(business_day(row.at, pos_hour, offset)).or_insert((0.0, 0.0, 0.0, 0.0)).1 +=
            row.revenue;
    }
    let staking_hour = boundaries.boundary_hour(SourceKind::Staking);
    for row in staking_rewards {
        days.entry(business_day(row.at, staking_hour, offset)).or_insert((0.0, 0.0, 0.0, 0.0)).2 +=
            row.revenue;
    }
    let codes_hour = boundaries.boundary_hour(SourceKind::Codes);
    for row in codes {
        days.entry(business_day(row.at, codes_hour, offset)).or_insert((0.0, 0.0, 0.0, 0.0)).3 +=
            row.revenue;
    }

    days.into_iter()
        .map(|(date, (claims_revenue, pos_revenue, staking_revenue, code_revenue))| {
            RevenueDailyPoint {
                date,
                claims_revenue,
                pos_revenue,
                staking_revenue,
                code_revenue,
                total_revenue: claims_revenue + pos_revenue + staking_revenue + code_revenue,
            }
        })
        .collect()
}
