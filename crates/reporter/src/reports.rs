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

//! Wire shapes for the report surface.
//!
//! Everything here serializes as camelCase JSON. Leaderboard entries carry
//! both the shortened display address and the full identifier.

use chrono::NaiveDate;
use meridian_analytics::{
    anomaly::{AnomalySummary, Finding, RuleSetVersion},
    claims::{ClaimsComparison, ClaimsDailyPoint},
    codes::{CodesComparison, CodesDailyPoint},
    pool::{PoolComparison, PoolDailyPoint, PriceCandle},
    pos::{PosComparison, PosDailyPoint},
    revenue::{RevenueComparison, RevenueDailyPoint, RevenueShare},
    staking::{StakingComparison, StakingDailyPoint},
    RankedEntity,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsTopUser {
    pub address: String,
    pub full_address: String,
    pub token_sent: f64,
    pub tx_count: u64,
}

impl From<RankedEntity> for ClaimsTopUser {
    fn from(entity: RankedEntity) -> Self {
        Self {
            address: entity.address,
            full_address: entity.full_address,
            token_sent: entity.total,
            tx_count: entity.tx_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosTopUser {
    pub address: String,
    pub full_address: String,
    pub token_sent: f64,
    pub tx_count: u64,
}

impl From<RankedEntity> for PosTopUser {
    fn from(entity: RankedEntity) -> Self {
        Self {
            address: entity.address,
            full_address: entity.full_address,
            token_sent: entity.total,
            tx_count: entity.tx_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingTopStaker {
    pub address: String,
    pub full_address: String,
    pub amount: f64,
}

impl From<RankedEntity> for StakingTopStaker {
    fn from(entity: RankedEntity) -> Self {
        Self {
            address: entity.address,
            full_address: entity.full_address,
            amount: entity.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodesTopUser {
    pub address: String,
    pub full_address: String,
    pub claim_amount: f64,
    pub claim_count: u64,
}

impl From<RankedEntity> for CodesTopUser {
    fn from(entity: RankedEntity) -> Self {
        Self {
            address: entity.address,
            full_address: entity.full_address,
            claim_amount: entity.total,
            claim_count: entity.tx_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metrics: ClaimsComparison,
    pub daily_data: Vec<ClaimsDailyPoint>,
    pub top_users: Vec<ClaimsTopUser>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metrics: PosComparison,
    pub daily_data: Vec<PosDailyPoint>,
    pub top_users: Vec<PosTopUser>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metrics: StakingComparison,
    pub daily_data: Vec<StakingDailyPoint>,
    pub top_stakers: Vec<StakingTopStaker>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodesReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metrics: CodesComparison,
    pub daily_data: Vec<CodesDailyPoint>,
    pub top_users: Vec<CodesTopUser>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metrics: PoolComparison,
    pub daily_data: Vec<PoolDailyPoint>,
    /// Hourly OHLC candles over the current window.
    pub hourly_price: Vec<PriceCandle>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metrics: RevenueComparison,
    pub daily_data: Vec<RevenueDailyPoint>,
    pub composition: Vec<RevenueShare>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub date: NaiveDate,
    pub rule_set: RuleSetVersion,
    pub summary: AnomalySummary,
    pub anomalies: Vec<Finding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_entries_keep_both_address_forms() {
        let entity = RankedEntity {
            address: "0x12...cdef".to_string(),
            full_address: "0x1234567890abcdef".to_string(),
            total: 42.5,
            tx_count: 3,
        };

        let top: ClaimsTopUser = entity.clone().into();
        let value = serde_json::to_value(&top).unwrap();
        assert_eq!(value["address"], "0x12...cdef");
        assert_eq!(value["fullAddress"], "0x1234567890abcdef");
        assert_eq!(value["tokenSent"], 42.5);
        assert_eq!(value["txCount"], 3);

        let staker: StakingTopStaker = entity.into();
        let value = serde_json::to_value(&staker).unwrap();
        assert_eq!(value["amount"], 42.5);
        assert!(value.get("txCount").is_none());
    }
}
