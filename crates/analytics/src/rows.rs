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

//! Event row types consumed by the aggregators. All timestamps are UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One claim event. `amount` is the token amount sent out, `revenue` the
/// chain-currency amount received by the treasury. The claim tier is derived
/// from `amount`, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRow {
    pub address: String,
    pub at: DateTime<Utc>,
    pub amount: f64,
    pub revenue: f64,
}

/// One POS terminal reward payout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosRow {
    pub address: String,
    pub at: DateTime<Utc>,
    pub amount: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StakeAction {
    Stake,
    Unstake,
}

impl StakeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stake => "STAKE",
            Self::Unstake => "UNSTAKE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STAKE" => Some(Self::Stake),
            "UNSTAKE" => Some(Self::Unstake),
            _ => None,
        }
    }
}

/// One stake or unstake movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeRow {
    pub address: String,
    pub at: DateTime<Utc>,
    pub amount: f64,
    pub action: StakeAction,
}

/// One staking reward payout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakingRewardRow {
    pub address: String,
    pub at: DateTime<Utc>,
    pub amount: f64,
    pub revenue: f64,
}

/// One point-redemption code claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeRow {
    pub address: String,
    pub at: DateTime<Utc>,
    pub amount: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolActivity {
    Buy,
    Sell,
    LiqAdd,
    LiqRemove,
}

impl PoolActivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::LiqAdd => "LIQ_ADD",
            Self::LiqRemove => "LIQ_REMOVE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            "LIQ_ADD" => Some(Self::LiqAdd),
            "LIQ_REMOVE" => Some(Self::LiqRemove),
            _ => None,
        }
    }
}

/// One liquidity-pool trade or liquidity movement. Change amounts are signed
/// from the pool's perspective; aggregation works on absolute values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRow {
    pub at: DateTime<Utc>,
    pub activity: PoolActivity,
    pub token_change: f64,
    pub quote_change: f64,
}

/// One token price sample in the quote currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub at: DateTime<Utc>,
    pub price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stake_action_round_trip() {
        for action in [StakeAction::Stake, StakeAction::Unstake] {
            assert_eq!(StakeAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(StakeAction::parse("RESTAKE"), None);
    }

    #[test]
    fn test_pool_activity_round_trip() {
        for activity in
            [PoolActivity::Buy, PoolActivity::Sell, PoolActivity::LiqAdd, PoolActivity::LiqRemove]
        {
            assert_eq!(PoolActivity::parse(activity.as_str()), Some(activity));
        }
        assert_eq!(PoolActivity::parse("SWAP"), None);
    }

    #[test]
    fn test_pool_activity_serde_names() {
        let json = serde_json::to_string(&PoolActivity::LiqAdd).unwrap();
        assert_eq!(json, "\"LIQ_ADD\"");
    }
}
