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

//! Staking aggregation over the movement and reward streams.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::daily::business_day;
use crate::delta::Delta;
use crate::ranking::{rank_entities, RankedEntity};
use crate::rows::{StakeAction, StakeRow, StakingRewardRow};
use crate::windows::{BoundaryTable, SourceKind};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StakingMetrics {
    pub total_stake: f64,
    pub total_unstake: f64,
    /// Stake minus unstake over the period; negative on net outflow.
    pub net_stake: f64,
    pub stake_count: u64,
    pub reward_count: u64,
    pub reward_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingComparison {
    pub total_stake: Delta<f64>,
    pub total_unstake: Delta<f64>,
    pub net_stake: Delta<f64>,
    pub stake_count: Delta<u64>,
    pub reward_count: Delta<u64>,
    pub reward_amount: Delta<f64>,
}

/// One business day of staking activity: movements in, rewards out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingDailyPoint {
    pub date: NaiveDate,
    pub stake: f64,
    pub rewards: f64,
}

pub fn aggregate(stakes: &[StakeRow], rewards: &[StakingRewardRow]) -> StakingMetrics {
    let mut total_stake = 0.0;
    let mut total_unstake = 0.0;
    let mut stake_count = 0u64;
    for row in stakes {
        match row.action {
            StakeAction::Stake => {
                total_stake += row.amount;
                stake_count += 1;
            }
            StakeAction::Unstake => total_unstake += row.amount,
        }
    }

    StakingMetrics {
        total_stake,
        total_unstake,
        net_stake: total_stake - total_unstake,
        stake_count,
        reward_count: rewards.len() as u64,
        reward_amount: rewards.iter().map(|r| r.amount).sum(),
    }
}

pub fn compare(current: &StakingMetrics, previous: &StakingMetrics) -> StakingComparison {
    StakingComparison {
        total_stake: Delta::<f64>::new(current.total_stake, previous.total_stake),
        total_unstake: Delta::<f64>::new(current.total_unstake, previous.total_unstake),
        net_stake: Delta::<f64>::new(current.net_stake, previous.net_stake),
        stake_count: Delta::<u64>::new(current.stake_count, previous.stake_count),
        reward_count: Delta::<u64>::new(current.reward_count, previous.reward_count),
        reward_amount: Delta::<f64>::new(current.reward_amount, previous.reward_amount),
    }
}

/// Daily staked and rewarded amounts over the union of both streams' days,
/// zero-filled where only one stream was active.
pub fn daily_series(
    stakes: &[StakeRow],
    rewards: &[StakingRewardRow],
    boundaries: &BoundaryTable,
) -> Vec<StakingDailyPoint> {
    let hour = boundaries.boundary_hour(SourceKind::Staking);
    let mut days: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();

    for row in stakes {
        if row.action == StakeAction::Stake {
            let day = business_day(row.at, hour, boundaries.civil_offset_hours);
            days.entry(day).or_insert((0.0, 0.0)).0 += row.amount;
        }
    }
    for row in rewards {
        let day = business_day(row.at, hour, boundaries.civil_offset_hours);
        days.entry(day).or_insert((0.0, 0.0)).1 += row.amount;
    }

    days.into_iter()
        .map(|(date, (stake, rewards))| StakingDailyPoint { date, stake, rewards })
        .collect()
}

/// Top stakers by summed staked amount; unstakes are not netted here.
pub fn top_stakers(stakes: &[StakeRow]) -> Vec<RankedEntity> {
    let staked: Vec<&StakeRow> =
        stakes.iter().filter(|r| r.action == StakeAction::Stake).collect();
    rank_entities(&staked, |r| r.address.as_str(), |r| r.amount)
}
