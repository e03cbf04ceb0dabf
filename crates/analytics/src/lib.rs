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

//! Temporal-window analytics over token-ecosystem reward data.
//!
//! This crate is the pure computation layer: window resolution, per-source
//! aggregation, period-over-period deltas, leaderboards, daily series and the
//! anomaly rule set. Everything here is a deterministic function over
//! in-memory event rows; fetching those rows and assembling reports is the
//! reporter crate's job.

pub mod anomaly;
pub mod claims;
pub mod classify;
pub mod codes;
pub mod daily;
pub mod delta;
pub mod pool;
pub mod pos;
pub mod price;
pub mod ranking;
pub mod revenue;
pub mod rows;
pub mod staking;
pub mod windows;

pub use classify::{classify_claim, ClaimTier, TierBreakdown};
pub use delta::{Delta, OnZeroDenominator};
pub use ranking::{mask_address, RankedEntity, LEADERBOARD_SIZE};
pub use rows::{
    ClaimRow, CodeRow, PoolActivity, PoolRow, PosRow, PriceRow, StakeAction, StakeRow,
    StakingRewardRow,
};
pub use windows::{BoundaryTable, DateRange, SourceKind, Window, WindowError, WindowPair};
