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

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use meridian_analytics::{
    ClaimRow, CodeRow, PoolActivity, PoolRow, PosRow, PriceRow, StakeAction, StakeRow,
    StakingRewardRow,
};
use sqlx::any::install_default_drivers;
use sqlx::AnyPool;
use tempfile::NamedTempFile;

use crate::db::{AnyDb, DbError, DbObj, ReporterDb};

pub struct TestDb {
    pub db: Arc<AnyDb>,
    pub db_url: String,
    pub pool: AnyPool,
    pub _temp_file: Option<NamedTempFile>,
}

impl TestDb {
    pub async fn new() -> Result<Self, DbError> {
        install_default_drivers();

        // Lets you run the DB tests against PostgreSQL, via setting REPORTER_DATABASE_URL.
        // This is only supported for testing with --test-threads=1 and should only be
        // used for sanity checking that the queries work on postgres.
        if let Ok(db_url) = std::env::var("REPORTER_DATABASE_URL") {
            if db_url.starts_with("postgres") {
                let pool = AnyPool::connect(&db_url).await?;
                let db = Arc::new(AnyDb::new(&db_url).await?);
                let test_db = Self { db, db_url, pool, _temp_file: None };
                // Clean up any leftover data from previous test runs
                test_db.cleanup().await?;
                tracing::info!("Testing with Postgres. Must only run with --test-threads=1");
                return Ok(test_db);
            }
        }

        // Default: SQLite with temp file
        let temp_file = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite:{}", temp_file.path().display());
        let pool = AnyPool::connect(&db_url).await?;
        let db = Arc::new(AnyDb::new(&db_url).await?);

        Ok(Self { db, db_url: db_url.clone(), pool, _temp_file: Some(temp_file) })
    }

    pub fn get_db(&self) -> DbObj {
        self.db.clone()
    }

    pub async fn cleanup(&self) -> Result<(), DbError> {
        // Only needed for PostgreSQL (SQLite uses temp files that are auto-cleaned)
        if self.db_url.starts_with("postgres") {
            let tables = vec![
                "claim_events",
                "pos_rewards",
                "staking_events",
                "staking_rewards",
                "code_claims",
                "pool_activity",
                "price_points",
            ];

            for table in tables {
                // Ignore errors if table doesn't exist (may not have run migrations yet)
                let _ = sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", table))
                    .execute(&self.pool)
                    .await;
            }
        }
        Ok(())
    }

    pub async fn seed_claims(&self, rows: &[ClaimRow]) -> Result<(), DbError> {
        for row in rows {
            self.db.add_claim_row(row).await?;
        }
        Ok(())
    }

    pub async fn seed_pos(&self, rows: &[PosRow]) -> Result<(), DbError> {
        for row in rows {
            self.db.add_pos_row(row).await?;
        }
        Ok(())
    }

    pub async fn seed_stakes(&self, rows: &[StakeRow]) -> Result<(), DbError> {
        for row in rows {
            self.db.add_stake_row(row).await?;
        }
        Ok(())
    }

    pub async fn seed_staking_rewards(&self, rows: &[StakingRewardRow]) -> Result<(), DbError> {
        for row in rows {
            self.db.add_staking_reward_row(row).await?;
        }
        Ok(())
    }

    pub async fn seed_codes(&self, rows: &[CodeRow]) -> Result<(), DbError> {
        for row in rows {
            self.db.add_code_row(row).await?;
        }
        Ok(())
    }

    pub async fn seed_pool(&self, rows: &[PoolRow]) -> Result<(), DbError> {
        for row in rows {
            self.db.add_pool_row(row).await?;
        }
        Ok(())
    }

    pub async fn seed_prices(&self, rows: &[PriceRow]) -> Result<(), DbError> {
        for row in rows {
            self.db.add_price_row(row).await?;
        }
        Ok(())
    }
}

/// Parses `"2025-06-01 09:30"` as a UTC instant.
pub fn utc(at: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M").unwrap().and_utc()
}

pub fn claim(address: &str, at: &str, amount: f64, revenue: f64) -> ClaimRow {
    ClaimRow { address: address.to_string(), at: utc(at), amount, revenue }
}

pub fn pos_reward(address: &str, at: &str, amount: f64, revenue: f64) -> PosRow {
    PosRow { address: address.to_string(), at: utc(at), amount, revenue }
}

pub fn stake(address: &str, at: &str, amount: f64, action: StakeAction) -> StakeRow {
    StakeRow { address: address.to_string(), at: utc(at), amount, action }
}

pub fn staking_reward(address: &str, at: &str, amount: f64, revenue: f64) -> StakingRewardRow {
    StakingRewardRow { address: address.to_string(), at: utc(at), amount, revenue }
}

pub fn code_claim(address: &str, at: &str, amount: f64, revenue: f64) -> CodeRow {
    CodeRow { address: address.to_string(), at: utc(at), amount, revenue }
}

pub fn pool_event(at: &str, activity: PoolActivity, token_change: f64, quote_change: f64) -> PoolRow {
    PoolRow { at: utc(at), activity, token_change, quote_change }
}

pub fn price_point(at: &str, price: f64) -> PriceRow {
    PriceRow { at: utc(at), price }
}
