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

//! Event row storage.
//!
//! Timestamps are stored as UTC epoch seconds and normalized to
//! `DateTime<Utc>` at this boundary. The claim table is the only one queried
//! by window; the smaller tables are loaded whole into the data snapshot.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use meridian_analytics::{
    ClaimRow, CodeRow, PoolActivity, PoolRow, PosRow, PriceRow, StakeAction, StakeRow,
    StakingRewardRow,
};
use sqlx::{
    any::{install_default_drivers, AnyConnectOptions, AnyPoolOptions},
    AnyPool, Row,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQL error {0:?}")]
    SqlErr(#[from] sqlx::Error),

    #[error("SQL Migration error {0:?}")]
    MigrateErr(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid timestamp: {0}")]
    BadTimestamp(i64),

    #[error("Invalid row: {0}")]
    BadRow(String),

    #[error("Error: {0}")]
    Error(#[from] anyhow::Error),
}

#[async_trait]
pub trait ReporterDb {
    fn pool(&self) -> &AnyPool;

    /// Claim rows with `start <= at < end`, in time order.
    async fn claim_rows_in(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ClaimRow>, DbError>;

    async fn all_pos_rows(&self) -> Result<Vec<PosRow>, DbError>;
    async fn all_stake_rows(&self) -> Result<Vec<StakeRow>, DbError>;
    async fn all_staking_reward_rows(&self) -> Result<Vec<StakingRewardRow>, DbError>;
    async fn all_code_rows(&self) -> Result<Vec<CodeRow>, DbError>;
    async fn all_pool_rows(&self) -> Result<Vec<PoolRow>, DbError>;
    async fn all_price_rows(&self) -> Result<Vec<PriceRow>, DbError>;

    async fn add_claim_row(&self, row: &ClaimRow) -> Result<(), DbError>;
    async fn add_pos_row(&self, row: &PosRow) -> Result<(), DbError>;
    async fn add_stake_row(&self, row: &StakeRow) -> Result<(), DbError>;
    async fn add_staking_reward_row(&self, row: &StakingRewardRow) -> Result<(), DbError>;
    async fn add_code_row(&self, row: &CodeRow) -> Result<(), DbError>;
    async fn add_pool_row(&self, row: &PoolRow) -> Result<(), DbError>;
    async fn add_price_row(&self, row: &PriceRow) -> Result<(), DbError>;
}

pub type DbObj = Arc<dyn ReporterDb + Send + Sync>;

#[derive(Debug, Clone)]
pub struct AnyDb {
    pub pool: AnyPool,
}

impl AnyDb {
    /// For SQLite use a `sqlite:file_path` URL; for Postgres `postgres://`.
    pub async fn new(conn_str: &str) -> Result<Self, DbError> {
        install_default_drivers();
        let opts = AnyConnectOptions::from_str(conn_str)?;

        let pool = AnyPoolOptions::new().max_connections(7).connect_with(opts).await?;

        // apply any migrations
        sqlx::migrate!().run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

fn datetime_from_epoch(secs: i64) -> Result<DateTime<Utc>, DbError> {
    Utc.timestamp_opt(secs, 0).single().ok_or(DbError::BadTimestamp(secs))
}

fn claim_row(row: &sqlx::any::AnyRow) -> Result<ClaimRow, DbError> {
    Ok(ClaimRow {
        address: row.try_get("address")?,
        at: datetime_from_epoch(row.try_get("at")?)?,
        amount: row.try_get("amount")?,
        revenue: row.try_get("revenue")?,
    })
}

fn pos_row(row: &sqlx::any::AnyRow) -> Result<PosRow, DbError> {
    Ok(PosRow {
        address: row.try_get("address")?,
        at: datetime_from_epoch(row.try_get("at")?)?,
        amount: row.try_get("amount")?,
        revenue: row.try_get("revenue")?,
    })
}

fn stake_row(row: &sqlx::any::AnyRow) -> Result<StakeRow, DbError> {
    let action: String = row.try_get("action")?;
    Ok(StakeRow {
        address: row.try_get("address")?,
        at: datetime_from_epoch(row.try_get("at")?)?,
        amount: row.try_get("amount")?,
        action: StakeAction::parse(&action)
            .ok_or_else(|| DbError::BadRow(format!("unknown stake action: {action}")))?,
    })
}

fn staking_reward_row(row: &sqlx::any::AnyRow) -> Result<StakingRewardRow, DbError> {
    Ok(StakingRewardRow {
        address: row.try_get("address")?,
        at: datetime_from_epoch(row.try_get("at")?)?,
        amount: row.try_get("amount")?,
        revenue: row.try_get("revenue")?,
    })
}

fn code_row(row: &sqlx::any::AnyRow) -> Result<CodeRow, DbError> {
    Ok(CodeRow {
        address: row.try_get("address")?,
        at: datetime_from_epoch(row.try_get("at")?)?,
        amount: row.try_get("amount")?,
        revenue: row.try_get("revenue")?,
    })
}

fn pool_row(row: &sqlx::any::AnyRow) -> Result<PoolRow, DbError> {
    let activity: String = row.try_get("activity")?;
    Ok(PoolRow {
        at: datetime_from_epoch(row.try_get("at")?)?,
        activity: PoolActivity::parse(&activity)
            .ok_or_else(|| DbError::BadRow(format!("unknown pool activity: {activity}")))?,
        token_change: row.try_get("token_change")?,
        quote_change: row.try_get("quote_change")?,
    })
}

fn price_row(row: &sqlx::any::AnyRow) -> Result<PriceRow, DbError> {
    Ok(PriceRow {
        at: datetime_from_epoch(row.try_get("at")?)?,
        price: row.try_get("price")?,
    })
}

#[async_trait]
impl ReporterDb for AnyDb {
    fn pool(&self) -> &AnyPool {
        &self.pool
    }

    async fn claim_rows_in(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ClaimRow>, DbError> {
        let rows = sqlx::query(
            "SELECT address, at, amount, revenue FROM claim_events
             WHERE at >= $1 AND at < $2
             ORDER BY at ASC",
        )
        .bind(start.timestamp())
        .bind(end.timestamp())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(claim_row).collect()
    }

    async fn all_pos_rows(&self) -> Result<Vec<PosRow>, DbError> {
        let rows =
            sqlx::query("SELECT address, at, amount, revenue FROM pos_rewards ORDER BY at ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(pos_row).collect()
    }

    async fn all_stake_rows(&self) -> Result<Vec<StakeRow>, DbError> {
        let rows =
            sqlx::query("SELECT address, at, amount, action FROM staking_events ORDER BY at ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(stake_row).collect()
    }

    async fn all_staking_reward_rows(&self) -> Result<Vec<StakingRewardRow>, DbError> {
        let rows =
            sqlx::query("SELECT address, at, amount, revenue FROM staking_rewards ORDER BY at ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(staking_reward_row).collect()
    }

    async fn all_code_rows(&self) -> Result<Vec<CodeRow>, DbError> {
        let rows =
            sqlx::query("SELECT address, at, amount, revenue FROM code_claims ORDER BY at ASC")
                .fetch_all(&self.pool)
                .await?;
        rows.iter().map(code_row).collect()
    }

    async fn all_pool_rows(&self) -> Result<Vec<PoolRow>, DbError> {
        let rows = sqlx::query(
            "SELECT at, activity, token_change, quote_change FROM pool_activity ORDER BY at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(pool_row).collect()
    }

    async fn all_price_rows(&self) -> Result<Vec<PriceRow>, DbError> {
        let rows = sqlx::query("SELECT at, price FROM price_points ORDER BY at ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(price_row).collect()
    }

    async fn add_claim_row(&self, row: &ClaimRow) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO claim_events (address, at, amount, revenue) VALUES ($1, $2, $3, $4)",
        )
        .bind(&row.address)
        .bind(row.at.timestamp())
        .bind(row.amount)
        .bind(row.revenue)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_pos_row(&self, row: &PosRow) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO pos_rewards (address, at, amount, revenue) VALUES ($1, $2, $3, $4)",
        )
        .bind(&row.address)
        .bind(row.at.timestamp())
        .bind(row.amount)
        .bind(row.revenue)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_stake_row(&self, row: &StakeRow) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO staking_events (address, at, amount, action) VALUES ($1, $2, $3, $4)",
        )
        .bind(&row.address)
        .bind(row.at.timestamp())
        .bind(row.amount)
        .bind(row.action.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_staking_reward_row(&self, row: &StakingRewardRow) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO staking_rewards (address, at, amount, revenue) VALUES ($1, $2, $3, $4)",
        )
        .bind(&row.address)
        .bind(row.at.timestamp())
        .bind(row.amount)
        .bind(row.revenue)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_code_row(&self, row: &CodeRow) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO code_claims (address, at, amount, revenue) VALUES ($1, $2, $3, $4)",
        )
        .bind(&row.address)
        .bind(row.at.timestamp())
        .bind(row.amount)
        .bind(row.revenue)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_pool_row(&self, row: &PoolRow) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO pool_activity (at, activity, token_change, quote_change)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(row.at.timestamp())
        .bind(row.activity.as_str())
        .bind(row.token_change)
        .bind(row.quote_change)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_price_row(&self, row: &PriceRow) -> Result<(), DbError> {
        sqlx::query("INSERT INTO price_points (at, price) VALUES ($1, $2)")
            .bind(row.at.timestamp())
            .bind(row.price)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
