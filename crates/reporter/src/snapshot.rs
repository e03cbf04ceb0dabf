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

//! Versioned in-memory snapshot of the non-claim row tables.
//!
//! Claim events are the high-volume table and are always queried live; the
//! other sources are small enough to hold whole. `SnapshotStore` owns the
//! lifecycle: serve from memory, fall back to the JSON file on disk, fall
//! back to a database refresh. Reports take the current snapshot as an
//! explicit value, so one request sees one consistent version throughout.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use meridian_analytics::{
    CodeRow, PoolRow, PosRow, PriceRow, StakeRow, StakingRewardRow, Window,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::db::{DbError, DbObj};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Snapshot file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// One consistent view of the non-claim tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSnapshot {
    /// Monotonically increasing per store; survives the disk round trip.
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    pub pos_rewards: Vec<PosRow>,
    pub stake_events: Vec<StakeRow>,
    pub staking_rewards: Vec<StakingRewardRow>,
    pub code_claims: Vec<CodeRow>,
    pub pool_activity: Vec<PoolRow>,
    pub price_points: Vec<PriceRow>,
}

fn rows_in<R: Clone>(rows: &[R], at: impl Fn(&R) -> DateTime<Utc>, window: &Window) -> Vec<R> {
    rows.iter().filter(|row| window.contains(at(row))).cloned().collect()
}

impl DataSnapshot {
    pub fn row_count(&self) -> usize {
        self.pos_rewards.len()
            + self.stake_events.len()
            + self.staking_rewards.len()
            + self.code_claims.len()
            + self.pool_activity.len()
            + self.price_points.len()
    }

    pub fn pos_rewards_in(&self, window: &Window) -> Vec<PosRow> {
        rows_in(&self.pos_rewards, |row| row.at, window)
    }

    pub fn stake_events_in(&self, window: &Window) -> Vec<StakeRow> {
        rows_in(&self.stake_events, |row| row.at, window)
    }

    pub fn staking_rewards_in(&self, window: &Window) -> Vec<StakingRewardRow> {
        rows_in(&self.staking_rewards, |row| row.at, window)
    }

    pub fn code_claims_in(&self, window: &Window) -> Vec<CodeRow> {
        rows_in(&self.code_claims, |row| row.at, window)
    }

    pub fn pool_activity_in(&self, window: &Window) -> Vec<PoolRow> {
        rows_in(&self.pool_activity, |row| row.at, window)
    }

    pub fn price_points_in(&self, window: &Window) -> Vec<PriceRow> {
        rows_in(&self.price_points, |row| row.at, window)
    }
}

/// Snapshot status for the `cache-info` surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInfo {
    pub memory_loaded: bool,
    pub disk_present: bool,
    pub version: Option<u64>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub row_count: Option<usize>,
    pub disk_path: Option<String>,
    pub disk_size_mb: Option<f64>,
}

pub struct SnapshotStore {
    db: DbObj,
    disk_path: Option<PathBuf>,
    current: RwLock<Option<Arc<DataSnapshot>>>,
    version: AtomicU64,
}

impl SnapshotStore {
    /// `disk_path` is optional; without it the snapshot lives in memory only.
    pub fn new(db: DbObj, disk_path: Option<PathBuf>) -> Self {
        Self { db, disk_path, current: RwLock::new(None), version: AtomicU64::new(0) }
    }

    /// The snapshot currently held in memory, if any.
    pub async fn current(&self) -> Option<Arc<DataSnapshot>> {
        self.current.read().await.clone()
    }

    /// Memory, then disk. Never touches the database.
    pub async fn try_restore(&self) -> Option<Arc<DataSnapshot>> {
        if let Some(snapshot) = self.current().await {
            return Some(snapshot);
        }
        self.restore_from_disk().await
    }

    /// Memory, then disk, then a database refresh. `force_refresh` skips
    /// straight to the database.
    pub async fn load(&self, force_refresh: bool) -> Result<Arc<DataSnapshot>, SnapshotError> {
        if !force_refresh {
            if let Some(snapshot) = self.try_restore().await {
                tracing::debug!("Serving data snapshot v{}", snapshot.version);
                return Ok(snapshot);
            }
        }
        self.refresh().await
    }

    /// Rebuild the snapshot from the database and persist it.
    pub async fn refresh(&self) -> Result<Arc<DataSnapshot>, SnapshotError> {
        let fetch_start = Instant::now();

        let (pos_rewards, stake_events, staking_rewards, code_claims, pool_activity, price_points) =
            tokio::join!(
                self.db.all_pos_rows(),
                self.db.all_stake_rows(),
                self.db.all_staking_reward_rows(),
                self.db.all_code_rows(),
                self.db.all_pool_rows(),
                self.db.all_price_rows(),
            );

        let pos_rewards = pos_rewards?;
        let stake_events = stake_events?;
        let staking_rewards = staking_rewards?;
        let code_claims = code_claims?;
        let pool_activity = pool_activity?;
        let price_points = price_points?;

        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(DataSnapshot {
            version,
            loaded_at: Utc::now(),
            pos_rewards,
            stake_events,
            staking_rewards,
            code_claims,
            pool_activity,
            price_points,
        });

        tracing::info!(
            "Refreshed data snapshot v{}: {} pos rewards, {} stake events, {} staking rewards, {} code claims, {} pool rows, {} price points in {:?}",
            snapshot.version,
            snapshot.pos_rewards.len(),
            snapshot.stake_events.len(),
            snapshot.staking_rewards.len(),
            snapshot.code_claims.len(),
            snapshot.pool_activity.len(),
            snapshot.price_points.len(),
            fetch_start.elapsed()
        );

        self.persist(&snapshot).await;
        *self.current.write().await = Some(snapshot.clone());

        Ok(snapshot)
    }

    /// Drop the in-memory snapshot and remove the disk file.
    pub async fn clear(&self) -> Result<(), SnapshotError> {
        *self.current.write().await = None;
        if let Some(path) = &self.disk_path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        tracing::info!("Cleared data snapshot");
        Ok(())
    }

    pub async fn info(&self) -> SnapshotInfo {
        let current = self.current().await;
        let (disk_present, disk_size_mb) = match &self.disk_path {
            Some(path) => match tokio::fs::metadata(path).await {
                Ok(meta) => (true, Some(meta.len() as f64 / (1024.0 * 1024.0))),
                Err(_) => (false, None),
            },
            None => (false, None),
        };

        SnapshotInfo {
            memory_loaded: current.is_some(),
            disk_present,
            version: current.as_ref().map(|snapshot| snapshot.version),
            loaded_at: current.as_ref().map(|snapshot| snapshot.loaded_at),
            row_count: current.as_ref().map(|snapshot| snapshot.row_count()),
            disk_path: self.disk_path.as_ref().map(|path| path.display().to_string()),
            disk_size_mb,
        }
    }

    async fn restore_from_disk(&self) -> Option<Arc<DataSnapshot>> {
        let path = self.disk_path.as_ref()?;

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!("Failed to read snapshot file {}: {err:?}", path.display());
                return None;
            }
        };

        let snapshot: DataSnapshot = match serde_json::from_slice(&bytes) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(
                    "Discarding unreadable snapshot file {}: {err:?}",
                    path.display()
                );
                return None;
            }
        };

        // Keep the counter monotonic across restarts.
        self.version.fetch_max(snapshot.version, Ordering::SeqCst);
        let snapshot = Arc::new(snapshot);

        tracing::info!(
            "Restored data snapshot v{} ({} rows) from {}",
            snapshot.version,
            snapshot.row_count(),
            path.display()
        );

        *self.current.write().await = Some(snapshot.clone());
        Some(snapshot)
    }

    async fn persist(&self, snapshot: &DataSnapshot) {
        let Some(path) = &self.disk_path else { return };

        let result = match serde_json::to_vec(snapshot) {
            Ok(bytes) => tokio::fs::write(path, bytes).await.map_err(SnapshotError::from),
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            // A refresh that cannot persist still serves from memory.
            tracing::warn!("Failed to persist snapshot to {}: {err:?}", path.display());
        }
    }
}
