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

//! Report assembly.
//!
//! Each report method resolves the request's windows, takes one snapshot
//! version for the whole request, fans out the live claim queries with
//! `tokio::join!` and hands the rows to the pure aggregators. Claim events
//! are always fetched live; every other source is sliced out of the
//! snapshot.
//!
//! Single-source reports propagate a failed fetch. The multi-source reports
//! (revenue, anomaly) instead contain a failed claim fetch to an empty
//! contribution so the remaining sources still report.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use meridian_analytics::{
    anomaly, claims, codes, pool, pos, price, revenue, staking,
    windows::{day_window, resolve_windows},
    BoundaryTable, ClaimRow, DateRange, SourceKind, WindowError,
};
use thiserror::Error;

use crate::db::{AnyDb, DbError, DbObj};
use crate::reports::{
    AnomalyReport, ClaimsReport, CodesReport, PoolReport, PosReport, RevenueReport, StakingReport,
};
use crate::snapshot::{DataSnapshot, SnapshotError, SnapshotStore};

pub use meridian_analytics::anomaly::RuleSetVersion;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbError),

    #[error("Database query error in {1}: {0}")]
    DatabaseQueryError(DbError, String),

    #[error("Snapshot error: {0}")]
    SnapshotError(#[from] SnapshotError),

    #[error("No data snapshot loaded; run load-data first")]
    SnapshotUnavailable,

    #[error("Invalid date range: {0}")]
    InvalidDateRange(#[from] WindowError),

    #[error("Error: {0}")]
    Error(#[from] anyhow::Error),
}

pub trait DbResultExt<T> {
    fn with_db_context(self, context: &str) -> Result<T, ServiceError>;
}

impl<T> DbResultExt<T> for Result<T, DbError> {
    fn with_db_context(self, context: &str) -> Result<T, ServiceError> {
        self.map_err(|e| ServiceError::DatabaseQueryError(e, context.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ReportServiceConfig {
    pub boundaries: BoundaryTable,
    pub rule_set: RuleSetVersion,
}

impl Default for ReportServiceConfig {
    fn default() -> Self {
        Self { boundaries: BoundaryTable::default(), rule_set: RuleSetVersion::default() }
    }
}

#[derive(Clone)]
pub struct ReportService {
    pub db: DbObj,
    pub snapshots: Arc<SnapshotStore>,
    pub config: ReportServiceConfig,
}

impl ReportService {
    pub async fn new(
        db_conn: &str,
        snapshot_path: Option<PathBuf>,
        config: ReportServiceConfig,
    ) -> Result<Self, ServiceError> {
        let db: DbObj = Arc::new(AnyDb::new(db_conn).await?);
        Ok(Self::from_parts(db, snapshot_path, config))
    }

    /// Assemble a service over an already constructed database handle.
    pub fn from_parts(
        db: DbObj,
        snapshot_path: Option<PathBuf>,
        config: ReportServiceConfig,
    ) -> Self {
        let snapshots = Arc::new(SnapshotStore::new(db.clone(), snapshot_path));
        Self { db, snapshots, config }
    }

    async fn require_snapshot(&self) -> Result<Arc<DataSnapshot>, ServiceError> {
        self.snapshots.try_restore().await.ok_or(ServiceError::SnapshotUnavailable)
    }

    pub async fn claims_report(&self, range: DateRange) -> Result<ClaimsReport, ServiceError> {
        let report_start = Instant::now();
        let boundaries = &self.config.boundaries;
        let windows = resolve_windows(range, SourceKind::Claims, boundaries);
        let price_windows = resolve_windows(range, SourceKind::Price, boundaries);

        let snapshot = self.require_snapshot().await?;

        let (current_rows, previous_rows) = tokio::join!(
            self.db.claim_rows_in(windows.current.start, windows.current.end),
            self.db.claim_rows_in(windows.previous.start, windows.previous.end),
        );
        let current_rows = current_rows.with_db_context("claims report, current window")?;
        let previous_rows = previous_rows.with_db_context("claims report, previous window")?;

        let current_price = price::reference_price(&snapshot.price_points_in(&price_windows.current));
        let previous_price =
            price::reference_price(&snapshot.price_points_in(&price_windows.previous));

        let current = claims::aggregate(&current_rows, current_price);
        let previous = claims::aggregate(&previous_rows, previous_price);

        let report = ClaimsReport {
            start_date: range.start(),
            end_date: range.end(),
            metrics: claims::compare(&current, &previous),
            daily_data: claims::daily_series(&current_rows, boundaries),
            top_users: claims::top_claimers(&current_rows).into_iter().map(Into::into).collect(),
        };

        tracing::info!(
            "Claims report {}..={} completed in {:?}",
            range.start(),
            range.end(),
            report_start.elapsed()
        );
        Ok(report)
    }

    pub async fn pos_report(&self, range: DateRange) -> Result<PosReport, ServiceError> {
        let report_start = Instant::now();
        let boundaries = &self.config.boundaries;
        let windows = resolve_windows(range, SourceKind::Pos, boundaries);

        let snapshot = self.require_snapshot().await?;
        let current_rows = snapshot.pos_rewards_in(&windows.current);
        let previous_rows = snapshot.pos_rewards_in(&windows.previous);

        let current = pos::aggregate(&current_rows);
        let previous = pos::aggregate(&previous_rows);

        let report = PosReport {
            start_date: range.start(),
            end_date: range.end(),
            metrics: pos::compare(&current, &previous),
            daily_data: pos::daily_series(&current_rows, boundaries),
            top_users: pos::top_recipients(&current_rows).into_iter().map(Into::into).collect(),
        };

        tracing::info!(
            "POS report {}..={} completed in {:?}",
            range.start(),
            range.end(),
            report_start.elapsed()
        );
        Ok(report)
    }

    pub async fn staking_report(&self, range: DateRange) -> Result<StakingReport, ServiceError> {
        let report_start = Instant::now();
        let boundaries = &self.config.boundaries;
        let windows = resolve_windows(range, SourceKind::Staking, boundaries);

        let snapshot = self.require_snapshot().await?;
        let current_stakes = snapshot.stake_events_in(&windows.current);
        let previous_stakes = snapshot.stake_events_in(&windows.previous);
        let current_rewards = snapshot.staking_rewards_in(&windows.current);
        let previous_rewards = snapshot.staking_rewards_in(&windows.previous);

        let current = staking::aggregate(&current_stakes, &current_rewards);
        let previous = staking::aggregate(&previous_stakes, &previous_rewards);

        let report = StakingReport {
            start_date: range.start(),
            end_date: range.end(),
            metrics: staking::compare(&current, &previous),
            daily_data: staking::daily_series(&current_stakes, &current_rewards, boundaries),
            top_stakers: staking::top_stakers(&current_stakes)
                .into_iter()
                .map(Into::into)
                .collect(),
        };

        tracing::info!(
            "Staking report {}..={} completed in {:?}",
            range.start(),
            range.end(),
            report_start.elapsed()
        );
        Ok(report)
    }

    pub async fn codes_report(&self, range: DateRange) -> Result<CodesReport, ServiceError> {
        let report_start = Instant::now();
        let boundaries = &self.config.boundaries;
        let windows = resolve_windows(range, SourceKind::Codes, boundaries);

        let snapshot = self.require_snapshot().await?;
        let current_rows = snapshot.code_claims_in(&windows.current);
        let previous_rows = snapshot.code_claims_in(&windows.previous);

        let current = codes::aggregate(&current_rows);
        let previous = codes::aggregate(&previous_rows);

        let report = CodesReport {
            start_date: range.start(),
            end_date: range.end(),
            metrics: codes::compare(&current, &previous),
            daily_data: codes::daily_series(&current_rows, boundaries),
            top_users: codes::top_redeemers(&current_rows).into_iter().map(Into::into).collect(),
        };

        tracing::info!(
            "Codes report {}..={} completed in {:?}",
            range.start(),
            range.end(),
            report_start.elapsed()
        );
        Ok(report)
    }

    pub async fn pool_report(&self, range: DateRange) -> Result<PoolReport, ServiceError> {
        let report_start = Instant::now();
        let boundaries = &self.config.boundaries;
        let windows = resolve_windows(range, SourceKind::Pool, boundaries);
        let price_windows = resolve_windows(range, SourceKind::Price, boundaries);

        let snapshot = self.require_snapshot().await?;
        let current_rows = snapshot.pool_activity_in(&windows.current);
        let previous_rows = snapshot.pool_activity_in(&windows.previous);
        let price_rows = snapshot.price_points_in(&price_windows.current);

        let current = pool::aggregate(&current_rows);
        let previous = pool::aggregate(&previous_rows);

        let report = PoolReport {
            start_date: range.start(),
            end_date: range.end(),
            metrics: pool::compare(&current, &previous),
            daily_data: pool::daily_series(&current_rows, boundaries),
            hourly_price: pool::hourly_candles(&price_rows, boundaries),
        };

        tracing::info!(
            "Pool report {}..={} completed in {:?}",
            range.start(),
            range.end(),
            report_start.elapsed()
        );
        Ok(report)
    }

    pub async fn revenue_report(&self, range: DateRange) -> Result<RevenueReport, ServiceError> {
        let report_start = Instant::now();
        let boundaries = &self.config.boundaries;
        let claims_windows = resolve_windows(range, SourceKind::Claims, boundaries);
        let pos_windows = resolve_windows(range, SourceKind::Pos, boundaries);
        let staking_windows = resolve_windows(range, SourceKind::Staking, boundaries);
        let codes_windows = resolve_windows(range, SourceKind::Codes, boundaries);

        let snapshot = self.require_snapshot().await?;

        let (claims_current, claims_previous) = tokio::join!(
            self.db.claim_rows_in(claims_windows.current.start, claims_windows.current.end),
            self.db.claim_rows_in(claims_windows.previous.start, claims_windows.previous.end),
        );
        let claims_current = contain_claim_failure("revenue report, current window", claims_current);
        let claims_previous =
            contain_claim_failure("revenue report, previous window", claims_previous);

        let pos_current = snapshot.pos_rewards_in(&pos_windows.current);
        let pos_previous = snapshot.pos_rewards_in(&pos_windows.previous);
        let rewards_current = snapshot.staking_rewards_in(&staking_windows.current);
        let rewards_previous = snapshot.staking_rewards_in(&staking_windows.previous);
        let codes_current = snapshot.code_claims_in(&codes_windows.current);
        let codes_previous = snapshot.code_claims_in(&codes_windows.previous);

        let current =
            revenue::aggregate(&claims_current, &pos_current, &rewards_current, &codes_current);
        let previous = revenue::aggregate(
            &claims_previous,
            &pos_previous,
            &rewards_previous,
            &codes_previous,
        );

        let report = RevenueReport {
            start_date: range.start(),
            end_date: range.end(),
            metrics: revenue::compare(&current, &previous),
            daily_data: revenue::daily_series(
                &claims_current,
                &pos_current,
                &rewards_current,
                &codes_current,
                boundaries,
            ),
            composition: revenue::composition(&current),
        };

        tracing::info!(
            "Revenue report {}..={} completed in {:?}",
            range.start(),
            range.end(),
            report_start.elapsed()
        );
        Ok(report)
    }

    pub async fn anomaly_report(&self, date: NaiveDate) -> Result<AnomalyReport, ServiceError> {
        let report_start = Instant::now();
        let boundaries = &self.config.boundaries;
        let claims_window = day_window(date, SourceKind::Claims, boundaries);
        let pos_window = day_window(date, SourceKind::Pos, boundaries);
        let staking_window = day_window(date, SourceKind::Staking, boundaries);

        let snapshot = self.require_snapshot().await?;

        let claim_rows = contain_claim_failure(
            "anomaly report",
            self.db.claim_rows_in(claims_window.start, claims_window.end).await,
        );
        let pos_rows = snapshot.pos_rewards_in(&pos_window);
        let reward_rows = snapshot.staking_rewards_in(&staking_window);

        let mut anomalies = anomaly::claim_findings(date, &claim_rows, self.config.rule_set);
        anomalies.extend(anomaly::pos_findings(date, &pos_rows));
        anomalies.extend(anomaly::staking_reward_findings(date, &reward_rows));

        let summary = anomaly::summarize(&anomalies);

        tracing::info!(
            "Anomaly report for {date}: {} findings under {:?} rules in {:?}",
            summary.total_count,
            self.config.rule_set,
            report_start.elapsed()
        );
        Ok(AnomalyReport { date, rule_set: self.config.rule_set, summary, anomalies })
    }
}

/// Claim rows are one contribution among several in the multi-source
/// reports; a failed fetch is reduced to an empty one so the rest of the
/// report still stands.
fn contain_claim_failure(scope: &str, result: Result<Vec<ClaimRow>, DbError>) -> Vec<ClaimRow> {
    match result {
        Ok(rows) => rows,
        Err(err) => {
            tracing::error!("Claim rows unavailable in {scope}, contributing nothing: {err:?}");
            Vec::new()
        }
    }
}
