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

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use meridian_analytics::{BoundaryTable, DateRange};
use meridian_reporter::{ReportService, ReportServiceConfig, RuleSetVersion};
use serde::Serialize;

/// Arguments of the reporter.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct MainArgs {
    /// DB connection string.
    #[clap(long, env = "DATABASE_URL")]
    db: String,
    /// Path of the on-disk snapshot file.
    #[clap(long, env)]
    snapshot_path: Option<PathBuf>,
    /// Anomaly rule set revision: "v1" or "v2".
    #[clap(long, env, default_value = "v2")]
    rule_set: String,
    /// Whether to log in JSON format.
    #[clap(long, env, default_value_t = false)]
    log_json: bool,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct RangeArgs {
    /// First civil date of the period, as YYYY-MM-DD.
    #[clap(long)]
    start_date: NaiveDate,
    /// Last civil date of the period, inclusive.
    #[clap(long)]
    end_date: NaiveDate,
}

impl RangeArgs {
    fn range(&self) -> Result<DateRange> {
        Ok(DateRange::new(self.start_date, self.end_date)?)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the data snapshot from the database.
    LoadData {
        /// Rebuild even if a snapshot is already available.
        #[clap(long, default_value_t = false)]
        force_refresh: bool,
    },
    /// Drop the data snapshot from memory and disk.
    ClearCache,
    /// Show the snapshot status.
    CacheInfo,
    /// Claim activity report.
    Claims(RangeArgs),
    /// POS reward report.
    Pos(RangeArgs),
    /// Staking and staking reward report.
    Staking(RangeArgs),
    /// Point-code redemption report.
    Codes(RangeArgs),
    /// Liquidity pool report.
    Pool(RangeArgs),
    /// Cross-source revenue report.
    Revenue(RangeArgs),
    /// Single-day anomaly screening.
    Anomaly {
        /// Business day to screen, as YYYY-MM-DD.
        #[clap(long)]
        date: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = MainArgs::parse();

    if args.log_json {
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    let rule_set = match args.rule_set.as_str() {
        "v1" => RuleSetVersion::V1,
        "v2" => RuleSetVersion::V2,
        _ => bail!("Invalid rule_set: {}. Use 'v1' or 'v2'", args.rule_set),
    };

    let config = ReportServiceConfig { boundaries: BoundaryTable::default(), rule_set };
    let service = ReportService::new(&args.db, args.snapshot_path.clone(), config).await?;

    match args.command {
        Command::LoadData { force_refresh } => {
            service.snapshots.load(force_refresh).await?;
            emit(&service.snapshots.info().await)?;
        }
        Command::ClearCache => {
            service.snapshots.clear().await?;
            emit(&service.snapshots.info().await)?;
        }
        Command::CacheInfo => emit(&service.snapshots.info().await)?,
        Command::Claims(range) => emit(&service.claims_report(range.range()?).await?)?,
        Command::Pos(range) => emit(&service.pos_report(range.range()?).await?)?,
        Command::Staking(range) => emit(&service.staking_report(range.range()?).await?)?,
        Command::Codes(range) => emit(&service.codes_report(range.range()?).await?)?,
        Command::Pool(range) => emit(&service.pool_report(range.range()?).await?)?,
        Command::Revenue(range) => emit(&service.revenue_report(range.range()?).await?)?,
        Command::Anomaly { date } => emit(&service.anomaly_report(date).await?)?,
    }

    Ok(())
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
