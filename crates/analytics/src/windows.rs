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

//! Business-day window resolution for report periods.
//!
//! Event timestamps are stored in UTC, but each source settles its business
//! day at a fixed civil hour (UTC+8). This module turns inclusive civil date
//! ranges into half-open UTC windows: the requested (current) period and the
//! equal-length period immediately before it.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Civil timezone offset shared by every source, in hours east of UTC.
pub const CIVIL_OFFSET_HOURS: i64 = 8;

/// Boundary hour of the claim stream's business day.
pub const CLAIMS_BOUNDARY_HOUR: u32 = 8;
/// Boundary hour of the POS reward stream's business day.
pub const POS_BOUNDARY_HOUR: u32 = 12;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// The event streams the engine reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Claims,
    Pos,
    Staking,
    Codes,
    Pool,
    Price,
}

/// Per-source business-day boundary hours, in civil time.
///
/// Kept as one table rather than per-call literals so that every window in a
/// report is resolved against the same configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryTable {
    pub civil_offset_hours: i64,
    pub claims_hour: u32,
    pub pos_hour: u32,
    pub staking_hour: u32,
    pub codes_hour: u32,
    pub pool_hour: u32,
    pub price_hour: u32,
}

impl Default for BoundaryTable {
    fn default() -> Self {
        Self {
            civil_offset_hours: CIVIL_OFFSET_HOURS,
            claims_hour: CLAIMS_BOUNDARY_HOUR,
            pos_hour: POS_BOUNDARY_HOUR,
            staking_hour: 0,
            codes_hour: 0,
            pool_hour: 0,
            price_hour: 0,
        }
    }
}

impl BoundaryTable {
    /// Returns the civil boundary hour at which `source` rolls over to the
    /// next business day.
    pub fn boundary_hour(&self, source: SourceKind) -> u32 {
        match source {
            SourceKind::Claims => self.claims_hour,
            SourceKind::Pos => self.pos_hour,
            SourceKind::Staking => self.staking_hour,
            SourceKind::Codes => self.codes_hour,
            SourceKind::Pool => self.pool_hour,
            SourceKind::Price => self.price_hour,
        }
    }
}

/// An inclusive range of civil dates, validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one civil date.
    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of civil days covered, inclusive of both endpoints.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// A half-open UTC interval: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// The requested period and the equal-length period immediately before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPair {
    pub current: Window,
    pub previous: Window,
}

/// UTC instant at which `date` reaches civil hour `hour` in the UTC+offset
/// civil zone.
fn boundary_instant(date: NaiveDate, hour: u32, civil_offset_hours: i64) -> DateTime<Utc> {
    // Boundary hours come from the table and are always in 0..24.
    let civil = date.and_hms_opt(hour, 0, 0).unwrap();
    civil.and_utc() - Duration::hours(civil_offset_hours)
}

/// Resolves the current and previous windows for `range` under `source`'s
/// business-day boundary.
///
/// The current window runs from the boundary instant on `range.start()` to
/// the boundary instant on the day after `range.end()`; the previous window
/// is the equal-length interval ending where the current one starts.
pub fn resolve_windows(range: DateRange, source: SourceKind, table: &BoundaryTable) -> WindowPair {
    let hour = table.boundary_hour(source);
    let start = boundary_instant(range.start(), hour, table.civil_offset_hours);
    let end = boundary_instant(range.end() + Duration::days(1), hour, table.civil_offset_hours);
    let current = Window { start, end };

    let period = current.duration();
    let previous = Window { start: current.start - period, end: current.start };

    WindowPair { current, previous }
}

/// The single business-day window covering civil `date` under `source`'s
/// boundary. Used by the anomaly rules, which look at one day at a time.
pub fn day_window(date: NaiveDate, source: SourceKind, table: &BoundaryTable) -> Window {
    resolve_windows(DateRange::single(date), source, table).current
}
