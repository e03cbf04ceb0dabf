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

//! Report assembly over stored reward events.
//!
//! The reporter owns everything stateful around the `meridian-analytics`
//! engine: sqlx row storage, the versioned data snapshot with its disk
//! fallback, and the report service that resolves windows, fetches rows and
//! serializes the camelCase report envelopes.

pub mod db;
pub mod reports;
pub mod service;
pub mod snapshot;
pub mod test_utils;

pub use db::{AnyDb, DbError, DbObj, ReporterDb};
pub use service::{DbResultExt, ReportService, ReportServiceConfig, RuleSetVersion, ServiceError};
pub use snapshot::{DataSnapshot, SnapshotError, SnapshotInfo, SnapshotStore};
