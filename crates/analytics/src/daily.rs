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

//! Civil business-day labeling for daily series.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Returns the business day a UTC instant belongs to under the given civil
/// boundary hour.
///
/// An event before the boundary hour (in civil time) still belongs to the
/// previous day's business day; shifting the civil clock back by the boundary
/// hour and taking the date gives exactly that.
pub fn business_day(at: DateTime<Utc>, boundary_hour: u32, civil_offset_hours: i64) -> NaiveDate {
    let civil = at + Duration::hours(civil_offset_hours);
    (civil - Duration::hours(boundary_hour as i64)).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn civil(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        // Build a civil (+8) wall-clock instant and convert it back to UTC.
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap() - Duration::hours(8)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_before_boundary_belongs_to_previous_day() {
        // 23:30 on June 1 is past the 08:00 boundary and keeps its own date;
        // 00:30 on June 2 is before it and rolls back to June 1. June 2 only
        // starts at 08:00 civil.
        assert_eq!(business_day(civil(2025, 6, 1, 23, 30), 8, 8), date(2025, 6, 1));
        assert_eq!(business_day(civil(2025, 6, 2, 0, 30), 8, 8), date(2025, 6, 1));
        assert_eq!(business_day(civil(2025, 6, 2, 8, 30), 8, 8), date(2025, 6, 2));
    }

    #[test]
    fn test_boundary_instant_starts_its_own_day() {
        assert_eq!(business_day(civil(2025, 6, 2, 8, 0), 8, 8), date(2025, 6, 2));
        assert_eq!(business_day(civil(2025, 6, 2, 12, 0), 12, 8), date(2025, 6, 2));
        assert_eq!(business_day(civil(2025, 6, 2, 11, 59), 12, 8), date(2025, 6, 1));
    }

    #[test]
    fn test_midnight_boundary_is_the_civil_date() {
        assert_eq!(business_day(civil(2025, 6, 2, 0, 0), 0, 8), date(2025, 6, 2));
        assert_eq!(business_day(civil(2025, 6, 2, 23, 59), 0, 8), date(2025, 6, 2));
    }

    #[test]
    fn test_business_day_across_month_and_year() {
        assert_eq!(business_day(civil(2025, 7, 1, 3, 0), 8, 8), date(2025, 6, 30));
        assert_eq!(business_day(civil(2026, 1, 1, 7, 59), 8, 8), date(2025, 12, 31));
    }
}
