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

//! Period-over-period delta computation.

use serde::{Deserialize, Serialize};

/// A metric paired across the current and previous period.
///
/// `delta_percent` is `None` whenever the previous value gives no meaningful
/// base (zero or negative); consumers render that as null, never as 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delta<T> {
    pub current: T,
    pub prev: T,
    #[serde(rename = "deltaPercent")]
    pub delta_percent: Option<f64>,
}

/// Percentage change from `prev` to `current`, undefined unless `prev > 0`.
pub fn percent_change(current: f64, prev: f64) -> Option<f64> {
    (prev > 0.0).then(|| (current - prev) / prev * 100.0)
}

impl Delta<f64> {
    pub fn new(current: f64, prev: f64) -> Self {
        Self { current, prev, delta_percent: percent_change(current, prev) }
    }
}

impl Delta<u64> {
    pub fn new(current: u64, prev: u64) -> Self {
        Self { current, prev, delta_percent: percent_change(current as f64, prev as f64) }
    }
}

impl Delta<i64> {
    pub fn new(current: i64, prev: i64) -> Self {
        Self { current, prev, delta_percent: percent_change(current as f64, prev as f64) }
    }
}

impl Delta<Option<f64>> {
    /// Pairs an optional ratio metric. The percentage is only defined when
    /// both periods produced a value and the previous one is positive.
    pub fn of_optional(current: Option<f64>, prev: Option<f64>) -> Self {
        let delta_percent = match (current, prev) {
            (Some(c), Some(p)) => percent_change(c, p),
            _ => None,
        };
        Self { current, prev, delta_percent }
    }
}

/// What a guarded ratio yields when its denominator is not positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnZeroDenominator {
    ReturnZero,
    ReturnNull,
}

/// Divides with an explicit zero-denominator policy, so each metric's
/// null-vs-zero behavior is stated at the call site.
pub fn guarded_ratio(numerator: f64, denominator: f64, on_zero: OnZeroDenominator) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        match on_zero {
            OnZeroDenominator::ReturnZero => Some(0.0),
            OnZeroDenominator::ReturnNull => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percent_change_basic() {
        assert_eq!(percent_change(150.0, 100.0), Some(50.0));
        assert_eq!(percent_change(50.0, 100.0), Some(-50.0));
        assert_eq!(percent_change(100.0, 100.0), Some(0.0));
    }

    #[test]
    fn test_percent_change_undefined_base() {
        assert_eq!(percent_change(100.0, 0.0), None);
        assert_eq!(percent_change(0.0, 0.0), None);
        assert_eq!(percent_change(100.0, -5.0), None);
    }

    #[test]
    fn test_current_zero_prev_positive_is_minus_100() {
        assert_eq!(percent_change(0.0, 40.0), Some(-100.0));
        assert_eq!(Delta::<u64>::new(0, 7).delta_percent, Some(-100.0));
    }

    #[test]
    fn test_count_delta() {
        let d = Delta::<u64>::new(30, 20);
        assert_eq!(d.current, 30);
        assert_eq!(d.prev, 20);
        assert_eq!(d.delta_percent, Some(50.0));
    }

    #[test]
    fn test_optional_delta_requires_both_periods() {
        assert_eq!(Delta::of_optional(Some(10.0), Some(5.0)).delta_percent, Some(100.0));
        assert_eq!(Delta::of_optional(Some(10.0), None).delta_percent, None);
        assert_eq!(Delta::of_optional(None, Some(5.0)).delta_percent, None);
        assert_eq!(Delta::of_optional(None, None).delta_percent, None);
        // An avg of zero in the previous period still gives no base.
        assert_eq!(Delta::of_optional(Some(10.0), Some(0.0)).delta_percent, None);
    }

    #[test]
    fn test_guarded_ratio_policies() {
        assert_eq!(guarded_ratio(10.0, 4.0, OnZeroDenominator::ReturnZero), Some(2.5));
        assert_eq!(guarded_ratio(10.0, 0.0, OnZeroDenominator::ReturnZero), Some(0.0));
        assert_eq!(guarded_ratio(10.0, 0.0, OnZeroDenominator::ReturnNull), None);
        assert_eq!(guarded_ratio(0.0, 0.0, OnZeroDenominator::ReturnNull), None);
    }

    #[test]
    fn test_delta_serializes_wire_names() {
        let d = Delta::<f64>::new(3.0, 2.0);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["current"], 3.0);
        assert_eq!(json["prev"], 2.0);
        assert!((json["deltaPercent"].as_f64().unwrap() - 50.0).abs() < 1e-9);

        let none = Delta::<f64>::new(3.0, 0.0);
        let json = serde_json::to_value(&none).unwrap();
        assert!(json["deltaPercent"].is_null());
    }

    proptest! {
        #[test]
        fn prop_positive_base_always_defined(current in 0.0f64..1e12, prev in 1e-6f64..1e12) {
            let d = percent_change(current, prev).unwrap();
            let expected = (current - prev) / prev * 100.0;
            prop_assert!((d - expected).abs() <= expected.abs() * 1e-12 + 1e-9);
        }

        #[test]
        fn prop_non_positive_base_never_defined(current in -1e12f64..1e12, prev in -1e12f64..=0.0) {
            prop_assert_eq!(percent_change(current, prev), None);
        }
    }
}
