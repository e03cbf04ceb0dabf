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

//! Reference price derivation for cost and ROI metrics.

use crate::rows::PriceRow;

/// Used when a window holds no price samples, so cost metrics stay defined.
pub const DEFAULT_REFERENCE_PRICE: f64 = 1.0;

/// Unweighted mean of the window's price samples.
pub fn reference_price(rows: &[PriceRow]) -> f64 {
    if rows.is_empty() {
        return DEFAULT_REFERENCE_PRICE;
    }
    rows.iter().map(|r| r.price).sum::<f64>() / rows.len() as f64
}
