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

//! Liquidity-pool trade aggregation and hourly price candles.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::daily::business_day;
use crate::delta::Delta;
use crate::rows::{PoolActivity, PoolRow, PriceRow};
use crate::windows::{BoundaryTable, SourceKind};

/// Sells moving a claim-sized token amount are tracked separately; a normal
/// claim plus its draws lands in this band.
pub const CLAIM_SELL_MIN_TOKENS: f64 = 13_000.0;
pub const CLAIM_SELL_MAX_TOKENS: f64 = 20_000.0;

/// Per-activity counts and absolute volumes, plus the claim-sized sell band.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PoolMetrics {
    pub buy_count: u64,
    pub buy_token_amount: f64,
    pub buy_quote_amount: f64,
    pub sell_count: u64,
    pub sell_token_amount: f64,
    pub sell_quote_amount: f64,
    pub claim_sell_token_amount: f64,
    pub claim_sell_quote_amount: f64,
    pub liq_add_count: u64,
    pub liq_add_quote_amount: f64,
    pub liq_remove_count: u64,
    pub liq_remove_quote_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolComparison {
    pub buy_count: Delta<u64>,
    pub buy_token_amount: Delta<f64>,
    pub buy_quote_amount: Delta<f64>,
    pub sell_count: Delta<u64>,
    pub sell_token_amount: Delta<f64>,
    pub sell_quote_amount: Delta<f64>,
    pub claim_sell_token_amount: Delta<f64>,
    pub claim_sell_quote_amount: Delta<f64>,
    pub liq_add_count: Delta<u64>,
    pub liq_add_quote_amount: Delta<f64>,
    pub liq_remove_count: Delta<u64>,
    pub liq_remove_quote_amount: Delta<f64>,
}

/// One business day of pool flows, in quote currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDailyPoint {
    pub date: NaiveDate,
    pub buy_quote: f64,
    pub sell_quote: f64,
    /// Buys minus sells; negative when the pool saw net selling.
    pub net_flow: f64,
    pub liq_add_quote: f64,
    pub liq_remove_quote: f64,
    pub claim_sell_quote: f64,
}

/// One civil hour of price movement. `ohlc` is `[open, close, low, high]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceCandle {
    pub time: String,
    pub ohlc: [f64; 4],
}

fn is_claim_sized_sell(row: &PoolRow) -> bool {
    row.activity == PoolActivity::Sell
        && (CLAIM_SELL_MIN_TOKENS..=CLAIM_SELL_MAX_TOKENS).contains(&row.token_change.abs())
}

pub fn aggregate(rows: &[PoolRow]) -> PoolMetrics {
    let mut m = PoolMetrics::default();
    for row in rows {
        let token = row.token_change.abs();
        let quote = row.quote_change.abs();
        match row.activity {
            PoolActivity::Buy => {
                m.buy_count += 1;
                m.buy_token_amount += token;
                m.buy_quote_amount += quote;
            }
            PoolActivity::Sell => {
                m.sell_count += 1;
                m.sell_token_amount += token;
                m.sell_quote_amount += quote;
                if is_claim_sized_sell(row) {
                    m.claim_sell_token_amount += token;
                    m.claim_sell_quote_amount += quote;
                }
            }
            PoolActivity::LiqAdd => {
                m.liq_add_count += 1;
                m.liq_add_quote_amount += quote;
            }
            PoolActivity::LiqRemove => {
                m.liq_remove_count += 1;
                m.liq_remove_quote_amount += quote;
            }
        }
    }
    m
}

pub fn compare(current: &PoolMetrics, previous: &PoolMetrics) -> PoolComparison {
    PoolComparison {
        buy_count: Delta::<u64>::new(current.buy_count, previous.buy_count),
        buy_token_amount: Delta::<f64>::new(current.buy_token_amount, previous.buy_token_amount),
        buy_quote_amount: Delta::<f64>::new(current.buy_quote_amount, previous.buy_quote_amount),
        sell_count: Delta::<u64>::new(current.sell_count, previous.sell_count),
        sell_token_amount: Delta::<f64>::new(current.sell_token_amount, previous.sell_token_amount),
        sell_quote_amount: Delta::<f64>::new(current.sell_quote_amount, previous.sell_quote_amount),
        claim_sell_token_amount: Delta::<f64>::new(
            current.claim_sell_token_amount,
            previous.claim_sell_token_amount,
        ),
        claim_sell_quote_amount: Delta::<f64>::new(
            current.claim_sell_quote_amount,
            previous.claim_sell_quote_amount,
        ),
        liq_add_count: Delta::<u64>::new(current.liq_add_count, previous.liq_add_count),
        liq_add_quote_amount: Delta::<f64>::new(
            current.liq_add_quote_amount,
            previous.liq_add_quote_amount,
        ),
        liq_remove_count: Delta::<u64>::new(current.liq_remove_count, previous.liq_remove_count),
        liq_remove_quote_amount: Delta::<f64>::new(
            current.liq_remove_quote_amount,
            previous.liq_remove_quote_amount,
        ),
    }
}

pub fn daily_series(rows: &[PoolRow], boundaries: &BoundaryTable) -> Vec<PoolDailyPoint> {
    let hour = boundaries.boundary_hour(SourceKind::Pool);
    let mut days: BTreeMap<NaiveDate, PoolDailyPoint> = BTreeMap::new();
    for row in rows {
        let date = business_day(row.at, hour, boundaries.civil_offset_hours);
        let point = days.entry(date).or_insert(PoolDailyPoint {
            date,
            buy_quote: 0.0,
            sell_quote: 0.0,
            net_flow: 0.0,
            liq_add_quote: 0.0,
            liq_remove_quote: 0.0,
            claim_sell_quote: 0.0,
        });
        let quote = row.quote_change.abs();
        match row.activity {
            PoolActivity::Buy => point.buy_quote += quote,
            PoolActivity::Sell => {
                point.sell_quote += quote;
                if is_claim_sized_sell(row) {
                    point.claim_sell_quote += quote;
                }
            }
            PoolActivity::LiqAdd => point.liq_add_quote += quote,
            PoolActivity::LiqRemove => point.liq_remove_quote += quote,
        }
    }
    days.into_values()
        .map(|mut point| {
            point.net_flow = point.buy_quote - point.sell_quote;
            point
        })
        .collect()
}

/// Hourly OHLC candles over the window's price samples, labeled with the
/// civil wall-clock hour.
pub fn hourly_candles(prices: &[PriceRow], boundaries: &BoundaryTable) -> Vec<PriceCandle> {
    let mut ordered: Vec<&PriceRow> = prices.iter().collect();
    ordered.sort_by_key(|r| r.at);

    // (open, close, low, high) keyed by the civil hour floor.
    let mut hours: BTreeMap<NaiveDateTime, (f64, f64, f64, f64)> = BTreeMap::new();
    for row in ordered {
        let civil = row.at + Duration::hours(boundaries.civil_offset_hours);
        // hour() is always in 0..24, so the floor is always constructible.
        let hour = civil.date_naive().and_hms_opt(civil.hour(), 0, 0).unwrap();
        match hours.entry(hour) {
            Entry::Vacant(slot) => {
                slot.insert((row.price, row.price, row.price, row.price));
            }
            Entry::Occupied(mut slot) => {
                let candle = slot.get_mut();
                candle.1 = row.price;
                candle.2 = candle.2.min(row.price);
                candle.3 = candle.3.max(row.price);
            }
        }
    }

    hours
        .into_iter()
        .map(|(hour, (open, close, low, high))| PriceCandle {
            time: hour.format("%Y-%m-%d %H:%M").to_string(),
            ohlc: [open, close, low, high],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, d, h, min, 0).unwrap()
    }

    fn trade(at_: DateTime<Utc>, activity: PoolActivity, token: f64, quote: f64) -> PoolRow {
        PoolRow { at: at_, activity, token_change: token, quote_change: quote }
    }

    #[test]
    fn test_empty_is_all_zero() {
        assert_eq!(aggregate(&[]), PoolMetrics::default());
    }

    #[test]
    fn test_aggregate_uses_absolute_values() {
        let rows = vec![
            trade(at(1, 1, 0), PoolActivity::Buy, 1000.0, -50.0),
            trade(at(1, 2, 0), PoolActivity::Sell, -2000.0, 90.0),
            trade(at(1, 3, 0), PoolActivity::LiqAdd, 500.0, 25.0),
            trade(at(1, 4, 0), PoolActivity::LiqRemove, -300.0, -15.0),
        ];
        let m = aggregate(&rows);
        assert_eq!(m.buy_count, 1);
        assert_eq!(m.buy_token_amount, 1000.0);
        assert_eq!(m.buy_quote_amount, 50.0);
        assert_eq!(m.sell_count, 1);
        assert_eq!(m.sell_token_amount, 2000.0);
        assert_eq!(m.sell_quote_amount, 90.0);
        assert_eq!(m.liq_add_quote_amount, 25.0);
        assert_eq!(m.liq_remove_quote_amount, 15.0);
    }

    #[test]
    fn test_claim_sized_sell_band_is_inclusive() {
        let rows = vec![
            trade(at(1, 1, 0), PoolActivity::Sell, -13_000.0, 650.0),
            trade(at(1, 2, 0), PoolActivity::Sell, -20_000.0, 1000.0),
            trade(at(1, 3, 0), PoolActivity::Sell, -12_999.0, 640.0),
            trade(at(1, 4, 0), PoolActivity::Sell, -20_001.0, 1001.0),
            // Claim-sized buys do not count.
            trade(at(1, 5, 0), PoolActivity::Buy, 15_000.0, 750.0),
        ];
        let m = aggregate(&rows);
        assert_eq!(m.claim_sell_token_amount, 33_000.0);
        assert_eq!(m.claim_sell_quote_amount, 1650.0);
        assert_eq!(m.sell_count, 4);
    }

    #[test]
    fn test_daily_series_net_flow() {
        let rows = vec![
            trade(at(1, 1, 0), PoolActivity::Buy, 100.0, 30.0),
            trade(at(1, 2, 0), PoolActivity::Sell, -100.0, 50.0),
            trade(at(2, 1, 0), PoolActivity::Buy, 100.0, 70.0),
        ];
        let series = daily_series(&rows, &BoundaryTable::default());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].net_flow, -20.0);
        assert_eq!(series[1].net_flow, 70.0);
        assert_eq!(series[1].sell_quote, 0.0);
    }

    #[test]
    fn test_hourly_candles_track_extremes() {
        // One civil hour: open 1.0, runs up to 1.5, dips to 0.8, closes 1.2.
        let prices = vec![
            PriceRow { at: at(1, 1, 0), price: 1.0 },
            PriceRow { at: at(1, 1, 10), price: 1.5 },
            PriceRow { at: at(1, 1, 20), price: 0.8 },
            PriceRow { at: at(1, 1, 30), price: 1.2 },
        ];
        let candles = hourly_candles(&prices, &BoundaryTable::default());
        assert_eq!(candles.len(), 1);
        // 01:xx UTC is 09:xx civil.
        assert_eq!(candles[0].time, "2025-06-01 09:00");
        assert_eq!(candles[0].ohlc, [1.0, 1.2, 0.8, 1.5]);
    }

    #[test]
    fn test_hourly_candles_split_on_hour_and_sort() {
        let prices = vec![
            PriceRow { at: at(1, 2, 5), price: 2.0 },
            PriceRow { at: at(1, 1, 55), price: 1.0 },
        ];
        let candles = hourly_candles(&prices, &BoundaryTable::default());
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].time, "2025-06-01 09:00");
        assert_eq!(candles[0].ohlc, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(candles[1].time, "2025-06-01 10:00");
    }

    #[test]
    fn test_compare_counts_and_volumes() {
        let current = aggregate(&[trade(at(1, 1, 0), PoolActivity::Buy, 100.0, 30.0)]);
        let previous = aggregate(&[
            trade(at(1, 1, 0), PoolActivity::Buy, 50.0, 10.0),
            trade(at(1, 2, 0), PoolActivity::Buy, 50.0, 10.0),
        ]);
        let c = compare(&current, &previous);
        assert_eq!(c.buy_count.delta_percent, Some(-50.0));
        assert_eq!(c.buy_quote_amount.delta_percent, Some(50.0));
        assert_eq!(c.sell_count.delta_percent, None);
    }

    #[test]
    fn test_comparison_wire_shape() {
        // Buys and sells are tracked in tokens and quote; liquidity legs are
        // count and quote only.
        let current = aggregate(&[trade(at(1, 1, 0), PoolActivity::LiqAdd, 500.0, 25.0)]);
        let json = serde_json::to_value(compare(&current, &PoolMetrics::default())).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "buyCount",
                "buyQuoteAmount",
                "buyTokenAmount",
                "claimSellQuoteAmount",
                "claimSellTokenAmount",
                "liqAddCount",
                "liqAddQuoteAmount",
                "liqRemoveCount",
                "liqRemoveQuoteAmount",
                "sellCount",
                "sellQuoteAmount",
                "sellTokenAmount",
            ]
        );
        assert_eq!(json["liqAddCount"]["current"], 1);
        assert_eq!(json["liqAddQuoteAmount"]["current"], 25.0);
    }
}
