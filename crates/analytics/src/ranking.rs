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

//! Per-entity leaderboards.

use std::collections::HashMap;

use serde::Serialize;

/// Leaderboards are truncated to this many entries.
pub const LEADERBOARD_SIZE: usize = 10;

/// One leaderboard entry. `address` is the display form, `full_address` the
/// untouched identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntity {
    pub address: String,
    pub full_address: String,
    pub total: f64,
    pub tx_count: u64,
}

/// Shortens an identifier to its first and last four characters. Identifiers
/// under eight characters cannot be shortened and come back untouched.
pub fn mask_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() < 8 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Groups `rows` by entity, sums the ranking key and counts rows, then
/// returns the top [`LEADERBOARD_SIZE`] entities by summed key, descending.
///
/// The sort is stable over first appearance, so ties keep their original
/// relative order regardless of how the aggregation interleaved them.
pub fn rank_entities<R>(
    rows: &[R],
    entity: impl Fn(&R) -> &str,
    key: impl Fn(&R) -> f64,
) -> Vec<RankedEntity> {
    let mut order: Vec<(String, f64, u64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let addr = entity(row);
        let slot = match index.get(addr) {
            Some(&i) => i,
            None => {
                order.push((addr.to_string(), 0.0, 0));
                index.insert(addr.to_string(), order.len() - 1);
                order.len() - 1
            }
        };
        order[slot].1 += key(row);
        order[slot].2 += 1;
    }

    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    order.truncate(LEADERBOARD_SIZE);

    order
        .into_iter()
        .map(|(full_address, total, tx_count)| RankedEntity {
            address: mask_address(&full_address),
            full_address,
            total,
            tx_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    fn rows(entries: &[(&str, f64)]) -> Vec<(String, f64)> {
        entries.iter().map(|(a, v)| (a.to_string(), *v)).collect()
    }

    fn rank(entries: &[(&str, f64)]) -> Vec<RankedEntity> {
        let rows = rows(entries);
        rank_entities(&rows, |r| &r.0, |r| r.1)
    }

    #[test]
    fn test_mask_address() {
        assert_eq!(mask_address("GahXheDNXWrtYd6m3TRwSoLou1z33fROG1"), "GahX...ROG1");
        assert_eq!(mask_address("12345678"), "1234...5678");
    }

    #[test]
    fn test_mask_short_identifier_untouched() {
        assert_eq!(mask_address("1234567"), "1234567");
        assert_eq!(mask_address("ab"), "ab");
        assert_eq!(mask_address(""), "");
    }

    #[test]
    fn test_rank_sums_and_counts() {
        let top = rank(&[("alice001", 10.0), ("bob00002", 5.0), ("alice001", 7.0)]);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].full_address, "alice001");
        assert_eq!(top[0].total, 17.0);
        assert_eq!(top[0].tx_count, 2);
        assert_eq!(top[0].address, "alic...e001");
        assert_eq!(top[1].total, 5.0);
    }

    #[test]
    fn test_rank_truncates_to_limit() {
        let entries: Vec<(String, f64)> =
            (0..25).map(|i| (format!("address{i:03}"), i as f64)).collect();
        let top = rank_entities(&entries, |r| &r.0, |r| r.1);
        assert_eq!(top.len(), LEADERBOARD_SIZE);
        assert_eq!(top[0].total, 24.0);
        assert_eq!(top[9].total, 15.0);
    }

    #[test]
    fn test_rank_descending() {
        let top = rank(&[("low00001", 1.0), ("high0001", 9.0), ("mid00001", 4.0)]);
        let totals: Vec<f64> = top.iter().map(|e| e.total).collect();
        assert_eq!(totals, vec![9.0, 4.0, 1.0]);
    }

    #[test]
    fn test_ties_keep_first_appearance_order() {
        let top = rank(&[("first001", 5.0), ("second01", 5.0), ("third001", 5.0)]);
        let names: Vec<&str> = top.iter().map(|e| e.full_address.as_str()).collect();
        assert_eq!(names, vec!["first001", "second01", "third001"]);
    }

    #[test]
    fn test_tie_order_survives_row_shuffle() {
        // Interleaving the rows must not change who appears first once
        // per-entity totals tie; only the first row of each entity counts.
        let base = vec![
            ("first001".to_string(), 2.0),
            ("second01".to_string(), 3.0),
            ("first001".to_string(), 4.0),
            ("second01".to_string(), 3.0),
        ];
        let mut tail = base[2..].to_vec();
        let mut rng = rand::thread_rng();
        for _ in 0..10 {
            tail.shuffle(&mut rng);
            let mut rows = base[..2].to_vec();
            rows.extend(tail.iter().cloned());
            let top = rank_entities(&rows, |r| &r.0, |r| r.1);
            assert_eq!(top[0].full_address, "first001");
            assert_eq!(top[1].full_address, "second01");
        }
    }

    #[test]
    fn test_empty_rows_empty_board() {
        let top = rank(&[]);
        assert!(top.is_empty());
    }
}
