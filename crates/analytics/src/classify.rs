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

//! Claim tier classification.
//!
//! A claim's tier is a pure function of the token amount it paid out. The
//! fixed payout schedule makes the amounts exact: 500/1500 are normal claims,
//! 50/150 tier-1 referral bonuses, 25/75 tier-2 referral bonuses, and
//! anything else is a lucky draw.

use crate::rows::ClaimRow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimTier {
    Normal,
    Tier1Referral,
    Tier2Referral,
    LuckyDraw,
}

/// Classifies a claim by its payout amount.
pub fn classify_claim(amount: f64) -> ClaimTier {
    if amount == 500.0 || amount == 1500.0 {
        ClaimTier::Normal
    } else if amount == 50.0 || amount == 150.0 {
        ClaimTier::Tier1Referral
    } else if amount == 25.0 || amount == 75.0 {
        ClaimTier::Tier2Referral
    } else {
        ClaimTier::LuckyDraw
    }
}

/// The containment split of normal claims.
///
/// Each tier-2 referral implies a tier-1 referral, and each tier-1 referral
/// implies a normal claim, so the raw tier counts are peeled off the normal
/// total: `tier2 + tier1 + base == normal claim count` for any input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TierBreakdown {
    pub base_claims: i64,
    pub tier1_referrals: i64,
    pub tier2_referrals: i64,
}

pub fn tier_breakdown(rows: &[ClaimRow]) -> TierBreakdown {
    let mut normal = 0i64;
    let mut tier1 = 0i64;
    let mut tier2 = 0i64;
    for row in rows {
        match classify_claim(row.amount) {
            ClaimTier::Normal => normal += 1,
            ClaimTier::Tier1Referral => tier1 += 1,
            ClaimTier::Tier2Referral => tier2 += 1,
            ClaimTier::LuckyDraw => {}
        }
    }

    let tier2_referrals = tier2;
    let tier1_referrals = tier1 - tier2_referrals;
    let base_claims = normal - tier1_referrals - tier2_referrals;

    TierBreakdown { base_claims, tier1_referrals, tier2_referrals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn claim(amount: f64) -> ClaimRow {
        ClaimRow {
            address: "addr".to_string(),
            at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            amount,
            revenue: 0.0,
        }
    }

    #[test]
    fn test_classify_known_amounts() {
        assert_eq!(classify_claim(500.0), ClaimTier::Normal);
        assert_eq!(classify_claim(1500.0), ClaimTier::Normal);
        assert_eq!(classify_claim(50.0), ClaimTier::Tier1Referral);
        assert_eq!(classify_claim(150.0), ClaimTier::Tier1Referral);
        assert_eq!(classify_claim(25.0), ClaimTier::Tier2Referral);
        assert_eq!(classify_claim(75.0), ClaimTier::Tier2Referral);
    }

    #[test]
    fn test_classify_everything_else_is_a_draw() {
        for amount in [0.0, 1.0, 100.0, 499.0, 501.0, 13_337.0, 2_000_000.0] {
            assert_eq!(classify_claim(amount), ClaimTier::LuckyDraw, "{amount}");
        }
    }

    #[test]
    fn test_breakdown_peels_referrals_off_normals() {
        // 5 normals, 3 tier-1 rows, 1 tier-2 row.
        let rows: Vec<ClaimRow> = [500.0, 500.0, 1500.0, 500.0, 500.0, 50.0, 150.0, 50.0, 25.0]
            .iter()
            .map(|&a| claim(a))
            .collect();
        let b = tier_breakdown(&rows);
        assert_eq!(b.tier2_referrals, 1);
        assert_eq!(b.tier1_referrals, 2);
        assert_eq!(b.base_claims, 2);
    }

    #[test]
    fn test_breakdown_ignores_draws() {
        let rows: Vec<ClaimRow> = [500.0, 777.0, 13_000.0].iter().map(|&a| claim(a)).collect();
        let b = tier_breakdown(&rows);
        assert_eq!(b, TierBreakdown { base_claims: 1, tier1_referrals: 0, tier2_referrals: 0 });
    }

    #[test]
    fn test_breakdown_empty() {
        assert_eq!(tier_breakdown(&[]), TierBreakdown::default());
    }

    proptest! {
        #[test]
        fn prop_breakdown_sums_to_normal_count(
            amounts in prop::collection::vec(
                prop_oneof![
                    Just(500.0f64), Just(1500.0), Just(50.0), Just(150.0),
                    Just(25.0), Just(75.0), 0.0f64..10_000.0,
                ],
                0..200,
            )
        ) {
            let rows: Vec<ClaimRow> = amounts.iter().map(|&a| claim(a)).collect();
            let normal = rows
                .iter()
                .filter(|r| classify_claim(r.amount) == ClaimTier::Normal)
                .count() as i64;
            let b = tier_breakdown(&rows);
            prop_assert_eq!(b.base_claims + b.tier1_referrals + b.tier2_referrals, normal);
        }
    }
}
