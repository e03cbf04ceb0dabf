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

//! Per-day anomaly rules.
//!
//! Every address active on a given business day is screened against a small,
//! source-specific rule set. Claims carry the interesting rules: the game
//! grants three lucky draws per day, so both overshooting and undershooting
//! that allowance is suspicious, as is claim volume past the daily limit.
//! POS and staking only check for duplicate payouts.
//!
//! The rule set is versioned. V1 evaluates every rule independently, so one
//! address can collect several findings on one day. V2 stops screening an
//! address as soon as a high-severity rule matches, leaving exactly one
//! headline finding for the worst offenders.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::classify::{classify_claim, ClaimTier};
use crate::rows::{ClaimRow, PosRow, StakingRewardRow};

/// Lucky draws granted per address per day.
pub const DAILY_DRAW_ALLOWANCE: u64 = 3;
/// Normal claims allowed per address per day.
pub const DAILY_CLAIM_LIMIT: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    DrawCountExceeded,
    DrawCountShort,
    ClaimCountExceeded,
    ClaimDrawMismatch,
    PosDuplicateReward,
    StakingDuplicateReward,
}

/// One flagged (address, day) observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub date: NaiveDate,
    pub address: String,
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub description: String,
    pub severity: Severity,
    /// Raw counts the rule fired on.
    #[serde(rename = "data")]
    pub evidence: serde_json::Value,
}

/// Which revision of the rule set to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetVersion {
    /// Original behavior: each rule branch evaluated independently.
    V1,
    /// A high-severity match ends screening for that address that day.
    #[default]
    V2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalySummary {
    pub total_count: u64,
    pub high_risk_count: u64,
    pub medium_risk_count: u64,
    pub low_risk_count: u64,
}

/// Screens one business day of claim rows.
///
/// Referral rows count toward neither figure but still put their address in
/// front of the rules, so a referral-only address reads as zero draws.
pub fn claim_findings(date: NaiveDate, rows: &[ClaimRow], version: RuleSetVersion) -> Vec<Finding> {
    // (normal claims, lucky draws) per address, in address order.
    let mut per_address: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for row in rows {
        let counts = per_address.entry(row.address.as_str()).or_insert((0, 0));
        match classify_claim(row.amount) {
            ClaimTier::Normal => counts.0 += 1,
            ClaimTier::LuckyDraw => counts.1 += 1,
            ClaimTier::Tier1Referral | ClaimTier::Tier2Referral => {}
        }
    }

    let mut findings = Vec::new();
    for (address, (claims, draws)) in per_address {
        let evidence = json!({ "luckyDraws": draws, "claims": claims });
        let mut high_fired = false;

        if draws > DAILY_DRAW_ALLOWANCE {
            findings.push(Finding {
                date,
                address: address.to_string(),
                kind: FindingKind::DrawCountExceeded,
                description: format!(
                    "{draws} lucky draws in one day, above the allowance of {DAILY_DRAW_ALLOWANCE}"
                ),
                severity: Severity::High,
                evidence: evidence.clone(),
            });
            high_fired = true;
        } else if draws < DAILY_DRAW_ALLOWANCE {
            findings.push(Finding {
                date,
                address: address.to_string(),
                kind: FindingKind::DrawCountShort,
                description: format!(
                    "only {draws} lucky draws in one day, below the expected {DAILY_DRAW_ALLOWANCE}"
                ),
                severity: Severity::Medium,
                evidence: evidence.clone(),
            });
        }

        if version == RuleSetVersion::V2 && high_fired {
            continue;
        }

        if claims > DAILY_CLAIM_LIMIT {
            findings.push(Finding {
                date,
                address: address.to_string(),
                kind: FindingKind::ClaimCountExceeded,
                description: format!(
                    "{claims} normal claims in one day, above the limit of {DAILY_CLAIM_LIMIT}"
                ),
                severity: Severity::Medium,
                evidence,
            });
        } else if draws == DAILY_DRAW_ALLOWANCE && claims < DAILY_CLAIM_LIMIT {
            findings.push(Finding {
                date,
                address: address.to_string(),
                kind: FindingKind::ClaimDrawMismatch,
                description: format!(
                    "full draw allowance used with only {claims} normal claims"
                ),
                severity: Severity::Medium,
                evidence,
            });
        }
    }
    findings
}

/// Flags addresses paid more than one POS reward on one business day.
pub fn pos_findings(date: NaiveDate, rows: &[PosRow]) -> Vec<Finding> {
    duplicate_findings(
        date,
        rows.iter().map(|r| r.address.as_str()),
        FindingKind::PosDuplicateReward,
        "POS rewards paid to one address in one day",
    )
}

/// Flags addresses paid more than one staking reward on one business day.
pub fn staking_reward_findings(date: NaiveDate, rows: &[StakingRewardRow]) -> Vec<Finding> {
    duplicate_findings(
        date,
        rows.iter().map(|r| r.address.as_str()),
        FindingKind::StakingDuplicateReward,
        "staking rewards paid to one address in one day",
    )
}

fn duplicate_findings<'a>(
    date: NaiveDate,
    addresses: impl Iterator<Item = &'a str>,
    kind: FindingKind,
    what: &str,
) -> Vec<Finding> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for address in addresses {
        *counts.entry(address).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(address, count)| Finding {
            date,
            address: address.to_string(),
            kind,
            description: format!("{count} {what}"),
            severity: Severity::Medium,
            evidence: json!({ "count": count }),
        })
        .collect()
}

pub fn summarize(findings: &[Finding]) -> AnomalySummary {
    let mut summary = AnomalySummary { total_count: findings.len() as u64, ..Default::default() };
    for finding in findings {
        match finding.severity {
            Severity::High => summary.high_risk_count += 1,
            Severity::Medium => summary.medium_risk_count += 1,
            Severity::Low => summary.low_risk_count += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    fn claims_for(address: &str, normal: usize, draws: usize) -> Vec<ClaimRow> {
        let mut rows = Vec::new();
        for i in 0..normal {
            rows.push(ClaimRow {
                address: address.to_string(),
                at: at(1, i as u32 % 60),
                amount: 500.0,
                revenue: 0.0,
            });
        }
        for i in 0..draws {
            rows.push(ClaimRow {
                address: address.to_string(),
                at: at(2, i as u32 % 60),
                amount: 1234.0 + i as f64,
                revenue: 0.0,
            });
        }
        rows
    }

    #[test]
    fn test_excess_draws_yield_one_high_finding() {
        // Four draws and fifteen claims: the draw overshoot is the headline
        // and nothing else fires under the default rule set.
        let rows = claims_for("cheater1", 15, 4);
        let findings = claim_findings(day(), &rows, RuleSetVersion::default());

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::DrawCountExceeded);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].evidence["luckyDraws"], 4);
        assert_eq!(findings[0].evidence["claims"], 15);
    }

    #[test]
    fn test_v2_short_circuits_after_high_where_v1_does_not() {
        // Five draws and 25 claims trip both branches under V1.
        let rows = claims_for("cheater1", 25, 5);

        let v1 = claim_findings(day(), &rows, RuleSetVersion::V1);
        assert_eq!(v1.len(), 2);
        assert_eq!(v1[0].kind, FindingKind::DrawCountExceeded);
        assert_eq!(v1[1].kind, FindingKind::ClaimCountExceeded);

        let v2 = claim_findings(day(), &rows, RuleSetVersion::V2);
        assert_eq!(v2.len(), 1);
        assert_eq!(v2[0].kind, FindingKind::DrawCountExceeded);
    }

    #[test]
    fn test_quiet_address_produces_nothing() {
        // Exactly the allowance and exactly the claim limit is clean.
        let rows = claims_for("honest01", 20, 3);
        assert!(claim_findings(day(), &rows, RuleSetVersion::V2).is_empty());
    }

    #[test]
    fn test_short_draws_flagged_medium() {
        let rows = claims_for("lowkey01", 5, 1);
        let findings = claim_findings(day(), &rows, RuleSetVersion::V2);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::DrawCountShort);
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn test_mismatch_when_allowance_spent_on_few_claims() {
        let rows = claims_for("gamer001", 4, 3);
        let findings = claim_findings(day(), &rows, RuleSetVersion::V2);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::ClaimDrawMismatch);
    }

    #[test]
    fn test_medium_findings_do_not_short_circuit() {
        // Short on draws and over the claim limit: two medium findings even
        // under V2.
        let rows = claims_for("grinder1", 25, 0);
        let findings = claim_findings(day(), &rows, RuleSetVersion::V2);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].kind, FindingKind::DrawCountShort);
        assert_eq!(findings[1].kind, FindingKind::ClaimCountExceeded);
    }

    #[test]
    fn test_referral_only_address_reads_as_zero_draws() {
        let rows = vec![ClaimRow {
            address: "referee1".to_string(),
            at: at(3, 0),
            amount: 50.0,
            revenue: 0.0,
        }];
        let findings = claim_findings(day(), &rows, RuleSetVersion::V2);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::DrawCountShort);
        assert_eq!(findings[0].evidence["luckyDraws"], 0);
    }

    #[test]
    fn test_findings_ordered_by_address() {
        let mut rows = claims_for("zed00001", 1, 0);
        rows.extend(claims_for("abel0001", 1, 0));
        let findings = claim_findings(day(), &rows, RuleSetVersion::V2);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].address, "abel0001");
        assert_eq!(findings[1].address, "zed00001");
    }

    #[test]
    fn test_pos_duplicates() {
        let rows = vec![
            PosRow { address: "dup00001".into(), at: at(1, 0), amount: 1.0, revenue: 0.0 },
            PosRow { address: "dup00001".into(), at: at(2, 0), amount: 1.0, revenue: 0.0 },
            PosRow { address: "single01".into(), at: at(3, 0), amount: 1.0, revenue: 0.0 },
        ];
        let findings = pos_findings(day(), &rows);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::PosDuplicateReward);
        assert_eq!(findings[0].evidence["count"], 2);
    }

    #[test]
    fn test_staking_duplicates() {
        let rows = vec![
            StakingRewardRow { address: "dup00001".into(), at: at(1, 0), amount: 1.0, revenue: 0.0 },
            StakingRewardRow { address: "dup00001".into(), at: at(2, 0), amount: 1.0, revenue: 0.0 },
            StakingRewardRow { address: "dup00001".into(), at: at(3, 0), amount: 1.0, revenue: 0.0 },
        ];
        let findings = staking_reward_findings(day(), &rows);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::StakingDuplicateReward);
        assert_eq!(findings[0].evidence["count"], 3);
    }

    #[test]
    fn test_summary_counts_by_severity() {
        let mut findings = claim_findings(day(), &claims_for("cheater1", 25, 5), RuleSetVersion::V1);
        findings.extend(claim_findings(day(), &claims_for("lowkey01", 1, 0), RuleSetVersion::V1));

        let summary = summarize(&findings);
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.high_risk_count, 1);
        assert_eq!(summary.medium_risk_count, 2);
        assert_eq!(summary.low_risk_count, 0);
    }

    #[test]
    fn test_finding_wire_shape() {
        let findings = claim_findings(day(), &claims_for("cheater1", 0, 9), RuleSetVersion::V2);
        let json = serde_json::to_value(&findings[0]).unwrap();
        assert_eq!(json["type"], "DRAW_COUNT_EXCEEDED");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["date"], "2025-06-01");
        assert_eq!(json["data"]["luckyDraws"], 9);
    }
}
