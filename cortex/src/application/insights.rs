// Copyright (c) 2026 CloudShip AI, Inc.
// SPDX-License-Identifier: Apache-2.0
//! Insight extraction.
//!
//! The model's final summary is scanned for signal phrases; each matched
//! rule yields one pre-authored structured insight. Insights are
//! deduplicated by title within a single investigation.

use crate::domain::investigation::{Insight, InsightType, Severity};
use std::collections::HashSet;

struct InsightRule {
    phrases: &'static [&'static str],
    insight_type: InsightType,
    severity: Severity,
    title: &'static str,
    description: &'static str,
    impact: &'static str,
    recommendation: &'static str,
}

const RULES: &[InsightRule] = &[
    InsightRule {
        phrases: &["0.0.0.0/0", "public"],
        insight_type: InsightType::Security,
        severity: Severity::High,
        title: "Publicly accessible resources detected",
        description: "The investigation surfaced resources reachable from the open internet.",
        impact: "Publicly exposed resources widen the attack surface and are a common initial access vector.",
        recommendation: "Restrict ingress rules to known CIDR ranges and front public workloads with a load balancer or WAF.",
    },
    InsightRule {
        phrases: &["unencrypted", "no encryption"],
        insight_type: InsightType::Security,
        severity: Severity::High,
        title: "Unencrypted data at rest",
        description: "Some resources appear to store data without encryption at rest.",
        impact: "Unencrypted storage risks data disclosure if media or snapshots leak.",
        recommendation: "Enable provider-managed or customer-managed key encryption on the affected resources.",
    },
    InsightRule {
        phrases: &["unused", "idle", "stopped", "cost"],
        insight_type: InsightType::Cost,
        severity: Severity::Medium,
        title: "Idle or unused resources",
        description: "Resources that are stopped, idle, or unused continue to accrue charges.",
        impact: "Ongoing spend with no workload benefit.",
        recommendation: "Review the flagged resources and terminate, right-size, or schedule them.",
    },
    InsightRule {
        phrases: &["compliance", "regulation"],
        insight_type: InsightType::Compliance,
        severity: Severity::High,
        title: "Compliance exposure",
        description: "The findings touch controls relevant to a compliance or regulatory framework.",
        impact: "Audit findings and potential regulatory penalties.",
        recommendation: "Map the affected resources to the relevant framework controls and remediate gaps.",
    },
];

/// Scan a summary for signal phrases and emit deduplicated insights.
pub fn extract_insights(summary: &str) -> Vec<Insight> {
    let haystack = summary.to_lowercase();
    let mut seen_titles = HashSet::new();
    let mut insights = Vec::new();

    for rule in RULES {
        let matched = rule
            .phrases
            .iter()
            .any(|phrase| haystack.contains(&phrase.to_lowercase()));
        if matched && seen_titles.insert(rule.title) {
            insights.push(Insight {
                insight_type: rule.insight_type,
                severity: rule.severity,
                title: rule.title.to_string(),
                description: rule.description.to_string(),
                impact: rule.impact.to_string(),
                recommendation: rule.recommendation.to_string(),
                confidence: 0.7,
            });
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_cidr_yields_security_high() {
        let insights =
            extract_insights("Security group sg-1 allows ingress from 0.0.0.0/0 on port 22.");
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].insight_type, InsightType::Security);
        assert_eq!(insights[0].severity, Severity::High);
    }

    #[test]
    fn test_multiple_signal_families() {
        let insights = extract_insights(
            "Two buckets are public and unencrypted; three stopped instances still accrue cost.",
        );
        let titles: Vec<&str> = insights.iter().map(|i| i.title.as_str()).collect();
        assert!(titles.contains(&"Publicly accessible resources detected"));
        assert!(titles.contains(&"Unencrypted data at rest"));
        assert!(titles.contains(&"Idle or unused resources"));
    }

    #[test]
    fn test_dedup_by_title() {
        // Both phrases of the same rule present: one insight, not two.
        let insights = extract_insights("The bucket is public and open to 0.0.0.0/0.");
        assert_eq!(insights.len(), 1);
    }

    #[test]
    fn test_quiet_summary_has_no_insights() {
        let insights = extract_insights("All fourteen instances are healthy and well configured.");
        assert!(insights.is_empty());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let insights = extract_insights("COMPLIANCE review required under the new REGULATION.");
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].insight_type, InsightType::Compliance);
    }
}
