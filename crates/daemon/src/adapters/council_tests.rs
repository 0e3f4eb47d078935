// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn opinion(reviewer: &str, approve: bool) -> CouncilOpinion {
    CouncilOpinion {
        reviewer: reviewer.to_string(),
        approve,
        summary: String::new(),
    }
}

#[test]
fn majority_requires_strict_majority() {
    assert_eq!(majority_verdict(&[opinion("a", true), opinion("b", true), opinion("c", false)]), "accepted");
    assert_eq!(majority_verdict(&[opinion("a", true), opinion("b", false)]), "rejected");
    assert_eq!(majority_verdict(&[]), "rejected");
}

#[test]
fn digest_is_stable_and_hex() {
    let a = prompt_digest("review this diff");
    let b = prompt_digest("review this diff");
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(prompt_digest("other"), a);
}

#[tokio::test]
async fn reviewer_reads_prompt_from_stdin() {
    let adapter = SubprocessCouncilAdapter::new(Some(CouncilConfig {
        reviewers: vec![CouncilReviewer {
            name: "cat".to_string(),
            command: vec!["cat".to_string()],
        }],
        timeout_ms: Some(5_000),
        extra: Default::default(),
    }));

    let opinions = adapter.consult("approve: looks good").await;
    assert_eq!(opinions.len(), 1);
    assert!(opinions[0].approve);
    assert!(opinions[0].summary.contains("looks good"));
}

#[tokio::test]
async fn rejecting_first_line_counts_as_rejection() {
    let adapter = SubprocessCouncilAdapter::new(Some(CouncilConfig {
        reviewers: vec![CouncilReviewer {
            name: "echo".to_string(),
            command: vec!["echo".to_string(), "REJECT: too risky".to_string()],
        }],
        timeout_ms: Some(5_000),
        extra: Default::default(),
    }));

    let opinions = adapter.consult("anything").await;
    assert_eq!(opinions.len(), 1);
    assert!(!opinions[0].approve);
}

#[tokio::test]
async fn unconfigured_council_yields_no_opinions() {
    let adapter = SubprocessCouncilAdapter::new(None);
    assert!(adapter.consult("anything").await.is_empty());
}
