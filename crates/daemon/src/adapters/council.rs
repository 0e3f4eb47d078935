// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Council orchestration: fan a prompt out to configured reviewer
//! commands and fold their verdicts by majority.
//!
//! Only the orchestration contract lives here; prompt construction and
//! the reviewer programs themselves are external. Results are cached by
//! prompt digest so repeated consultations are free.

use agentctl_core::config::{CouncilConfig, CouncilReviewer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

const DEFAULT_REVIEWER_TIMEOUT: Duration = Duration::from_secs(120);

/// One reviewer's opinion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilOpinion {
    pub reviewer: String,
    pub approve: bool,
    pub summary: String,
}

/// A cached consultation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilRecord {
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub verdict: String,
    pub opinions: Vec<CouncilOpinion>,
    pub timestamp: String,
}

/// Digest used as the cache key for a prompt.
pub fn prompt_digest(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
pub trait CouncilAdapter: Send + Sync {
    /// Consult every configured reviewer; missing reviewers yield an
    /// empty opinion list, which callers surface as "council not
    /// configured".
    async fn consult(&self, prompt: &str) -> Vec<CouncilOpinion>;
}

/// Subprocess-backed council: each reviewer is an argv command receiving
/// the prompt on stdin.
pub struct SubprocessCouncilAdapter {
    reviewers: Vec<CouncilReviewer>,
    timeout: Duration,
}

impl SubprocessCouncilAdapter {
    pub fn new(config: Option<CouncilConfig>) -> Self {
        let config = config.unwrap_or_default();
        Self {
            timeout: config
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_REVIEWER_TIMEOUT),
            reviewers: config.reviewers,
        }
    }
}

#[async_trait]
impl CouncilAdapter for SubprocessCouncilAdapter {
    async fn consult(&self, prompt: &str) -> Vec<CouncilOpinion> {
        let mut tasks = Vec::new();
        for reviewer in &self.reviewers {
            let Some((program, args)) = reviewer
                .command
                .split_first()
                .map(|(p, rest)| (p.clone(), rest.to_vec()))
            else {
                warn!(reviewer = %reviewer.name, "council reviewer has empty command");
                continue;
            };
            let name = reviewer.name.clone();
            let prompt = prompt.to_string();
            let timeout = self.timeout;
            tasks.push(tokio::spawn(async move {
                run_reviewer(name, program, args, prompt, timeout).await
            }));
        }

        let mut opinions = Vec::new();
        for task in tasks {
            match task.await {
                Ok(opinion) => opinions.push(opinion),
                Err(e) => warn!(error = %e, "council reviewer task failed"),
            }
        }
        opinions
    }
}

async fn run_reviewer(
    name: String,
    program: String,
    args: Vec<String>,
    prompt: String,
    timeout: Duration,
) -> CouncilOpinion {
    use std::process::Stdio;
    use tokio::io::AsyncWriteExt;

    let mut cmd = Command::new(&program);
    cmd.args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return CouncilOpinion {
                reviewer: name,
                approve: false,
                summary: format!("reviewer unavailable: {e}"),
            }
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(prompt.as_bytes()).await;
        // Dropping stdin closes the pipe so the reviewer sees EOF
    }

    let waited = tokio::time::timeout(timeout, child.wait_with_output()).await;
    match waited {
        Ok(Ok(output)) => {
            let text = String::from_utf8_lossy(&output.stdout);
            let text = text.trim();
            // Contract: reviewers print a verdict line first
            let first = text.lines().next().unwrap_or("").to_ascii_lowercase();
            CouncilOpinion {
                reviewer: name,
                approve: output.status.success() && !first.contains("reject"),
                summary: text.chars().take(500).collect(),
            }
        }
        Ok(Err(e)) => CouncilOpinion {
            reviewer: name,
            approve: false,
            summary: format!("reviewer failed: {e}"),
        },
        Err(_) => CouncilOpinion {
            reviewer: name,
            approve: false,
            summary: format!("reviewer timed out after {}s", timeout.as_secs()),
        },
    }
}

/// Majority verdict over opinions ("accepted" / "rejected").
pub fn majority_verdict(opinions: &[CouncilOpinion]) -> &'static str {
    let approvals = opinions.iter().filter(|o| o.approve).count();
    if approvals * 2 > opinions.len() {
        "accepted"
    } else {
        "rejected"
    }
}

#[cfg(test)]
#[path = "council_tests.rs"]
mod tests;
