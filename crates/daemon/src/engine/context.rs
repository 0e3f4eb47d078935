// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project context collection for handoffs.
//!
//! Gathers git branch, recent commits, changed files and a diffstat from
//! the project directory, truncated to 50 KiB. Best-effort: any failure
//! yields `None` and the handoff proceeds without context.

use crate::adapters::subprocess::run_with_timeout;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Cap on collected context (50 KiB).
pub const MAX_CONTEXT_BYTES: usize = 50 * 1024;

const GIT_CONTEXT_TIMEOUT: Duration = Duration::from_secs(10);

/// Collect project context from a git checkout.
pub async fn collect_project_context(project_dir: &Path) -> Option<String> {
    if !project_dir.is_dir() {
        return None;
    }

    let branch = git(project_dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await?;
    let commits = git(project_dir, &["log", "--oneline", "-5"])
        .await
        .unwrap_or_default();
    let changed = git(project_dir, &["status", "--short"])
        .await
        .unwrap_or_default();
    let diffstat = git(project_dir, &["diff", "--stat"])
        .await
        .unwrap_or_default();

    let mut context = format!(
        "branch: {}\n\nrecent commits:\n{}\n\nchanged files:\n{}\n\ndiff:\n{}",
        branch.trim(),
        commits.trim_end(),
        changed.trim_end(),
        diffstat.trim_end()
    );
    truncate_to(&mut context, MAX_CONTEXT_BYTES);
    Some(context)
}

async fn git(dir: &Path, args: &[&str]) -> Option<String> {
    let mut cmd = Command::new("git");
    cmd.arg("-C")
        .arg(dir)
        .args(args)
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE");
    let output = run_with_timeout(cmd, GIT_CONTEXT_TIMEOUT, "git context").await.ok()?;
    if !output.passed() {
        return None;
    }
    Some(output.stdout)
}

/// Truncate on a char boundary at or below `max` bytes.
fn truncate_to(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("\n[truncated]");
}

#[cfg(test)]
mod tests {
    use super::truncate_to;

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut text = "héllo wörld".repeat(100);
        truncate_to(&mut text, 64);
        assert!(text.len() <= 64 + "\n[truncated]".len());
        assert!(text.ends_with("[truncated]"));
    }

    #[test]
    fn short_text_untouched() {
        let mut text = "short".to_string();
        truncate_to(&mut text, 64);
        assert_eq!(text, "short");
    }
}
