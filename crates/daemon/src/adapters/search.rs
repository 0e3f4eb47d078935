// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Code search via ripgrep. The pattern goes to rg as a literal argv
//! element, never through a shell.

use crate::adapters::subprocess::run_with_timeout;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

const RG_TIMEOUT: Duration = Duration::from_secs(30);

/// One match line from ripgrep.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub file: String,
    pub line: u64,
    pub text: String,
}

/// Run `rg` over a directory; returns at most `limit` matches.
pub async fn search_code(
    pattern: &str,
    dir: &Path,
    limit: u32,
) -> Result<Vec<SearchMatch>, String> {
    if !dir.is_dir() {
        return Err(format!("search path does not exist: {}", dir.display()));
    }
    let limit = if limit == 0 { 50 } else { limit };

    let mut cmd = Command::new("rg");
    cmd.args([
        "--line-number",
        "--no-heading",
        "--color",
        "never",
        "--max-count",
        "10",
        "--",
        pattern,
    ])
    .arg(dir)
    .current_dir(dir);

    let output = run_with_timeout(cmd, RG_TIMEOUT, "rg")
        .await
        .map_err(|e| format!("ripgrep not available: {e}"))?;

    // rg exits 1 on "no matches", which is not an error here
    if output.exit_code > 1 || output.timed_out {
        return Err(format!("code search failed: {}", output.stderr.trim()));
    }

    let mut matches = Vec::new();
    for line in output.stdout.lines().take(limit as usize) {
        // <file>:<line>:<text>
        let mut parts = line.splitn(3, ':');
        let (Some(file), Some(line_no), Some(text)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        let Ok(line_no) = line_no.parse::<u64>() else {
            continue;
        };
        matches.push(SearchMatch {
            file: file.to_string(),
            line: line_no,
            text: text.to_string(),
        });
    }
    Ok(matches)
}
