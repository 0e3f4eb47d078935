// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow DAG executor.
//!
//! Definitions are YAML files under `<baseDir>/workflows/`; each is a
//! set of named steps with `needs` edges. Execution is topological and
//! fail-fast: a failing step marks its dependents skipped. Params are
//! exported to step commands as `AGENTCTL_PARAM_<KEY>` environment
//! variables, never interpolated into the command line.

use crate::adapters::subprocess::{run_with_timeout, split_argv};
use crate::engine::{HandlerError, HandlerResult};
use crate::lifecycle::HubState;
use agentctl_core::activity::{ActivityKind, NewActivity};
use agentctl_core::id::IdGen;
use agentctl_storage::{StepRecord, WorkflowRun};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// One step of a workflow definition.
#[derive(Debug, Clone, Deserialize)]
pub struct StepDef {
    pub name: String,
    pub run: String,
    #[serde(default)]
    pub needs: Vec<String>,
    #[serde(default)]
    pub timeout_minutes: Option<u64>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// A workflow definition loaded from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub steps: Vec<StepDef>,
}

/// Load every definition in the workflows directory.
pub fn load_definitions(dir: &Path) -> Vec<WorkflowDef> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut defs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yaml" || e == "yml");
        if !is_yaml {
            continue;
        }
        match std::fs::read_to_string(&path).map_err(|e| e.to_string()).and_then(|raw| {
            serde_yaml::from_str::<WorkflowDef>(&raw).map_err(|e| e.to_string())
        }) {
            Ok(def) => defs.push(def),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable workflow"),
        }
    }
    defs.sort_by(|a, b| a.name.cmp(&b.name));
    defs
}

pub fn load_definition(dir: &Path, name: &str) -> Option<WorkflowDef> {
    load_definitions(dir).into_iter().find(|d| d.name == name)
}

/// Topological order of step indices; errors on unknown `needs` or cycles.
pub fn topo_order(def: &WorkflowDef) -> Result<Vec<usize>, String> {
    let index: HashMap<&str, usize> = def
        .steps
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), i))
        .collect();
    if index.len() != def.steps.len() {
        return Err("duplicate step names".to_string());
    }

    let mut in_degree = vec![0usize; def.steps.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); def.steps.len()];
    for (i, step) in def.steps.iter().enumerate() {
        for need in &step.needs {
            let Some(&dep) = index.get(need.as_str()) else {
                return Err(format!("step '{}' needs unknown step '{need}'", step.name));
            };
            in_degree[i] += 1;
            dependents[dep].push(i);
        }
    }

    let mut ready: Vec<usize> = (0..def.steps.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(def.steps.len());
    while let Some(next) = ready.pop() {
        order.push(next);
        for &dependent in &dependents[next] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.push(dependent);
            }
        }
    }
    if order.len() != def.steps.len() {
        return Err("workflow has a dependency cycle".to_string());
    }
    Ok(order)
}

/// `workflow_trigger`: validate, persist the run, spawn the executor.
pub fn trigger(
    state: &Arc<HubState>,
    caller: &str,
    name: &str,
    params: serde_json::Map<String, Value>,
) -> HandlerResult {
    let Some(def) = load_definition(&state.paths.workflows_dir, name) else {
        return Err(HandlerError::not_found(format!("workflow {name}")));
    };
    let order = topo_order(&def).map_err(HandlerError::msg)?;

    let run_id = state.ids.next();
    let run = WorkflowRun {
        id: run_id.clone(),
        workflow: def.name.clone(),
        status: "running".to_string(),
        triggered_by: caller.to_string(),
        params: params.clone(),
        started_at: state.now(),
        finished_at: None,
        error: None,
        steps: def
            .steps
            .iter()
            .map(|s| StepRecord {
                name: s.name.clone(),
                status: "pending".to_string(),
                detail: None,
                exit_code: None,
                duration_ms: None,
            })
            .collect(),
    };
    state.stores.workflows.insert(&run)?;

    let cancel = CancellationToken::new();
    state
        .workflow_cancels
        .lock()
        .insert(run_id.clone(), cancel.clone());

    state.record_activity(
        NewActivity::new(ActivityKind::WorkflowStarted, caller)
            .workflow_run(run_id.clone())
            .meta("workflow", json!(def.name)),
    );

    let state_for_run = Arc::clone(state);
    let run_for_exec = run;
    tokio::spawn(async move {
        execute(state_for_run, def, order, run_for_exec, cancel).await;
    });

    Ok(json!({"runId": run_id, "workflow": name, "status": "running"}))
}

/// `workflow_cancel`: flip the token; the executor records the final state.
pub fn cancel(state: &Arc<HubState>, run_id: &str) -> HandlerResult {
    let token = state.workflow_cancels.lock().get(run_id).cloned();
    match token {
        Some(token) => {
            token.cancel();
            Ok(json!({"runId": run_id, "cancelled": true}))
        }
        None => match state.stores.workflows.get(run_id)? {
            Some(run) => Ok(json!({"runId": run_id, "cancelled": false, "status": run.status})),
            None => Err(HandlerError::not_found(format!("workflow run {run_id}"))),
        },
    }
}

async fn execute(
    state: Arc<HubState>,
    def: WorkflowDef,
    order: Vec<usize>,
    mut run: WorkflowRun,
    cancel: CancellationToken,
) {
    let mut failed_steps: HashSet<String> = HashSet::new();
    let mut cancelled = false;

    for step_index in order {
        let step = &def.steps[step_index];

        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        // Fail-fast: skip steps whose dependencies did not complete
        if step.needs.iter().any(|n| failed_steps.contains(n)) {
            run.steps[step_index].status = "skipped".to_string();
            run.steps[step_index].detail = Some("dependency failed".to_string());
            failed_steps.insert(step.name.clone());
            persist(&state, &run);
            continue;
        }

        let Some((program, args)) = split_argv(&step.run) else {
            run.steps[step_index].status = "failed".to_string();
            run.steps[step_index].detail = Some("empty command".to_string());
            failed_steps.insert(step.name.clone());
            persist(&state, &run);
            continue;
        };

        run.steps[step_index].status = "running".to_string();
        persist(&state, &run);

        let timeout = step
            .timeout_minutes
            .map(|m| Duration::from_secs(m * 60))
            .unwrap_or(DEFAULT_STEP_TIMEOUT);
        let mut cmd = Command::new(&program);
        cmd.args(&args);
        if let Some(dir) = &step.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &run.params {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            cmd.env(format!("AGENTCTL_PARAM_{}", key.to_uppercase()), value);
        }

        let outcome = tokio::select! {
            outcome = run_with_timeout(cmd, timeout, &step.name) => Some(outcome),
            () = cancel.cancelled() => None,
        };
        let Some(outcome) = outcome else {
            run.steps[step_index].status = "skipped".to_string();
            run.steps[step_index].detail = Some("run cancelled".to_string());
            cancelled = true;
            persist(&state, &run);
            break;
        };

        match outcome {
            Ok(output) => {
                let record = &mut run.steps[step_index];
                record.exit_code = Some(output.exit_code);
                record.duration_ms = Some(output.duration.as_millis() as u64);
                if output.passed() {
                    record.status = "completed".to_string();
                } else {
                    record.status = "failed".to_string();
                    record.detail = Some(
                        output
                            .stderr
                            .lines()
                            .next()
                            .unwrap_or("command failed")
                            .to_string(),
                    );
                    failed_steps.insert(step.name.clone());
                }
            }
            Err(e) => {
                run.steps[step_index].status = "failed".to_string();
                run.steps[step_index].detail = Some(format!("spawn failed: {e}"));
                failed_steps.insert(step.name.clone());
            }
        }
        persist(&state, &run);
    }

    run.finished_at = Some(state.now());
    run.status = if cancelled {
        "cancelled".to_string()
    } else if failed_steps.is_empty() {
        "completed".to_string()
    } else {
        run.error = Some(format!(
            "{} step(s) failed",
            run.steps.iter().filter(|s| s.status == "failed").count()
        ));
        "failed".to_string()
    };
    persist(&state, &run);

    state.workflow_cancels.lock().remove(&run.id);
    state.record_activity(
        NewActivity::new(ActivityKind::WorkflowCompleted, run.triggered_by.clone())
            .workflow_run(run.id.clone())
            .meta("status", json!(run.status)),
    );
    info!(run_id = %run.id, status = %run.status, "workflow run finished");
}

fn persist(state: &HubState, run: &WorkflowRun) {
    if let Err(e) = state.stores.workflows.update(run) {
        warn!(run_id = %run.id, error = %e, "failed to persist workflow run");
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
