// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lifecycle::test_state;
use serde_json::json;
use tempfile::tempdir;

fn write_workflow(state: &crate::lifecycle::HubState, name: &str, yaml: &str) {
    std::fs::write(state.paths.workflows_dir.join(format!("{name}.yaml")), yaml).unwrap();
}

async fn wait_for_finish(state: &std::sync::Arc<crate::lifecycle::HubState>, run_id: &str) -> agentctl_storage::WorkflowRun {
    for _ in 0..100 {
        let run = state.stores.workflows.get(run_id).unwrap().unwrap();
        if run.status != "running" {
            return run;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    panic!("workflow run {run_id} never finished");
}

#[tokio::test]
async fn trigger_runs_steps_in_dependency_order() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    write_workflow(
        &state,
        "greet",
        "name: greet\nsteps:\n  - name: second\n    run: true\n    needs: [first]\n  - name: first\n    run: true\n",
    );

    let reply = workflow_trigger(&state, "alice", "greet", Default::default()).unwrap();
    let run_id = reply["runId"].as_str().unwrap().to_string();
    assert_eq!(reply["status"], json!("running"));

    let run = wait_for_finish(&state, &run_id).await;
    assert_eq!(run.status, "completed");
    assert!(run.steps.iter().all(|s| s.status == "completed"));
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn failing_step_skips_dependents() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    write_workflow(
        &state,
        "broken",
        "name: broken\nsteps:\n  - name: boom\n    run: false\n  - name: after\n    run: true\n    needs: [boom]\n",
    );

    let reply = workflow_trigger(&state, "alice", "broken", Default::default()).unwrap();
    let run = wait_for_finish(&state, reply["runId"].as_str().unwrap()).await;

    assert_eq!(run.status, "failed");
    let step = |name: &str| run.steps.iter().find(|s| s.name == name).unwrap().clone();
    assert_eq!(step("boom").status, "failed");
    assert_eq!(step("after").status, "skipped");
}

#[tokio::test]
async fn unknown_workflow_not_found() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    let err = workflow_trigger(&state, "alice", "missing", Default::default()).unwrap_err();
    assert!(err.message.contains("Not found"));
}

#[tokio::test]
async fn status_and_list_surface_runs() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    write_workflow(&state, "quick", "name: quick\nsteps:\n  - name: only\n    run: true\n");

    let reply = workflow_trigger(&state, "alice", "quick", Default::default()).unwrap();
    let run_id = reply["runId"].as_str().unwrap().to_string();
    wait_for_finish(&state, &run_id).await;

    let status = workflow_status(&state, &run_id).unwrap();
    assert_eq!(status["run"]["workflow"], json!("quick"));

    let listing = workflow_list(&state).unwrap();
    assert_eq!(listing["workflows"][0]["name"], json!("quick"));
    assert_eq!(listing["runs"].as_array().unwrap().len(), 1);

    assert!(workflow_status(&state, "ghost").is_err());
}

#[tokio::test]
async fn feature_gate_enforced() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    state.config.write().features.workflow = false;
    let err = workflow_list(&state).unwrap_err();
    assert_eq!(err.message, "Workflow not enabled");
}
