// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow handlers: trigger, status, listing, cancel.

use crate::engine::{workflow, HandlerError, HandlerResult};
use crate::lifecycle::HubState;
use serde_json::json;
use std::sync::Arc;

fn workflow_enabled(state: &HubState) -> Result<(), HandlerError> {
    if state.feature(|f| f.workflow) {
        Ok(())
    } else {
        Err(HandlerError::feature_disabled("Workflow"))
    }
}

pub fn workflow_trigger(
    state: &Arc<HubState>,
    caller: &str,
    name: &str,
    params: serde_json::Map<String, serde_json::Value>,
) -> HandlerResult {
    workflow_enabled(state)?;
    workflow::trigger(state, caller, name, params)
}

pub fn workflow_status(state: &Arc<HubState>, run_id: &str) -> HandlerResult {
    workflow_enabled(state)?;
    match state.stores.workflows.get(run_id)? {
        Some(run) => Ok(json!({"run": run})),
        None => Err(HandlerError::not_found(format!("workflow run {run_id}"))),
    }
}

pub fn workflow_list(state: &Arc<HubState>) -> HandlerResult {
    workflow_enabled(state)?;
    let definitions: Vec<_> = workflow::load_definitions(&state.paths.workflows_dir)
        .into_iter()
        .map(|def| {
            json!({
                "name": def.name,
                "description": def.description,
                "steps": def.steps.iter().map(|s| s.name.clone()).collect::<Vec<_>>(),
            })
        })
        .collect();
    let runs = state.stores.workflows.list(20)?;
    Ok(json!({"workflows": definitions, "runs": runs}))
}

pub fn workflow_cancel(state: &Arc<HubState>, run_id: &str) -> HandlerResult {
    workflow_enabled(state)?;
    workflow::cancel(state, run_id)
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
