// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request dispatcher: routes each decoded request to its handler.
//!
//! `auth` and `ping` never reach this table; they are handled at the
//! connection layer. Every arm here runs with an authenticated caller.

use crate::engine::{self, HandlerResult};
use crate::handlers::{council, knowledge, messaging, misc, retro, sessions, tasks, workflow, workspace};
use crate::lifecycle::HubState;
use agentctl_wire::Request;
use std::sync::Arc;

pub async fn dispatch(state: &Arc<HubState>, caller: &str, request: Request) -> HandlerResult {
    match request {
        // Handled at the connection layer
        Request::Ping | Request::Auth { .. } => unreachable!(),

        // -- messaging --
        Request::SendMessage { to, content, context } => {
            messaging::send_message(state, caller, &to, &content, context)
        }
        Request::ReadMessages {
            unread_only,
            limit,
            offset,
        } => messaging::read_messages(state, caller, unread_only, limit, offset),
        Request::CountUnread => messaging::count_unread(state, caller),
        Request::ListAccounts => messaging::list_accounts(state),
        Request::ArchiveMessages { days } => messaging::archive_messages(state, days),

        // -- handoff --
        Request::HandoffTask { to, payload, context } => {
            engine::handoffs::handoff_task(state, caller, &to, payload, context, false).await
        }
        Request::HandoffAccept { handoff_id } => {
            engine::handoffs::handoff_accept(state, caller, &handoff_id).await
        }
        Request::SuggestAssignee {
            skills,
            exclude_accounts,
            priority: _,
            workload,
        } => tasks::suggest_assignee(state, &skills, &exclude_accounts, workload.as_ref()),
        Request::ReauthorizeDelegation { to, payload, context } => {
            tasks::reauthorize_delegation(state, caller, &to, payload, context).await
        }

        // -- tasks --
        Request::UpdateTaskStatus {
            task_id,
            new_status,
            reason,
            workspace_path,
            branch,
            workspace_id,
        } => {
            engine::tasks::update_task_status(
                state,
                caller,
                &task_id,
                &new_status,
                reason,
                workspace_path,
                branch,
                workspace_id,
            )
            .await
        }
        Request::ReportProgress {
            task_id,
            percent,
            note,
        } => engine::tasks::report_progress(state, caller, &task_id, percent, note),
        Request::AdaptiveSlaCheck => tasks::adaptive_sla_check(state),
        Request::GetTrust { account } => tasks::get_trust(state, account.as_deref()),
        Request::CheckCircuitBreaker { account } => tasks::check_circuit_breaker(state, &account),
        Request::ReinstateAgent { account } => tasks::reinstate_agent(state, &account),

        // -- workspace --
        Request::PrepareWorktreeForHandoff {
            repo_path,
            branch,
            handoff_id,
        } => {
            workspace::prepare_worktree_for_handoff(state, caller, &repo_path, &branch, &handoff_id)
                .await
        }
        Request::GetWorkspaceStatus { workspace_id } => {
            workspace::get_workspace_status(state, caller, workspace_id.as_deref())
        }
        Request::CleanupWorkspace { workspace_id } => {
            workspace::cleanup_workspace(state, &workspace_id).await
        }

        // -- live sessions --
        Request::ShareSession { target, workspace } => {
            sessions::share_session(state, caller, &target, workspace)
        }
        Request::JoinSession { session_id } => sessions::join_session(state, caller, &session_id),
        Request::SessionBroadcast { session_id, data } => {
            sessions::session_broadcast(state, caller, &session_id, data)
        }
        Request::SessionStatus { session_id } => {
            sessions::session_status(state, caller, &session_id)
        }
        Request::SessionHistory { session_id } => {
            sessions::session_history(state, caller, &session_id)
        }
        Request::LeaveSession { session_id } => sessions::leave_session(state, caller, &session_id),
        Request::SessionPing { session_id } => sessions::session_ping(state, caller, &session_id),

        // -- named sessions --
        Request::NameSession { session_id, name } => {
            sessions::name_session(state, &session_id, &name)
        }
        Request::ListSessions => sessions::list_sessions(state),
        Request::SearchSessions { query, limit } => sessions::search_sessions(state, &query, limit),

        // -- knowledge --
        Request::SearchKnowledge { query, limit } => {
            knowledge::search_knowledge(state, &query, limit)
        }
        Request::IndexNote {
            title,
            content,
            tags,
        } => knowledge::index_note(state, caller, &title, &content, tags),

        // -- workflow --
        Request::WorkflowTrigger { workflow: name, params } => {
            workflow::workflow_trigger(state, caller, &name, params)
        }
        Request::WorkflowStatus { run_id } => workflow::workflow_status(state, &run_id),
        Request::WorkflowList => workflow::workflow_list(state),
        Request::WorkflowCancel { run_id } => workflow::workflow_cancel(state, &run_id),

        // -- health / misc --
        Request::HealthCheck => misc::health_check(state),
        Request::HealthStatus => misc::health_status(state),
        Request::QueryActivity {
            kind,
            account,
            workflow_run_id,
            since,
            limit,
            search,
        } => misc::query_activity(
            state,
            kind.as_deref(),
            account,
            workflow_run_id,
            since.as_deref(),
            limit,
            search.as_deref(),
        ),
        Request::ConfigReload => misc::config_reload(state),
        Request::SearchCode {
            pattern,
            path,
            limit,
        } => misc::search_code(state, &pattern, path.as_deref(), limit).await,
        Request::ReplaySession { session_id } => {
            sessions::replay_session(state, caller, &session_id)
        }
        Request::LinkTask {
            task_id,
            linked_task_id,
            relation,
        } => misc::link_task(state, &task_id, &linked_task_id, relation),
        Request::GetTaskLinks { task_id } => misc::get_task_links(state, &task_id),
        Request::GetReviewBundle { task_id } => misc::get_review_bundle(state, &task_id),
        Request::GenerateReviewBundle { task_id } => misc::generate_review_bundle(state, &task_id),
        Request::GetAnalytics => misc::get_analytics(state),

        // -- council --
        Request::CouncilAnalyze { content, task_id } => {
            council::council_analyze(state, &content, task_id).await
        }
        Request::CouncilVerify { task_id } => council::council_verify(state, &task_id).await,
        Request::CouncilHistory { limit } => council::council_history(state, limit),

        // -- retro --
        Request::RetroStartSession { task_id } => retro::retro_start_session(state, &task_id),
        Request::RetroSubmitReview { retro_id, content } => {
            retro::retro_submit_review(state, caller, &retro_id, &content)
        }
        Request::RetroSubmitSynthesis { retro_id, content } => {
            retro::retro_submit_synthesis(state, &retro_id, &content)
        }
        Request::RetroStatus { retro_id } => retro::retro_status(state, &retro_id),
        Request::RetroGetPastLearnings { query, limit } => {
            retro::retro_get_past_learnings(state, query.as_deref(), limit)
        }
    }
}
