// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: paths, state wiring, startup, shutdown.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use agentctl_core::activity::{ActivityKind, NewActivity};
use agentctl_core::config::HubConfig;
use agentctl_core::event::HubEvent;
use agentctl_core::id::UuidIdGen;
use agentctl_storage::{
    ActivityStore, CapabilityStore, JsonFileStore, KnowledgeStore, MessageStore, ReceiptStore,
    RetroStore, ReviewBundleStore, SessionStore, StoreError, TaskBoard, TrustStore, WorkflowStore,
    WorkspaceStore,
};
use tokio_util::sync::CancellationToken;

use crate::adapters::council::{CouncilAdapter, CouncilRecord, SubprocessCouncilAdapter};
use crate::adapters::worktree::{GitWorktreeAdapter, WorktreeAdapter};
use crate::config::{load_config, migrate_config, ConfigError};
use crate::engine::sessions::SharedSessionManager;
use crate::event_bus::EventBus;

/// Filesystem layout under the base directory.
#[derive(Debug, Clone)]
pub struct Paths {
    pub base_dir: PathBuf,
    pub config: PathBuf,
    pub tokens_dir: PathBuf,
    pub socket: PathBuf,
    pub pid: PathBuf,
    pub log: PathBuf,
    pub worktrees_dir: PathBuf,
    pub workflows_dir: PathBuf,

    pub messages_db: PathBuf,
    pub workspaces_db: PathBuf,
    pub capabilities_db: PathBuf,
    pub knowledge_db: PathBuf,
    pub sessions_db: PathBuf,
    pub activity_db: PathBuf,
    pub workflow_db: PathBuf,
    pub retro_db: PathBuf,
    pub trust_db: PathBuf,
    pub receipts_db: PathBuf,

    pub tasks_file: PathBuf,
    pub prompts_file: PathBuf,
    pub clipboard_file: PathBuf,
    pub templates_file: PathBuf,
    pub council_cache_file: PathBuf,
    pub review_bundles_dir: PathBuf,
}

impl Paths {
    /// Resolve paths from the environment (`AGENTCTL_DIR` > `$HOME/.agentctl`).
    pub fn resolve() -> Result<Self, LifecycleError> {
        Ok(Self::under(crate::env::base_dir()?))
    }

    /// Lay out every path under an explicit base directory.
    pub fn under(base_dir: PathBuf) -> Self {
        Self {
            config: base_dir.join("config.json"),
            tokens_dir: base_dir.join("tokens"),
            socket: base_dir.join("hub.sock"),
            pid: base_dir.join("daemon.pid"),
            log: base_dir.join("daemon.log"),
            worktrees_dir: base_dir.join("worktrees"),
            workflows_dir: base_dir.join("workflows"),
            messages_db: base_dir.join("messages.db"),
            workspaces_db: base_dir.join("workspaces.db"),
            capabilities_db: base_dir.join("capabilities.db"),
            knowledge_db: base_dir.join("knowledge.db"),
            sessions_db: base_dir.join("sessions.db"),
            activity_db: base_dir.join("activity.db"),
            workflow_db: base_dir.join("workflow.db"),
            retro_db: base_dir.join("retro.db"),
            trust_db: base_dir.join("trust.db"),
            receipts_db: base_dir.join("receipts.db"),
            tasks_file: base_dir.join("tasks.json"),
            prompts_file: base_dir.join("prompts.json"),
            clipboard_file: base_dir.join("clipboard.json"),
            templates_file: base_dir.join("handoff-templates.json"),
            council_cache_file: base_dir.join("council-cache.json"),
            review_bundles_dir: base_dir.join("review-bundles"),
            base_dir,
        }
    }

    /// Token file for an account.
    pub fn token_file(&self, account: &str) -> PathBuf {
        self.tokens_dir.join(format!("{account}.token"))
    }
}

/// All durable stores, each owning its database file or JSON file.
pub struct Stores {
    pub messages: MessageStore,
    pub activity: ActivityStore,
    pub workspaces: WorkspaceStore,
    pub capabilities: CapabilityStore,
    pub trust: TrustStore,
    pub receipts: ReceiptStore,
    pub knowledge: KnowledgeStore,
    pub sessions: SessionStore,
    pub workflows: WorkflowStore,
    pub retro: RetroStore,
    pub board: TaskBoard,
    pub bundles: ReviewBundleStore,
    pub prompts: JsonFileStore<serde_json::Map<String, serde_json::Value>>,
    pub clipboard: JsonFileStore<serde_json::Map<String, serde_json::Value>>,
    pub templates: JsonFileStore<serde_json::Map<String, serde_json::Value>>,
}

impl Stores {
    pub fn open(paths: &Paths, now: DateTime<Utc>) -> Result<Self, StoreError> {
        Ok(Self {
            messages: MessageStore::open(&paths.messages_db)?,
            activity: ActivityStore::open(&paths.activity_db)?,
            workspaces: WorkspaceStore::open(&paths.workspaces_db)?,
            capabilities: CapabilityStore::open(&paths.capabilities_db)?,
            trust: TrustStore::open(&paths.trust_db)?,
            receipts: ReceiptStore::open(&paths.receipts_db)?,
            knowledge: KnowledgeStore::open(&paths.knowledge_db)?,
            sessions: SessionStore::open(&paths.sessions_db)?,
            workflows: WorkflowStore::open(&paths.workflow_db)?,
            retro: RetroStore::open(&paths.retro_db)?,
            board: TaskBoard::open(&paths.tasks_file, now)?,
            bundles: ReviewBundleStore::open(&paths.review_bundles_dir)?,
            prompts: JsonFileStore::open(&paths.prompts_file)?,
            clipboard: JsonFileStore::open(&paths.clipboard_file)?,
            templates: JsonFileStore::open(&paths.templates_file)?,
        })
    }
}

/// Latest progress report per task (in-memory; feeds the SLA scan).
#[derive(Debug, Clone)]
pub struct ProgressEntry {
    pub percent: Option<u8>,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

/// Explicit engine configuration, taking precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct EngineOverrides {
    pub max_delegation_depth: Option<u32>,
}

/// Shared daemon context for all request handlers and periodic tasks.
pub struct HubState {
    pub paths: Paths,
    pub config: RwLock<HubConfig>,
    pub stores: Stores,
    pub bus: EventBus,
    /// Connection count per authenticated account
    pub clients: Mutex<HashMap<String, u32>>,
    pub live_sessions: SharedSessionManager,
    pub progress: Mutex<HashMap<String, ProgressEntry>>,
    /// Cancellation handles for in-flight workflow runs
    pub workflow_cancels: Mutex<HashMap<String, CancellationToken>>,
    pub ids: UuidIdGen,
    pub engine_overrides: RwLock<EngineOverrides>,
    pub worktrees: Arc<dyn WorktreeAdapter>,
    pub council: Arc<dyn CouncilAdapter>,
    pub council_cache: JsonFileStore<BTreeMap<String, CouncilRecord>>,
    pub start_time: Instant,
}

impl HubState {
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub fn config(&self) -> HubConfig {
        self.config.read().clone()
    }

    pub fn feature(&self, select: impl Fn(&agentctl_core::config::Features) -> bool) -> bool {
        select(&self.config.read().features)
    }

    pub fn is_connected(&self, account: &str) -> bool {
        self.clients.lock().get(account).copied().unwrap_or(0) > 0
    }

    pub fn client_connected(&self, account: &str) {
        *self.clients.lock().entry(account.to_string()).or_insert(0) += 1;
    }

    pub fn client_disconnected(&self, account: &str) {
        let mut clients = self.clients.lock();
        if let Some(count) = clients.get_mut(account) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                clients.remove(account);
            }
        }
    }

    /// Record an activity row, logging (never failing) on store errors.
    pub fn record_activity(&self, event: NewActivity) {
        if let Err(e) = self.stores.activity.emit(event, self.now()) {
            warn!(error = %e, "failed to record activity event");
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine base directory (set AGENTCTL_DIR or HOME)")]
    NoBaseDir,

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of daemon startup.
pub struct StartupResult {
    pub state: Arc<HubState>,
    pub listener: UnixListener,
    // NOTE(lifetime): held to maintain the exclusive PID-file lock
    pub lock_file: File,
}

/// Start the daemon: lock, migrate config, open stores, bind socket last.
pub async fn startup(paths: Paths) -> Result<StartupResult, LifecycleError> {
    match startup_inner(paths.clone()).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Lock failure means another daemon owns these files
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&paths);
            }
            Err(e)
        }
    }
}

async fn startup_inner(paths: Paths) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&paths.base_dir)?;
    std::fs::create_dir_all(&paths.tokens_dir)?;
    std::fs::create_dir_all(&paths.worktrees_dir)?;
    std::fs::create_dir_all(&paths.workflows_dir)?;

    // Acquire the PID lock before touching anything else.
    // OpenOptions avoids truncating a running daemon's PID before we hold the lock.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.pid)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    {
        use std::io::Write;
        let mut lock_file = &lock_file;
        lock_file.set_len(0)?;
        writeln!(lock_file, "{}", std::process::id())?;
    }

    // Config: migrate then load
    if let Some(old) = migrate_config(&paths.config)? {
        info!(from = old, "config migrated at startup");
    }
    let config = load_config(&paths.config)?;

    let now = Utc::now();
    let stores = Stores::open(&paths, now)?;

    let council_config = config.council.clone();
    let state = Arc::new(HubState {
        council_cache: JsonFileStore::open(&paths.council_cache_file)?,
        config: RwLock::new(config),
        stores,
        bus: EventBus::new(),
        clients: Mutex::new(HashMap::new()),
        live_sessions: SharedSessionManager::new(),
        progress: Mutex::new(HashMap::new()),
        workflow_cancels: Mutex::new(HashMap::new()),
        ids: UuidIdGen,
        engine_overrides: RwLock::new(EngineOverrides::default()),
        worktrees: Arc::new(GitWorktreeAdapter),
        council: Arc::new(SubprocessCouncilAdapter::new(council_config)),
        start_time: Instant::now(),
        paths: paths.clone(),
    });

    wire_subscribers(&state);

    // Remove a stale socket and bind LAST, after all validation passed
    if paths.socket.exists() {
        std::fs::remove_file(&paths.socket)?;
    }
    let listener = UnixListener::bind(&paths.socket)
        .map_err(|e| LifecycleError::BindFailed(paths.socket.clone(), e))?;

    info!(
        base_dir = %paths.base_dir.display(),
        accounts = state.config.read().accounts.len(),
        tasks = state.stores.board.count(),
        "daemon started"
    );

    Ok(StartupResult {
        state,
        listener,
        lock_file,
    })
}

/// Wire the standing event-bus subscribers.
///
/// The activity bridge persists every bus event; handlers therefore never
/// write those kinds to the activity store directly. Notification and
/// GitHub hooks are post-commit and best-effort.
pub fn wire_subscribers(state: &Arc<HubState>) {
    let bridge = Arc::clone(state);
    state.bus.subscribe_all(move |event| {
        let activity = activity_from_event(event);
        bridge
            .stores
            .activity
            .emit(activity, Utc::now())
            .map(|_| ())
            .map_err(|e| e.to_string())
    });

    let notify = Arc::clone(state);
    state.bus.subscribe_all(move |event| {
        crate::adapters::notify::on_event(&notify, event);
        Ok(())
    });

    let github = Arc::clone(state);
    state
        .bus
        .subscribe(agentctl_core::event::EventKind::TaskCompleted, move |event| {
            crate::adapters::github::on_event(&github, event);
            Ok(())
        });
}

/// Map a bus event onto its activity row.
fn activity_from_event(event: &HubEvent) -> NewActivity {
    let meta = |event: &HubEvent| -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(event) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("kind");
                map
            }
            _ => serde_json::Map::new(),
        }
    };

    match event {
        HubEvent::TaskCreated {
            task_id, assignee, ..
        } => NewActivity::new(ActivityKind::TaskCreated, assignee.clone())
            .task(task_id.as_str())
            .merged(meta(event)),
        HubEvent::TaskAssigned {
            task_id, delegatee, ..
        } => NewActivity::new(ActivityKind::TaskAssigned, delegatee.clone())
            .task(task_id.as_str())
            .merged(meta(event)),
        HubEvent::TaskStarted { task_id, account } => {
            NewActivity::new(ActivityKind::TaskStarted, account.clone()).task(task_id.as_str())
        }
        HubEvent::CheckpointReached {
            task_id, account, ..
        } => NewActivity::new(ActivityKind::CheckpointReached, account.clone())
            .task(task_id.as_str())
            .merged(meta(event)),
        HubEvent::TaskCompleted {
            task_id, account, ..
        } => NewActivity::new(ActivityKind::TaskCompleted, account.clone())
            .task(task_id.as_str())
            .merged(meta(event)),
        HubEvent::TaskVerified {
            task_id, account, ..
        } => NewActivity::new(ActivityKind::TaskVerified, account.clone())
            .task(task_id.as_str())
            .merged(meta(event)),
        HubEvent::ProgressUpdate {
            task_id, account, ..
        } => NewActivity::new(ActivityKind::ProgressUpdate, account.clone())
            .task(task_id.as_str())
            .merged(meta(event)),
        HubEvent::DelegationChain { chain, .. } => NewActivity::new(
            ActivityKind::DelegationChain,
            chain.first().cloned().unwrap_or_default(),
        )
        .merged(meta(event)),
        HubEvent::TrustUpdate { account, .. } => {
            NewActivity::new(ActivityKind::TrustUpdate, account.clone()).merged(meta(event))
        }
        HubEvent::SlaWarning {
            task_id, assignee, ..
        } => NewActivity::new(ActivityKind::SlaWarning, assignee.clone())
            .task(task_id.as_str())
            .merged(meta(event)),
        HubEvent::SlaBreach {
            task_id, assignee, ..
        } => NewActivity::new(ActivityKind::SlaBreach, assignee.clone())
            .task(task_id.as_str())
            .merged(meta(event)),
        HubEvent::Reassignment { task_id, to, .. } => {
            NewActivity::new(ActivityKind::Reassignment, to.clone())
                .task(task_id.as_str())
                .merged(meta(event))
        }
    }
}

/// Graceful shutdown: remove socket and PID files.
///
/// Store handles close on drop; SQLite WAL files are checkpointed by the
/// engine as connections close.
pub fn shutdown(state: &HubState) {
    info!("shutting down daemon...");

    if state.paths.socket.exists() {
        if let Err(e) = std::fs::remove_file(&state.paths.socket) {
            warn!("failed to remove socket file: {}", e);
        }
    }
    if state.paths.pid.exists() {
        if let Err(e) = std::fs::remove_file(&state.paths.pid) {
            warn!("failed to remove PID file: {}", e);
        }
    }

    info!("daemon shutdown complete");
}

/// Clean up resources on startup failure.
fn cleanup_on_failure(paths: &Paths) {
    if paths.socket.exists() {
        let _ = std::fs::remove_file(&paths.socket);
    }
    if paths.pid.exists() {
        let _ = std::fs::remove_file(&paths.pid);
    }
}

/// Build a state for handler tests: temp base dir, fake worktrees, all
/// features enabled unless the caller overrides the config.
#[cfg(test)]
pub(crate) fn test_state_with(dir: &std::path::Path, config: HubConfig) -> Arc<HubState> {
    use crate::adapters::worktree::FakeWorktreeAdapter;

    let paths = Paths::under(dir.to_path_buf());
    std::fs::create_dir_all(&paths.tokens_dir).unwrap();
    std::fs::create_dir_all(&paths.worktrees_dir).unwrap();
    std::fs::create_dir_all(&paths.workflows_dir).unwrap();
    let now = Utc::now();
    let council_config = config.council.clone();

    let state = Arc::new(HubState {
        council_cache: JsonFileStore::open(&paths.council_cache_file).unwrap(),
        config: RwLock::new(config),
        stores: Stores::open(&paths, now).unwrap(),
        bus: EventBus::new(),
        clients: Mutex::new(HashMap::new()),
        live_sessions: SharedSessionManager::new(),
        progress: Mutex::new(HashMap::new()),
        workflow_cancels: Mutex::new(HashMap::new()),
        ids: UuidIdGen,
        engine_overrides: RwLock::new(EngineOverrides::default()),
        worktrees: Arc::new(FakeWorktreeAdapter),
        council: Arc::new(SubprocessCouncilAdapter::new(council_config)),
        start_time: Instant::now(),
        paths,
    });
    wire_subscribers(&state);
    state
}

#[cfg(test)]
pub(crate) fn test_state(dir: &std::path::Path) -> Arc<HubState> {
    let mut config = HubConfig::default();
    config.features = agentctl_core::config::Features {
        workspace_worktree: true,
        auto_acceptance: true,
        capability_routing: true,
        sla_engine: true,
        github_integration: false,
        review_bundles: true,
        knowledge_index: true,
        reliability: true,
        workflow: true,
        retro: true,
        sessions: true,
        trust: true,
        council: true,
        circuit_breaker: true,
        cognitive_friction: true,
        entire_monitoring: false,
    };
    test_state_with(dir, config)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
