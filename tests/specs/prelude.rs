//! Test harness for behavioral specifications.
//!
//! Starts a real daemon per test in its own base directory and exposes a
//! small client for the NDJSON socket protocol.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// How long to wait for the daemon socket to appear.
const STARTUP_WAIT: Duration = Duration::from_secs(10);

/// Socket read timeout per reply.
const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns the path to the agentctld binary, checking the llvm-cov
/// target directory first so coverage runs work too.
pub fn daemon_binary() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov = manifest_dir.join("target/llvm-cov-target/debug/agentctld");
    if llvm_cov.exists() {
        return llvm_cov;
    }

    let standard = manifest_dir.join("target/debug/agentctld");
    if standard.exists() {
        return standard;
    }

    // Fallback: resolve relative to the test binary itself
    // (target/debug/deps/specs-<hash> -> target/debug/agentctld).
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("agentctld");
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

/// A running daemon rooted in its own temp base directory.
pub struct Daemon {
    pub base_dir: tempfile::TempDir,
    child: Child,
}

impl Daemon {
    /// Start a daemon with two configured accounts (alice/s1, bob/s2)
    /// and every feature flag on.
    pub fn start() -> Self {
        Self::start_with_config(default_config())
    }

    pub fn start_with_config(config: Value) -> Self {
        let base_dir = tempfile::tempdir().unwrap();

        std::fs::write(
            base_dir.path().join("config.json"),
            serde_json::to_string_pretty(&config).unwrap(),
        )
        .unwrap();
        let tokens = base_dir.path().join("tokens");
        std::fs::create_dir_all(&tokens).unwrap();
        std::fs::write(tokens.join("alice.token"), "s1").unwrap();
        std::fs::write(tokens.join("bob.token"), "s2\n").unwrap();

        let child = Command::new(daemon_binary())
            .env("AGENTCTL_DIR", base_dir.path())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn agentctld");

        let daemon = Self { base_dir, child };
        daemon.wait_for_socket();
        daemon
    }

    pub fn socket_path(&self) -> PathBuf {
        self.base_dir.path().join("hub.sock")
    }

    fn wait_for_socket(&self) {
        let deadline = Instant::now() + STARTUP_WAIT;
        while Instant::now() < deadline {
            if UnixStream::connect(self.socket_path()).is_ok() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("daemon socket never appeared at {:?}", self.socket_path());
    }

    /// Connect a raw (unauthenticated) client.
    pub fn connect(&self) -> Client {
        let stream = UnixStream::connect(self.socket_path()).unwrap();
        stream.set_read_timeout(Some(REPLY_TIMEOUT)).unwrap();
        Client {
            reader: BufReader::new(stream.try_clone().unwrap()),
            stream,
        }
    }

    /// Connect and authenticate in one step.
    pub fn client(&self, account: &str, token: &str) -> Client {
        let mut client = self.connect();
        let reply = client.request(json!({"type": "auth", "account": account, "token": token}));
        assert_eq!(reply["type"], json!("auth_ok"), "auth failed: {reply}");
        client
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// One NDJSON client connection.
pub struct Client {
    stream: UnixStream,
    reader: BufReader<UnixStream>,
}

impl Client {
    pub fn send(&mut self, frame: Value) {
        let mut line = frame.to_string();
        line.push('\n');
        self.stream.write_all(line.as_bytes()).unwrap();
        self.stream.flush().unwrap();
    }

    pub fn recv(&mut self) -> Value {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).unwrap();
        assert!(read > 0, "connection closed by daemon");
        serde_json::from_str(&line).unwrap()
    }

    /// Send a frame and read the correlated reply.
    pub fn request(&mut self, frame: Value) -> Value {
        self.send(frame);
        self.recv()
    }

    /// True when the daemon has closed this connection.
    pub fn is_closed(&mut self) -> bool {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => true,
            _ => false,
        }
    }
}

/// Default config: two accounts, all features on.
pub fn default_config() -> Value {
    json!({
        "schemaVersion": 3,
        "accounts": [
            {"name": "alice", "provider": "claude-code", "color": "cyan"},
            {"name": "bob", "provider": "codex-cli", "color": "magenta"},
        ],
        "entire": {"autoEnable": false},
        "features": {
            "workspaceWorktree": true,
            "autoAcceptance": true,
            "capabilityRouting": true,
            "slaEngine": true,
            "reviewBundles": true,
            "knowledgeIndex": true,
            "workflow": true,
            "retro": true,
            "sessions": true,
            "trust": true,
            "council": true,
            "circuitBreaker": true,
            "cognitiveFriction": true,
        },
        "defaults": {"launchInNewWindow": false},
        "delegationDepth": {"maxDepth": 3},
    })
}

/// Minimal valid handoff payload.
pub fn handoff_payload(goal: &str, commands: &[&str]) -> Value {
    json!({
        "goal": goal,
        "acceptance_criteria": ["it works"],
        "run_commands": commands,
        "blocked_by": ["none"],
    })
}

/// Poll until `check` passes or the timeout expires.
pub fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    false
}
