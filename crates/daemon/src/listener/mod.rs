// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The listener accepts connections on the UNIX socket and spawns a task
//! per client. Each connection must authenticate with its first real
//! frame (`ping` is allowed pre-auth); afterwards frames are decoded,
//! dispatched sequentially, and replied to with the caller's
//! `requestId`. Framing errors close the connection; validation errors
//! do not.

mod auth;
mod dispatch;

use crate::engine::HandlerError;
use crate::lifecycle::HubState;
use agentctl_core::activity::{ActivityKind, NewActivity};
use agentctl_wire::{
    decode_request, encode_frame, peek_request_id, FrameDecoder, Request, Response,
};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Listener task accepting socket connections until shutdown.
pub struct Listener {
    socket: UnixListener,
    state: Arc<HubState>,
    shutdown: CancellationToken,
}

impl Listener {
    pub fn new(socket: UnixListener, state: Arc<HubState>, shutdown: CancellationToken) -> Self {
        Self {
            socket,
            state,
            shutdown,
        }
    }

    /// Run the accept loop, spawning a task per connection.
    pub async fn run(self) {
        loop {
            tokio::select! {
                result = self.socket.accept() => match result {
                    Ok((stream, _)) => {
                        let state = Arc::clone(&self.state);
                        let shutdown = self.shutdown.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, state, shutdown).await;
                        });
                    }
                    Err(e) => error!("accept error: {}", e),
                },
                () = self.shutdown.cancelled() => {
                    info!("listener stopping");
                    return;
                }
            }
        }
    }
}

/// Per-connection read loop.
///
/// Frames are processed strictly in order; a handler completes before the
/// next frame is decoded, which is what makes each request atomic from
/// the stores' point of view.
async fn handle_connection(
    stream: tokio::net::UnixStream,
    state: Arc<HubState>,
    shutdown: CancellationToken,
) {
    let (mut reader, mut writer) = stream.into_split();
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; 8192];
    let mut account: Option<String> = None;

    'conn: loop {
        let read = tokio::select! {
            read = reader.read(&mut chunk) => read,
            () = shutdown.cancelled() => break 'conn,
        };
        let read = match read {
            Ok(0) => break 'conn, // client closed
            Ok(n) => n,
            Err(e) => {
                debug!("read error: {}", e);
                break 'conn;
            }
        };

        let frames = match decoder.push(&chunk[..read]) {
            Ok(frames) => frames,
            Err(e) => {
                // Framing errors are fatal for the connection
                warn!("framing error: {}", e);
                let reply = Response::error(e.to_string(), None);
                let _ = write_reply(&mut writer, &reply).await;
                break 'conn;
            }
        };

        for frame in frames {
            let reply = match decode_request(&frame) {
                Err(e) => Response::error(e.to_string(), peek_request_id(&frame)),
                Ok(envelope) => {
                    let request_id = envelope.request_id.clone();
                    match process(&state, &mut account, envelope.request).await {
                        Outcome::Reply(reply) => reply.with_request_id(request_id),
                        Outcome::AuthFailed(reply) => {
                            let _ = write_reply(&mut writer, &reply.with_request_id(request_id))
                                .await;
                            break 'conn;
                        }
                    }
                }
            };
            if write_reply(&mut writer, &reply).await.is_err() {
                // Client went away mid-reply; drop the rest
                break 'conn;
            }
        }
    }

    if let Some(account) = account {
        state.client_disconnected(&account);
        state.record_activity(NewActivity::new(
            ActivityKind::AccountDisconnected,
            account.clone(),
        ));
        debug!(account, "client disconnected");
    }
}

enum Outcome {
    Reply(Response),
    /// Reply, then close the connection (failed handshake)
    AuthFailed(Response),
}

/// Handle one request in the context of this connection's auth state.
async fn process(state: &Arc<HubState>, account: &mut Option<String>, request: Request) -> Outcome {
    match request {
        // Ping works with or without auth
        Request::Ping => Outcome::Reply(Response::pong(None)),

        Request::Auth {
            account: name,
            token,
        } => {
            if account.is_some() {
                return Outcome::Reply(Response::error("Already authenticated", None));
            }
            match auth::authenticate(state, &name, &token) {
                Ok(()) => {
                    *account = Some(name.clone());
                    state.client_connected(&name);
                    state.record_activity(NewActivity::new(
                        ActivityKind::AccountConnected,
                        name.clone(),
                    ));
                    info!(account = name, "client authenticated");
                    Outcome::Reply(Response::AuthOk)
                }
                Err(e) => {
                    warn!(account = name, "authentication failed: {}", e.message);
                    Outcome::AuthFailed(Response::error(e.message, None))
                }
            }
        }

        // Everything else needs an authenticated account
        request => match account.clone() {
            None => Outcome::Reply(Response::error("Not authenticated", None)),
            Some(caller) => {
                let reply = match dispatch::dispatch(state, &caller, request).await {
                    Ok(payload) => Response::result(payload, None),
                    Err(HandlerError { message, details }) => {
                        Response::error_with(message, details, None)
                    }
                };
                Outcome::Reply(reply)
            }
        },
    }
}

async fn write_reply(
    writer: &mut tokio::net::unix::OwnedWriteHalf,
    reply: &Response,
) -> std::io::Result<()> {
    let data = encode_frame(reply)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    tokio::time::timeout(crate::env::ipc_timeout(), async {
        writer.write_all(&data).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "write timeout"))?
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
