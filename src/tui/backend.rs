//! Async backend: keeps network calls off the UI loop.
//!
//! Uses an mpsc channel pair. The TUI sends `BackendCommand` values, and a
//! background tokio task executes them and sends `BackendResponse` values back.

use anyhow::Result;
use tokio::sync::mpsc;

use crate::api::catalog;
use crate::api::client::TutorClient;
use crate::api::practice::{self, PracticeRequest};
use crate::models::{AssistantReply, HealthStatus, PracticeQuestion};
use crate::session::{Assistant, OutgoingRequest};

/// Commands sent from the TUI event loop to the async backend.
pub enum BackendCommand {
    Ask(OutgoingRequest),
    Practice(PracticeRequest),
    CheckHealth,
}

/// Responses from the async backend to the TUI.
pub enum BackendResponse {
    Reply(Result<AssistantReply>),
    Practice(Result<PracticeQuestion>),
    Health(Result<HealthStatus>),
}

/// Handle for interacting with the backend from the TUI side.
pub struct Backend {
    cmd_tx: mpsc::UnboundedSender<BackendCommand>,
    resp_rx: mpsc::UnboundedReceiver<BackendResponse>,
}

impl Backend {
    /// Start the backend. Spawns a tokio task that processes commands.
    pub fn start(client: TutorClient) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();

        tokio::spawn(backend_loop(client, cmd_rx, resp_tx));

        Self { cmd_tx, resp_rx }
    }

    /// Send a command to the backend (non-blocking).
    pub fn send(&self, cmd: BackendCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("Backend channel closed, command dropped");
        }
    }

    /// Receive a response from the backend.
    ///
    /// Returns `None` only when the backend task has gone away.
    /// Designed to be used inside `tokio::select!`.
    pub async fn recv(&mut self) -> Option<BackendResponse> {
        self.resp_rx.recv().await
    }
}

async fn backend_loop(
    client: TutorClient,
    mut cmd_rx: mpsc::UnboundedReceiver<BackendCommand>,
    resp_tx: mpsc::UnboundedSender<BackendResponse>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        let client = client.clone();
        let resp_tx = resp_tx.clone();

        // One task per command so a slow chat call never holds up a health check.
        tokio::spawn(async move {
            let response = match cmd {
                BackendCommand::Ask(request) => {
                    BackendResponse::Reply(client.ask(&request).await)
                }
                BackendCommand::Practice(request) => {
                    BackendResponse::Practice(practice::practice_data(&client, &request).await)
                }
                BackendCommand::CheckHealth => {
                    BackendResponse::Health(catalog::health_data(&client).await)
                }
            };
            let _ = resp_tx.send(response);
        });
    }
}
