// SPDX-License-Identifier: MIT

//! Bridges the broadcast server's [`CommandHandler`] callback back into the
//! orchestrator's own `start`/`stop`/`restart` operations (section 4.7:
//! "Commands are dispatched to the Orchestrator").

use std::sync::Arc;

use async_trait::async_trait;
use procwave_broadcast::{CommandAction, CommandHandler, CommandOutcome};

use crate::Orchestrator;

pub struct OrchestratorCommandHandler {
    orchestrator: Arc<Orchestrator>,
}

impl OrchestratorCommandHandler {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl CommandHandler for OrchestratorCommandHandler {
    async fn handle_command(&self, action: CommandAction, process_name: String) -> CommandOutcome {
        let names = [process_name.clone()];
        let result = match action {
            CommandAction::Start => self.orchestrator.start(Some(&names)).await,
            CommandAction::Stop => self.orchestrator.stop(Some(&names)).await,
            CommandAction::Restart => self.orchestrator.restart(&names).await,
        };

        match result {
            Ok(()) => CommandOutcome::ok(format!("{action:?} {process_name} succeeded")),
            Err(err) => CommandOutcome::failed(err.to_string()),
        }
    }
}
