// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! procwave-broadcast: the local control-socket server (section 4.7).
//!
//! Listens on a Unix stream socket, broadcasts `status_update`/`log`
//! records to every connected client in emission order, and routes
//! `command` records to the orchestrator via [`CommandHandler`], replying
//! with exactly one `command_response` on the originating connection.

mod error;
mod server;
mod wire;

pub use error::BroadcastError;
pub use server::{
    BroadcastServer, ClientId, CommandHandler, CommandOutcome, BROADCAST_CHANNEL_CAPACITY,
};
pub use wire::{CommandAction, SystemMetrics, WireMessage};
