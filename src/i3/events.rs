//! Turns i3 workspace and output events into redistribution pulses.
//!
//! [`I3EventSource`] opens its own IPC connection, subscribes to the
//! `workspace` and `output` event streams and pulses the
//! [`Trigger`] whenever the set of outputs or workspaces may have changed:
//!
//! * every `output` event (a monitor was plugged, unplugged, enabled, …);
//! * `workspace` events whose `change` is structural: `init`, `empty`,
//!   `move`, `reload` or `restored`.
//!
//! Focus changes are ignored.  The distributor generates plenty of them
//! itself while moving workspaces, and they never change which output a
//! workspace is on.

use super::ipc::{self, I3Error, MessageType, EVENT_FLAG, EVENT_OUTPUT, EVENT_WORKSPACE};
use crate::traits::{Trigger, TriggerSource};
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A [`TriggerSource`] fed by the i3 IPC event stream.
pub struct I3EventSource {
    socket: PathBuf,
}

#[derive(Deserialize)]
struct SubscribeReplyJson {
    success: bool,
}

/// Subset of a `workspace` event payload.
#[derive(Deserialize)]
struct WorkspaceEventJson {
    change: String,
}

impl I3EventSource {
    /// Create a source for the socket at `socket`.
    ///
    /// The connection is opened when [`run`](TriggerSource::run) is called.
    pub fn new(socket: impl AsRef<Path>) -> Self {
        Self {
            socket: socket.as_ref().to_path_buf(),
        }
    }
}

/// Whether a workspace event with this `change` can affect assignment.
fn is_structural(change: &str) -> bool {
    matches!(change, "init" | "empty" | "move" | "reload" | "restored")
}

impl TriggerSource for I3EventSource {
    type Error = I3Error;

    /// Subscribe and pulse on relevant events.
    ///
    /// Blocks until the connection drops (an error) or the trigger's
    /// receiver is gone (`Ok`).
    fn run(&mut self, trigger: Trigger) -> Result<(), Self::Error> {
        // Events may be minutes apart, so no read timeout here.
        let mut stream = ipc::connect(&self.socket, None)?;
        ipc::write_message(
            &mut stream,
            MessageType::Subscribe.code(),
            br#"["workspace","output"]"#,
        )?;
        let reply = ipc::read_message(&mut stream)?;
        let reply: SubscribeReplyJson = serde_json::from_slice(&reply.payload)?;
        if !reply.success {
            return Err(I3Error::Protocol("subscribe rejected".into()));
        }
        info!("subscribed to i3 events on {}", self.socket.display());

        loop {
            let msg = ipc::read_message(&mut stream)?;
            if !msg.is_event() {
                continue;
            }
            let relevant = match msg.kind & !EVENT_FLAG {
                EVENT_OUTPUT => {
                    debug!("output event");
                    true
                }
                EVENT_WORKSPACE => match serde_json::from_slice::<WorkspaceEventJson>(&msg.payload) {
                    Ok(event) => {
                        debug!("workspace event: {}", event.change);
                        is_structural(&event.change)
                    }
                    Err(e) => {
                        warn!("bad workspace event: {}", e);
                        false
                    }
                },
                _ => false,
            };
            if relevant && !trigger.pulse() {
                info!("trigger closed, shutting down event source");
                return Ok(());
            }
        }
    }
}
