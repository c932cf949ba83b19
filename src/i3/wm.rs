//! [`WindowManager`] implementation backed by i3 IPC.
//!
//! Talks to i3 (or sway) directly through its Unix socket, one short-lived
//! connection per request.  No `i3-msg` child processes are spawned.

use super::ipc::{self, I3Error, MessageType};
use crate::command::{Output, Workspace};
use crate::config::IpcConfig;
use crate::traits::WindowManager;
use log::debug;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// i3/sway-backed window manager.
#[derive(Debug, Clone)]
pub struct I3Wm {
    socket: PathBuf,
    timeout: Option<Duration>,
}

impl I3Wm {
    /// Create a handle for the socket at `socket`.
    ///
    /// No connection is opened eagerly; each method call opens a
    /// short-lived IPC request bounded by `timeout`.
    pub fn new(socket: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            socket: socket.into(),
            timeout,
        }
    }

    /// Resolve the socket from `config` or the environment.
    pub fn from_config(config: &IpcConfig) -> Result<Self, I3Error> {
        let socket = ipc::socket_path(config.socket_path.as_deref())?;
        Ok(Self::new(socket, config.timeout()))
    }

    /// The IPC socket this handle talks to.
    pub fn socket(&self) -> &std::path::Path {
        &self.socket
    }

    /// Send one request and return the reply payload.
    fn request(&self, kind: MessageType, payload: &str) -> Result<Vec<u8>, I3Error> {
        let mut stream = ipc::connect(&self.socket, self.timeout)?;
        ipc::write_message(&mut stream, kind.code(), payload.as_bytes())?;
        let reply = ipc::read_message(&mut stream)?;
        if reply.kind != kind.code() {
            return Err(I3Error::Protocol(format!(
                "expected reply type {}, got {}",
                kind.code(),
                reply.kind
            )));
        }
        Ok(reply.payload)
    }

    /// Run a command and check every result entry for success.
    fn run_command(&self, command: &str) -> Result<(), I3Error> {
        debug!("i3 command: {}", command);
        let reply = self.request(MessageType::RunCommand, command)?;
        let results: Vec<CommandResultJson> = serde_json::from_slice(&reply)?;
        match results.into_iter().find(|r| !r.success) {
            Some(failed) => Err(I3Error::Command(
                failed.error.unwrap_or_else(|| command.to_string()),
            )),
            None => Ok(()),
        }
    }
}

/// Quote `s` as an i3 command string argument.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

//  Minimal serde structs for the JSON we care about

/// Subset of an entry returned by `GET_OUTPUTS`.
#[derive(Deserialize)]
struct OutputJson {
    name: String,
    #[serde(default)]
    active: bool,
    /// sway does not report this field.
    #[serde(default)]
    primary: bool,
}

/// Subset of an entry returned by `GET_WORKSPACES`.
#[derive(Deserialize)]
struct WorkspaceJson {
    /// `-1` for workspaces without a number.
    num: i64,
    output: String,
    #[serde(default)]
    focused: bool,
}

/// One entry of a `RUN_COMMAND` reply.
#[derive(Deserialize)]
struct CommandResultJson {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

//  WindowManager implementation

impl WindowManager for I3Wm {
    type Error = I3Error;

    fn outputs(&self) -> Result<Vec<Output>, Self::Error> {
        let reply = self.request(MessageType::GetOutputs, "")?;
        let outputs: Vec<OutputJson> = serde_json::from_slice(&reply)?;
        Ok(outputs
            .into_iter()
            .map(|o| Output {
                name: o.name,
                active: o.active,
                primary: o.primary,
            })
            .collect())
    }

    fn workspaces(&self) -> Result<Vec<Workspace>, Self::Error> {
        let reply = self.request(MessageType::GetWorkspaces, "")?;
        let workspaces: Vec<WorkspaceJson> = serde_json::from_slice(&reply)?;
        Ok(workspaces
            .into_iter()
            .filter_map(|w| {
                // Named-only workspaces have no slot in the numbering.
                let num = u32::try_from(w.num).ok().filter(|n| *n > 0)?;
                Some(Workspace {
                    num,
                    output: w.output,
                    focused: w.focused,
                })
            })
            .collect())
    }

    fn move_container_to_workspace(&self, num: u32) -> Result<(), Self::Error> {
        self.run_command(&format!("move container to workspace number {}", num))
    }

    fn switch_to_workspace(&self, num: u32) -> Result<(), Self::Error> {
        self.run_command(&format!("workspace number {}", num))
    }

    fn move_current_workspace_to_output(&self, output: &str) -> Result<(), Self::Error> {
        self.run_command(&format!("move workspace to output {}", quote(output)))
    }
}
