//! Core traits that decouple i3dist from any specific window manager or
//! transport mechanism.
//!
//! Every concrete backend (i3 IPC, a Unix-socket listener, a test harness,
//! …) implements one of these traits.  The
//! [`Distributor`](crate::distributor::Distributor) only depends on these
//! abstractions.

use crate::command::{Command, Output, Workspace};
use crossbeam_channel::{Receiver, Sender, TrySendError};

/// Abstraction over a window manager that reports outputs and workspaces
/// and can move workspaces around.
///
/// An implementation might talk to i3 or sway via IPC, or it might be an
/// in-memory stub used in tests.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// Return every output, active or not.
    fn outputs(&self) -> Result<Vec<Output>, Self::Error>;

    /// Return every numbered workspace, visible or not.
    fn workspaces(&self) -> Result<Vec<Workspace>, Self::Error>;

    /// Move the focused container to workspace `num` without following it.
    ///
    /// If the workspace does not exist the window manager may silently do
    /// nothing; that is not reported as an error.
    fn move_container_to_workspace(&self, num: u32) -> Result<(), Self::Error>;

    /// Focus workspace `num`.
    fn switch_to_workspace(&self, num: u32) -> Result<(), Self::Error>;

    /// Move the **focused** workspace to the output named `output`.
    ///
    /// Window managers only allow moving the workspace that has focus; see
    /// [`query::move_workspace_to_output`](crate::query::move_workspace_to_output)
    /// for the composite that focuses first.
    fn move_current_workspace_to_output(&self, output: &str) -> Result<(), Self::Error>;
}

//  Triggers

/// Sending half of the trigger channel.
///
/// One pulse asks for one redistribution pass.  The queue holds at most
/// one pending pulse: pulsing while a pulse is already queued is a no-op,
/// so bursts collapse into a single pass that still runs after the burst.
#[derive(Debug, Clone)]
pub struct Trigger {
    tx: Sender<()>,
}

impl Trigger {
    /// Create a coalescing trigger and the receiver the distributor reads.
    pub fn channel() -> (Trigger, Receiver<()>) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        (Trigger { tx }, rx)
    }

    /// Request a pass.  Returns `false` once the receiving side is gone.
    pub fn pulse(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Disconnected(())) => false,
        }
    }
}

/// A source of [`Trigger`] pulses.
///
/// Implementations watch some transport (window-manager events, a timer
/// in another process, a test harness, …) and pulse `trigger` whenever a
/// redistribution may be needed.
///
/// # Contract
///
/// * [`run`](TriggerSource::run) **blocks** until the source is exhausted,
///   the trigger's receiver is dropped, or an unrecoverable error occurs.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait TriggerSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start watching and pulse `trigger` for every relevant occurrence.
    fn run(&mut self, trigger: Trigger) -> Result<(), Self::Error>;
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport — a Unix socket, an in-memory
/// channel, … — and forward parsed commands into the provided [`Sender`],
/// whose receiver is normally handed to
/// [`Distributor::with_commands`](crate::distributor::Distributor::with_commands).
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    ///
    /// This method blocks the calling thread.  To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: Sender<Command>) -> Result<(), Self::Error>;
}
