//! The supervised redistribution loop.
//!
//! [`Distributor`] owns a [`WindowManager`] and runs one
//! [`redistribute`] pass every time it wakes: on a fixed timer, so missed
//! events heal themselves, and on every [`Trigger`](crate::traits::Trigger)
//! pulse.  Passes never overlap; the loop is strictly sequential.  Manual
//! [`Command`]s from [`Distributor::with_commands`] run on the same loop,
//! between passes.
//!
//! Failed passes are absorbed until `failure_threshold` of them happen in
//! a row, at which point [`Distributor::start`] returns
//! [`DistributorError::Fatal`].

use crate::command::{self, Command, Output, Workspace};
use crate::config::DistributorConfig;
use crate::query::{self, CommandError, QueryError};
use crate::traits::WindowManager;
use crossbeam_channel::{select, Receiver, Sender, TryRecvError};
use log::{debug, error, info, warn};
use std::sync::{Mutex, MutexGuard};

/// Why a single redistribution pass failed.
///
/// Every variant is transient: the next pass starts from a fresh snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Command(#[from] CommandError),
    /// No output is active, so no workspace has a valid target.
    #[error("no active outputs")]
    NoActiveOutputs,
}

/// Errors returned by [`Distributor::start`].
#[derive(Debug, thiserror::Error)]
pub enum DistributorError {
    /// `attempts` passes failed in a row; `source` is the last failure.
    #[error("giving up after {attempts} consecutive failed passes: {source}")]
    Fatal {
        attempts: u32,
        #[source]
        source: PassError,
    },
    /// `start` was called while this distributor was already running.
    #[error("distributor is already running")]
    AlreadyRunning,
}

/// Run one full redistribution pass.
///
/// Queries outputs and workspaces, moves every workspace that is not on
/// its expected output, and finally focuses the workspace that had focus
/// when the pass began.  The final switch is attempted even when a move
/// fails; the move error is still what gets returned.  When no numbered
/// workspace had focus (the user is on a named-only workspace) focus is
/// left alone.  Nothing is rolled back: a partially applied pass is
/// finished by the next one.
pub fn redistribute<W: WindowManager>(wm: &W) -> Result<(), PassError> {
    let outputs = query::list_outputs(wm)?;
    let workspaces = query::list_workspaces(wm)?;

    let mut active = query::active_outputs(&outputs);
    if active.is_empty() {
        return Err(PassError::NoActiveOutputs);
    }
    query::primary_first(&mut active);

    let focused = query::focused_workspace_num(&workspaces);
    debug!(
        "pass: {} of {} outputs active, {} workspaces (highest #{}), focus on {:?}",
        query::active_outputs_count(&outputs),
        outputs.len(),
        workspaces.len(),
        query::max_workspace_num(&workspaces),
        focused
    );

    let moved = move_misplaced(wm, &active, &workspaces);
    let restored = match focused {
        Some(num) => query::switch_to_workspace(wm, num),
        None => Ok(()),
    };
    if let (Err(_), Err(e)) = (&moved, &restored) {
        warn!("could not restore focus to workspace {:?}: {}", focused, e);
    }
    moved?;
    restored?;
    Ok(())
}

/// Move each workspace not on its expected output.  Stops at the first
/// failure.
fn move_misplaced<W: WindowManager>(
    wm: &W,
    active: &[Output],
    workspaces: &[Workspace],
) -> Result<(), CommandError> {
    for workspace in workspaces {
        let index = query::expected_output_index(workspace.num, active.len());
        let expected = &active[index - 1];
        if expected.name != workspace.output {
            debug!(
                "workspace {}: {} -> {}",
                workspace.num, workspace.output, expected.name
            );
            query::move_workspace_to_output(wm, workspace.num, &expected.name)?;
        }
    }
    Ok(())
}

//  Lifecycle

#[derive(Debug, Clone, Copy)]
enum Wake {
    Timer,
    Trigger,
    Command(Command),
    TriggersClosed,
    CommandsClosed,
}

#[derive(Debug, Default)]
struct Lifecycle {
    running: bool,
    /// Dropping this sender cancels the running loop.
    cancel: Option<Sender<()>>,
}

/// Background redistribution loop with a start/stop lifecycle.
///
/// `start` blocks the calling thread; `stop` may be called from any other
/// thread through a shared reference (e.g. an `Arc<Distributor<_>>`).
/// After the loop has returned, `start` may be called again.
///
/// Manual [`Command`]s attached with [`with_commands`](Self::with_commands)
/// run on the loop's thread between passes, so they never interleave with
/// the switch/move sequence of a pass.
pub struct Distributor<W: WindowManager> {
    wm: W,
    triggers: Receiver<()>,
    commands: Receiver<Command>,
    config: DistributorConfig,
    lifecycle: Mutex<Lifecycle>,
}

impl<W: WindowManager> Distributor<W> {
    /// Create a stopped distributor.
    ///
    /// `triggers` is usually the receiver from
    /// [`Trigger::channel`](crate::traits::Trigger::channel).
    pub fn new(wm: W, triggers: Receiver<()>, config: DistributorConfig) -> Self {
        Self {
            wm,
            triggers,
            commands: crossbeam_channel::never(),
            config,
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Also serve manual commands from `commands`.
    pub fn with_commands(mut self, commands: Receiver<Command>) -> Self {
        self.commands = commands;
        self
    }

    /// Shared reference to the window manager.
    pub fn wm(&self) -> &W {
        &self.wm
    }

    /// Whether a `start` call is currently inside the loop.
    pub fn is_running(&self) -> bool {
        self.lifecycle().running
    }

    /// Run the loop until [`stop`](Self::stop) is called or too many
    /// passes fail in a row.
    ///
    /// Returns `Ok(())` after a stop.
    pub fn start(&self) -> Result<(), DistributorError> {
        let cancel = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.running {
                return Err(DistributorError::AlreadyRunning);
            }
            let (tx, rx) = crossbeam_channel::bounded(0);
            lifecycle.running = true;
            lifecycle.cancel = Some(tx);
            rx
        };

        info!(
            "distributor started (interval {:?}, threshold {})",
            self.config.interval(),
            self.config.failure_threshold()
        );
        let result = self.run(cancel);

        let mut lifecycle = self.lifecycle();
        lifecycle.running = false;
        lifecycle.cancel = None;
        info!("distributor stopped");
        result
    }

    /// Ask a running loop to exit.
    ///
    /// A pass already in flight completes first.  Calling this when the
    /// loop is not running, or more than once, does nothing.  Stopping
    /// cannot fail, so there is nothing to return.
    pub fn stop(&self) {
        if self.lifecycle().cancel.take().is_some() {
            debug!("distributor stop requested");
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn run(&self, cancel: Receiver<()>) -> Result<(), DistributorError> {
        let threshold = self.config.failure_threshold();
        let ticker = crossbeam_channel::tick(self.config.interval());
        let mut triggers = self.triggers.clone();
        let mut commands = self.commands.clone();
        let mut failures = 0u32;

        loop {
            let wake = select! {
                recv(cancel) -> _ => return Ok(()),
                recv(ticker) -> _ => Wake::Timer,
                recv(triggers) -> msg => match msg {
                    Ok(()) => Wake::Trigger,
                    Err(_) => Wake::TriggersClosed,
                },
                recv(commands) -> msg => match msg {
                    Ok(cmd) => Wake::Command(cmd),
                    Err(_) => Wake::CommandsClosed,
                },
            };

            // A stop that raced with the wake still wins.
            if !matches!(cancel.try_recv(), Err(TryRecvError::Empty)) {
                return Ok(());
            }

            match wake {
                Wake::TriggersClosed => {
                    warn!("trigger channel closed, continuing on the timer only");
                    triggers = crossbeam_channel::never();
                    continue;
                }
                Wake::CommandsClosed => {
                    info!("command channel closed");
                    commands = crossbeam_channel::never();
                    continue;
                }
                Wake::Command(cmd) if cmd != Command::Redistribute => {
                    if let Err(e) = command::dispatch(&self.wm, cmd) {
                        warn!("command {:?} failed: {}", cmd, e);
                    }
                    continue;
                }
                Wake::Timer | Wake::Trigger | Wake::Command(_) => {}
            }

            debug!("redistributing ({:?})", wake);
            match redistribute(&self.wm) {
                Ok(()) => failures = 0,
                Err(e) => {
                    failures += 1;
                    if failures >= threshold {
                        error!(
                            "redistribution failed (attempt {}/{}): {}",
                            failures, threshold, e
                        );
                        return Err(DistributorError::Fatal {
                            attempts: failures,
                            source: e,
                        });
                    }
                    warn!(
                        "redistribution failed (attempt {}/{}): {}",
                        failures, threshold, e
                    );
                }
            }
        }
    }
}
