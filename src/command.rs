//! Commands and types used throughout i3dist.
//!
//! This module defines the vocabulary that all components share:
//! [`Output`] and [`Workspace`] are the snapshots the window manager
//! reports, and [`Command`] describes every action that can be requested
//! over the control socket.

use crate::distributor::{self, PassError};
use crate::query;
use crate::traits::WindowManager;
use log::info;
use serde::{Deserialize, Serialize};

/// A display surface reported by the window manager.
///
/// Only `name` identifies an output across queries; nothing else is
/// carried over from one snapshot to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Unique name the window manager uses for this output (e.g. `"eDP-1"`).
    pub name: String,
    /// Whether the output is currently in use.
    pub active: bool,
    /// Whether the output is marked as the primary display.
    pub primary: bool,
}

/// A numbered workspace reported by the window manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Stable workspace number used for assignment (always `>= 1`).
    pub num: u32,
    /// Name of the output the workspace currently lives on.
    pub output: String,
    /// Whether this is the focused workspace.  At most one is.
    pub focused: bool,
}

/// Every action that can be requested over the control socket.
///
/// On the wire:
///
/// ```json
/// "Redistribute"
/// {"SwitchTo":3}
/// {"MoveContainerTo":4}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Request an out-of-schedule redistribution pass.
    Redistribute,

    /// Focus the workspace with the given number.
    SwitchTo(u32),

    /// Move the focused container to the workspace with the given number
    /// without following it.
    MoveContainerTo(u32),
}

/// Carry out a single [`Command`].
///
/// Must run on the thread that runs redistribution passes (the
/// [`Distributor`](crate::distributor::Distributor) loop does this), or a
/// manual switch could land between a pass's "focus N" and "move focused
/// workspace" commands.
pub fn dispatch<W: WindowManager>(wm: &W, cmd: Command) -> Result<(), PassError> {
    match cmd {
        Command::Redistribute => {
            info!("redistribution requested");
            distributor::redistribute(wm)
        }
        Command::SwitchTo(num) => {
            info!("switch to workspace {}", num);
            Ok(query::switch_to_workspace(wm, num)?)
        }
        Command::MoveContainerTo(num) => {
            info!("move container to workspace {}", num);
            Ok(query::move_container_to_workspace(wm, num)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct RecorderWm {
        log: RefCell<Vec<String>>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("recorder error")]
    struct RecorderError;

    impl WindowManager for RecorderWm {
        type Error = RecorderError;

        fn outputs(&self) -> Result<Vec<Output>, RecorderError> {
            Ok(vec![Output {
                name: "eDP-1".into(),
                active: true,
                primary: true,
            }])
        }

        fn workspaces(&self) -> Result<Vec<Workspace>, RecorderError> {
            Ok(vec![Workspace {
                num: 1,
                output: "eDP-1".into(),
                focused: true,
            }])
        }

        fn move_container_to_workspace(&self, num: u32) -> Result<(), RecorderError> {
            self.log.borrow_mut().push(format!("container -> {}", num));
            Ok(())
        }

        fn switch_to_workspace(&self, num: u32) -> Result<(), RecorderError> {
            self.log.borrow_mut().push(format!("switch {}", num));
            Ok(())
        }

        fn move_current_workspace_to_output(&self, output: &str) -> Result<(), RecorderError> {
            self.log.borrow_mut().push(format!("workspace -> {}", output));
            Ok(())
        }
    }

    #[test]
    fn deserialize_wire_commands() {
        let cmd: Command = serde_json::from_str(r#""Redistribute""#).unwrap();
        assert_eq!(cmd, Command::Redistribute);
        let cmd: Command = serde_json::from_str(r#"{"SwitchTo":3}"#).unwrap();
        assert_eq!(cmd, Command::SwitchTo(3));
        let cmd: Command = serde_json::from_str(r#"{"MoveContainerTo":7}"#).unwrap();
        assert_eq!(cmd, Command::MoveContainerTo(7));
    }

    #[test]
    fn negative_workspace_rejected() {
        assert!(serde_json::from_str::<Command>(r#"{"SwitchTo":-1}"#).is_err());
    }

    #[test]
    fn dispatch_switch_and_move_reach_the_wm() {
        let wm = RecorderWm::default();
        dispatch(&wm, Command::SwitchTo(2)).unwrap();
        dispatch(&wm, Command::MoveContainerTo(5)).unwrap();
        assert_eq!(*wm.log.borrow(), vec!["switch 2", "container -> 5"]);
    }

    #[test]
    fn dispatch_redistribute_runs_a_pass() {
        let wm = RecorderWm::default();
        dispatch(&wm, Command::Redistribute).unwrap();
        // Already in place: only the focus restore is issued.
        assert_eq!(*wm.log.borrow(), vec!["switch 1"]);
    }
}
