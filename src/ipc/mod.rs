//! Control socket for manual commands.
//!
//! Scripts and key bindings can connect to the socket and send
//! newline-delimited JSON [`Command`](crate::command::Command)s, e.g. to
//! force a redistribution right after changing the monitor layout.

pub mod listener;
