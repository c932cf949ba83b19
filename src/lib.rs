//! **i3dist** — keeps workspace-to-output assignment deterministic.
//!
//! Workspace `N` always lands on the same output for a given number of
//! active outputs: `((N - 1) mod count) + 1`, indexing the active outputs
//! with the primary output first.  Docking or undocking a laptop changes
//! the count, and every workspace is moved to where the formula says it
//! belongs.
//!
//! # Architecture
//!
//! * [`query`] — thin, fallible wrappers over the window manager plus the
//!   pure helpers the formula needs.
//! * [`distributor`] — the supervised background loop that wakes on a
//!   timer or a [`Trigger`](traits::Trigger) pulse and runs one
//!   redistribution pass per wake.
//!
//! The window manager and the trigger transports are abstracted by the
//! traits in [`traits`]; concrete implementations live in [`i3`] (i3/sway
//! IPC) and [`ipc`] (Unix-socket control listener).

pub mod command;
pub mod config;
pub mod distributor;
pub mod i3;
pub mod ipc;
pub mod query;
pub mod traits;
