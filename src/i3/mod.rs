//! i3 and sway implementations.
//!
//! This module provides concrete backends for the
//! [`WindowManager`](crate::traits::WindowManager) and
//! [`TriggerSource`](crate::traits::TriggerSource) traits, powered by the
//! i3 IPC protocol (which sway speaks as well).
//!
//! Nothing outside this module should reference i3 directly.

pub mod events;
pub mod ipc;
pub mod wm;
