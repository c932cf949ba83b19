//! Output query layer.
//!
//! Stateless wrappers that turn backend errors into [`QueryError`] /
//! [`CommandError`], plus the pure helpers the assignment formula is built
//! from.  Nothing here retries or caches; every call goes to the window
//! manager.

use crate::command::{Output, Workspace};
use crate::traits::WindowManager;

/// Fetching outputs or workspaces failed (I/O or malformed reply).
#[derive(Debug, thiserror::Error)]
#[error("query failed: {0}")]
pub struct QueryError(String);

/// A switch or move command failed.
#[derive(Debug, thiserror::Error)]
#[error("command failed: {0}")]
pub struct CommandError(String);

//  Fallible queries and commands

/// All outputs, active and inactive.
pub fn list_outputs<W: WindowManager>(wm: &W) -> Result<Vec<Output>, QueryError> {
    wm.outputs().map_err(|e| QueryError(e.to_string()))
}

/// All workspaces, regardless of visibility or focus.
pub fn list_workspaces<W: WindowManager>(wm: &W) -> Result<Vec<Workspace>, QueryError> {
    wm.workspaces().map_err(|e| QueryError(e.to_string()))
}

/// Move the focused container to workspace `num` without switching to it.
pub fn move_container_to_workspace<W: WindowManager>(
    wm: &W,
    num: u32,
) -> Result<(), CommandError> {
    wm.move_container_to_workspace(num)
        .map_err(|e| CommandError(format!("move container to workspace {}: {}", num, e)))
}

/// Focus workspace `num`.
pub fn switch_to_workspace<W: WindowManager>(wm: &W, num: u32) -> Result<(), CommandError> {
    wm.switch_to_workspace(num)
        .map_err(|e| CommandError(format!("switch to workspace {}: {}", num, e)))
}

/// Move workspace `num` to the output named `output`.
///
/// A workspace can only be moved while it is focused, so this switches to
/// it first.  A failed switch is returned without attempting the move.
/// Either way focus may have changed; callers are expected to restore it.
pub fn move_workspace_to_output<W: WindowManager>(
    wm: &W,
    num: u32,
    output: &str,
) -> Result<(), CommandError> {
    switch_to_workspace(wm, num)?;
    wm.move_current_workspace_to_output(output).map_err(|e| {
        CommandError(format!(
            "move workspace {} to output {}: {}",
            num, output, e
        ))
    })
}

//  Pure helpers

/// Active outputs, in query order.
pub fn active_outputs(outputs: &[Output]) -> Vec<Output> {
    outputs.iter().filter(|o| o.active).cloned().collect()
}

/// Number of active outputs.
pub fn active_outputs_count(outputs: &[Output]) -> usize {
    outputs.iter().filter(|o| o.active).count()
}

/// Reorder `outputs` so primary outputs come first.
///
/// The sort is stable, so the remaining outputs keep their query order and
/// sorting twice yields the same order.
pub fn primary_first(outputs: &mut [Output]) {
    outputs.sort_by_key(|o| !o.primary);
}

/// Number of the focused workspace, if a numbered workspace has focus.
///
/// `None` is a normal state on i3: the user may be on a named-only
/// workspace, which never appears in the snapshot.
pub fn focused_workspace_num(workspaces: &[Workspace]) -> Option<u32> {
    workspaces.iter().find(|w| w.focused).map(|w| w.num)
}

/// Number of the focused workspace, or `1` if none is focused.
pub fn current_focused_workspace_num(workspaces: &[Workspace]) -> u32 {
    focused_workspace_num(workspaces).unwrap_or(1)
}

/// Highest workspace number, or `0` when there are no workspaces.
pub fn max_workspace_num(workspaces: &[Workspace]) -> u32 {
    workspaces.iter().map(|w| w.num).max().unwrap_or(0)
}

/// 1-based index into the primary-first active outputs where workspace
/// `num` belongs: `((num - 1) mod count) + 1`.
///
/// `active_count` must be non-zero; callers check for "no active outputs"
/// before getting here.
pub fn expected_output_index(num: u32, active_count: usize) -> usize {
    debug_assert!(active_count > 0, "expected_output_index with no outputs");
    (num.saturating_sub(1) as usize % active_count) + 1
}
