//! Process exit codes for the launcher.

/// Every step completed (the serve command exited cleanly).
pub const OK: i32 = 0;
/// One of the npm build/serve commands exited unsuccessfully.
pub const COMMAND_FAILED: i32 = 1;
/// Anything not caught by the build/serve runner: installer failures,
/// commands that could not be spawned, unreadable configuration.
pub const UNHANDLED: i32 = 2;
