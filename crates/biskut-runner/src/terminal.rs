//! Caller terminal handling
//!
//! The caller's terminal mode is process-wide state. [`RawModeGuard`] only
//! touches it when stdin is a terminal and raw mode is not already active,
//! and it restores the saved mode exactly once: explicitly through
//! [`RawModeGuard::restore`] or, failing that, on drop.

use crossterm::terminal;
use std::io::{self, IsTerminal};
use tracing::{debug, warn};

/// Fallback pty size when the caller has no terminal.
pub const FALLBACK_SIZE: (u16, u16) = (24, 80);

/// Restores the caller's terminal mode when released.
#[derive(Debug)]
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    /// Enter raw mode if stdin is an interactive terminal.
    ///
    /// Returns an inactive guard (a no-op) when there is no terminal or
    /// when raw mode is already enabled by someone else, since restoring
    /// it would then undo their change.
    pub fn engage() -> io::Result<Self> {
        if !io::stdin().is_terminal() {
            debug!("stdin is not a terminal; leaving mode untouched");
            return Ok(Self::inactive());
        }
        if terminal::is_raw_mode_enabled()? {
            debug!("raw mode already enabled by caller");
            return Ok(Self::inactive());
        }
        terminal::enable_raw_mode()?;
        debug!("Entered raw mode");
        Ok(Self { active: true })
    }

    /// A guard that owns nothing.
    #[must_use]
    pub fn inactive() -> Self {
        Self { active: false }
    }

    /// Whether this guard changed the terminal mode.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Restore the saved mode. Failure is logged, never escalated.
    pub fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        match terminal::disable_raw_mode() {
            Ok(()) => debug!("Restored terminal mode"),
            Err(e) => warn!("Failed to restore terminal state: {}", e),
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Caller terminal size as `(rows, cols)`.
pub fn size() -> (u16, u16) {
    match terminal::size() {
        Ok((cols, rows)) if cols > 0 && rows > 0 => (rows, cols),
        _ => FALLBACK_SIZE,
    }
}
