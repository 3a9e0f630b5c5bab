//! Controller state machine.
//!
//! ```text
//! NotStarted → Initializing → Listening → ShuttingDown → Stopped
//!                   │              ▲
//!                   └──────────────┼──→ Stopped        (startup aborted)
//!                   └──→ ShuttingDown                  (signal during startup)
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenState {
    NotStarted,
    Initializing,
    Listening,
    ShuttingDown,
    Stopped,
}

impl ListenState {
    pub fn as_str(self) -> &'static str {
        match self {
            ListenState::NotStarted => "not_started",
            ListenState::Initializing => "initializing",
            ListenState::Listening => "listening",
            ListenState::ShuttingDown => "shutting_down",
            ListenState::Stopped => "stopped",
        }
    }

    /// Whether a shutdown request in this state runs the shutdown sequence.
    pub fn accepts_shutdown(self) -> bool {
        matches!(
            self,
            ListenState::NotStarted | ListenState::Initializing | ListenState::Listening
        )
    }
}

impl fmt::Display for ListenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
