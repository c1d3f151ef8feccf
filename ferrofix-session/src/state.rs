/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Session lifecycle states.
//!
//! ```text
//! Disconnected → LogonPending → Active → LogoutPending → Disconnected
//!                                 ↕
//!                          AwaitingResend
//! ```
//!
//! `AwaitingResend` is a substate of `Active`: outbound traffic continues,
//! inbound application processing is buffered until the gap fills.

use std::fmt;

/// Runtime state of a FIX session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection established; no messages may be exchanged.
    Disconnected,
    /// Logon sent (initiator) or awaited (acceptor).
    LogonPending,
    /// Session is fully established.
    Active,
    /// Gap detected; a ResendRequest for `[begin, end]` is outstanding and
    /// inbound messages beyond the gap are buffered.
    AwaitingResend {
        /// First missing sequence number.
        begin: u64,
        /// Last missing sequence number.
        end: u64,
    },
    /// Logout sent or received; waiting for the transport to close.
    LogoutPending,
}

impl SessionState {
    /// Returns true if the session is logged on (including while a resend
    /// is in progress).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active | Self::AwaitingResend { .. })
    }

    /// Returns true if no connection is established.
    #[must_use]
    pub const fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Returns true if a resend is in progress.
    #[must_use]
    pub const fn is_awaiting_resend(&self) -> bool {
        matches!(self, Self::AwaitingResend { .. })
    }

    /// Returns a short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::LogonPending => "LogonPending",
            Self::Active => "Active",
            Self::AwaitingResend { .. } => "AwaitingResend",
            Self::LogoutPending => "LogoutPending",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingResend { begin, end } => {
                write!(f, "AwaitingResend({begin}..{end})")
            }
            other => write!(f, "{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_predicate() {
        assert!(SessionState::Active.is_active());
        assert!(SessionState::AwaitingResend { begin: 3, end: 5 }.is_active());
        assert!(!SessionState::Disconnected.is_active());
        assert!(!SessionState::LogonPending.is_active());
        assert!(!SessionState::LogoutPending.is_active());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::Active.to_string(), "Active");
        assert_eq!(
            SessionState::AwaitingResend { begin: 3, end: 5 }.to_string(),
            "AwaitingResend(3..5)"
        );
    }
}
