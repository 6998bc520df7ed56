/// Phase definitions for the pagination walker
///
/// This module defines every phase the walker moves through while visiting a
/// listing page, and which moves between phases are legal.
use std::fmt;

/// Represents the current phase of the pagination walker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkerPhase {
    // ===== Per-page phases =====
    /// Waiting for the current listing page to show its content marker
    Loading,

    /// The listing page is loaded and can be read
    Ready,

    /// Reading item stubs off the listing page
    Extracting,

    /// Detail fetches for the page's stubs are in flight
    Dispatching,

    /// Looking for, and following, the "next page" control
    Paginating,

    // ===== Terminal phases =====
    /// The listing page never became ready; accumulated records still get flushed
    Failed,

    /// The walk is over and the final output has been requested
    Done,
}

impl WalkerPhase {
    /// Returns true if no further page work happens in this phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// ```text
    /// Loading -> Ready -> Extracting -> Dispatching -> Paginating -> Loading
    ///    |                                                  |
    ///    +--> Failed --> Done <-----------------------------+
    /// ```
    pub fn can_transition_to(&self, next: WalkerPhase) -> bool {
        matches!(
            (self, next),
            (Self::Loading, Self::Ready)
                | (Self::Loading, Self::Failed)
                | (Self::Ready, Self::Extracting)
                | (Self::Extracting, Self::Dispatching)
                | (Self::Dispatching, Self::Paginating)
                | (Self::Paginating, Self::Loading)
                | (Self::Paginating, Self::Done)
                | (Self::Failed, Self::Done)
        )
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Extracting => "extracting",
            Self::Dispatching => "dispatching",
            Self::Paginating => "paginating",
            Self::Failed => "failed",
            Self::Done => "done",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Loading,
            Self::Ready,
            Self::Extracting,
            Self::Dispatching,
            Self::Paginating,
            Self::Failed,
            Self::Done,
        ]
    }
}

impl fmt::Display for WalkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
