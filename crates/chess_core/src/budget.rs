//! Search budgets handed to move providers.
//!
//! A budget bounds a single move request. Premove requests and fallback
//! requests each carry their own budget; the provider decides how to honour it
//! (for a UCI engine it becomes the arguments of the `go` command).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Limit on how much work a provider may spend on one move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchBudget {
    /// Fixed search depth in plies
    Depth(u8),
    /// Fixed thinking time per move
    MoveTime(Duration),
    /// Fixed number of nodes
    Nodes(u64),
}

impl SearchBudget {
    /// Create a depth-only budget.
    pub fn depth(depth: u8) -> Self {
        SearchBudget::Depth(depth.max(1))
    }

    /// Create a time-only budget from milliseconds.
    pub fn movetime_ms(ms: u64) -> Self {
        SearchBudget::MoveTime(Duration::from_millis(ms.max(1)))
    }

    /// Create a node-count budget.
    pub fn nodes(nodes: u64) -> Self {
        SearchBudget::Nodes(nodes.max(1))
    }

    /// Arguments for a UCI `go` command.
    pub fn go_command(&self) -> String {
        match self {
            SearchBudget::Depth(d) => format!("go depth {}", d),
            SearchBudget::MoveTime(t) => format!("go movetime {}", t.as_millis()),
            SearchBudget::Nodes(n) => format!("go nodes {}", n),
        }
    }

    /// Wall-clock time a well-behaved provider is expected to need, if the
    /// budget says anything about time at all.
    pub fn expected_time(&self) -> Option<Duration> {
        match self {
            SearchBudget::MoveTime(t) => Some(*t),
            SearchBudget::Depth(_) | SearchBudget::Nodes(_) => None,
        }
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self::depth(1)
    }
}

impl fmt::Display for SearchBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchBudget::Depth(d) => write!(f, "depth {}", d),
            SearchBudget::MoveTime(t) => write!(f, "{} ms", t.as_millis()),
            SearchBudget::Nodes(n) => write!(f, "{} nodes", n),
        }
    }
}

#[cfg(test)]
#[path = "budget_tests.rs"]
mod budget_tests;
