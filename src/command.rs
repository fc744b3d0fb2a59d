//! Command definitions
//!
//! Closed set of operations that can be run against a block index, and
//! their results. Front ends translate their own input into a `Command`
//! and hand it to `BlockIndex::execute`.

use crate::index::ChainStats;

/// A parsed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<K, V> {
    /// Insert a (key, value) pair
    Insert { key: K, value: V },

    /// Erase a (key, value) pair
    Erase { key: K, value: V },

    /// List every value stored under a key
    Query { key: K },

    /// List every pair in order
    List,

    /// Summarize the chain
    Stats,

    /// Check chain invariants and summarize
    Verify,
}

impl<K, V> Command<K, V> {
    /// Short lowercase name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Insert { .. } => "insert",
            Command::Erase { .. } => "erase",
            Command::Query { .. } => "query",
            Command::List => "list",
            Command::Stats => "stats",
            Command::Verify => "verify",
        }
    }

    /// Whether the command changes stored data
    pub fn is_mutation(&self) -> bool {
        matches!(self, Command::Insert { .. } | Command::Erase { .. })
    }
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<K, V> {
    /// Mutation applied (or was a no-op)
    Done,

    /// Values for a single key, ascending
    Values(Vec<V>),

    /// Pairs in compound order
    Pairs(Vec<(K, V)>),

    /// Chain summary
    Stats(ChainStats),
}
