use serde::{Deserialize, Serialize};

use crate::Position;

/// What happens to the unreachable memo when the agent picks up a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoPolicy {
    /// Forget every memoized cell when the inventory grows. A new key is the
    /// only thing that can turn an unreachable target reachable again.
    #[default]
    ResetOnPickup,
    /// Keep memoized cells until the next reset, even if a new key would now
    /// open a path to them.
    KeepForRun,
}

/// Simulation parameters. Every field has a default, so partial config files load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: usize,
    pub height: usize,
    /// Spawn cell of the agent in the standard layout.
    pub start: Position,
    /// Seed for candidate shuffling. Reapplied on every reset.
    pub seed: u64,
    pub memo_policy: MemoPolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            width: 12,
            height: 12,
            start: Position::new(1, 1),
            seed: 0,
            memo_policy: MemoPolicy::default(),
        }
    }
}
