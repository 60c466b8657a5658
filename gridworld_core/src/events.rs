//! Append-only record of what the simulation did, for hosts to render or narrate.

use serde::{Deserialize, Serialize};

use crate::{
    KeyColor, Position,
    arbiter::{CandidatePool, Goal},
};

/// What the agent was deliberating about on a think tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Thought {
    HeadingToKey { color: KeyColor, at: Position },
    OpeningDoor { color: KeyColor, at: Position },
    Exploring { at: Position },
}

impl Thought {
    pub fn about(goal: Goal) -> Self {
        match goal {
            Goal::Key { at, color } => Thought::HeadingToKey { color, at },
            Goal::Door { at, color } => Thought::OpeningDoor { color, at },
            Goal::Explore { at } => Thought::Exploring { at },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    GoalSet { goal: Goal, pool: CandidatePool },
    Deliberated { thought: Thought },
    MovedTo { at: Position },
    PickedUp { color: KeyColor },
    OpenedDoor { color: KeyColor },
    /// No path to the goal; it was memoized and dropped.
    GoalAbandoned { goal: Goal },
    AllComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub tick: u64,
    #[serde(flatten)]
    pub event: SimEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<LoggedEvent>,
}

impl EventLog {
    pub fn push(&mut self, tick: u64, event: SimEvent) {
        self.entries.push(LoggedEvent { tick, event });
    }

    pub fn entries(&self) -> &[LoggedEvent] {
        &self.entries
    }

    /// The last `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> &[LoggedEvent] {
        &self.entries[self.entries.len().saturating_sub(n)..]
    }

    pub fn events(&self) -> impl Iterator<Item = &SimEvent> {
        self.entries.iter().map(|e| &e.event)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_window() {
        let mut log = EventLog::default();
        for tick in 0..5 {
            log.push(tick, SimEvent::MovedTo { at: Position::new(tick as usize, 1) });
        }
        assert_eq!(log.tail(2).len(), 2);
        assert_eq!(log.tail(2)[0].tick, 3);
        assert_eq!(log.tail(10).len(), 5);
        assert!(log.tail(0).is_empty());
    }

    #[test]
    fn thought_follows_goal_kind() {
        let at = Position::new(2, 2);
        assert_eq!(
            Thought::about(Goal::Key { at, color: KeyColor::Red }),
            Thought::HeadingToKey { color: KeyColor::Red, at }
        );
        assert_eq!(Thought::about(Goal::Explore { at }), Thought::Exploring { at });
    }
}
