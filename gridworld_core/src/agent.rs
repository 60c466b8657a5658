use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    KeyColor, Position,
    arbiter::{Goal, GoalArbiter, UnreachableSet},
    config::MemoPolicy,
    entities::Key,
    environment::World,
    events::{SimEvent, Thought},
    pathfinding::PathFinder,
    visibility::VisibilityTracker,
};

/// Keys the agent carries, in pickup order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    keys: Vec<Key>,
}

impl Inventory {
    pub fn insert(&mut self, key: Key) {
        self.keys.push(key);
    }

    /// Whether a key of `color` is held.
    pub fn holds(&self, color: KeyColor) -> bool {
        self.keys.iter().any(|k| k.color == color)
    }

    pub fn colors(&self) -> impl Iterator<Item = KeyColor> + '_ {
        self.keys.iter().map(|k| k.color)
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Where the agent is in its think/act cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No goal; the next tick asks the arbiter for one.
    Idle,
    /// Goal fixed; the next tick only deliberates.
    Thinking,
    /// Goal fixed; the next tick takes a physical step.
    Acting,
    /// Arbitration came back empty. Only a reset leaves this state.
    Halted,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    Deliberated,
    Acted,
    Halted,
}

/// World-side state a tick reads and mutates.
pub(crate) struct TickContext<'a, R: ?Sized> {
    pub world: &'a mut World,
    pub visibility: &'a mut VisibilityTracker,
    pub unreachable: &'a mut UnreachableSet,
    pub memo_policy: MemoPolicy,
    pub rng: &'a mut R,
}

/// The single agent walking the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub position: Position,
    pub inventory: Inventory,
    pub goal: Option<Goal>,
    pub phase: Phase,
}

impl Agent {
    pub fn new(position: Position) -> Self {
        Agent {
            position,
            inventory: Inventory::default(),
            goal: None,
            phase: Phase::Idle,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.phase == Phase::Halted
    }

    /// Drops the current goal and falls back to arbitration.
    pub(crate) fn clear_goal(&mut self) -> Option<Goal> {
        self.phase = Phase::Idle;
        self.goal.take()
    }

    /// Advances the think/act cycle by one tick.
    ///
    /// Without a goal the arbiter is consulted first; a fresh goal is
    /// deliberated on in the same tick. An empty arbitration halts the agent
    /// for good.
    pub(crate) fn step<R: Rng + ?Sized>(
        &mut self,
        ctx: TickContext<'_, R>,
        events: &mut Vec<SimEvent>,
    ) -> TickOutcome {
        if self.is_halted() {
            return TickOutcome::Halted;
        }

        if self.goal.is_none() {
            let arbiter = GoalArbiter::new(
                &ctx.world.map,
                &ctx.world.entities,
                ctx.visibility,
                &self.inventory,
                self.position,
            );
            match arbiter.select(ctx.unreachable, ctx.rng) {
                Some(selection) => {
                    let at = selection.goal.position();
                    info!(x = at.x, y = at.y, pool = ?selection.pool, goal = ?selection.goal, "goal set");
                    self.goal = Some(selection.goal);
                    self.phase = Phase::Thinking;
                    events.push(SimEvent::GoalSet {
                        goal: selection.goal,
                        pool: selection.pool,
                    });
                }
                None => {
                    info!(keys = self.inventory.len(), "all goals complete");
                    self.phase = Phase::Halted;
                    events.push(SimEvent::AllComplete);
                    return TickOutcome::Halted;
                }
            }
        }

        match self.phase {
            Phase::Acting => {
                self.act(ctx, events);
                TickOutcome::Acted
            }
            _ => {
                self.think(events);
                TickOutcome::Deliberated
            }
        }
    }

    fn think(&mut self, events: &mut Vec<SimEvent>) {
        if let Some(goal) = self.goal {
            let thought = Thought::about(goal);
            debug!(?thought, "deliberating");
            events.push(SimEvent::Deliberated { thought });
        }
        self.phase = Phase::Acting;
    }

    fn act<R: Rng + ?Sized>(&mut self, ctx: TickContext<'_, R>, events: &mut Vec<SimEvent>) {
        let Some(goal) = self.goal else {
            self.phase = Phase::Idle;
            return;
        };

        let path = PathFinder::new(&ctx.world.map, &ctx.world.entities, &self.inventory)
            .find_path(self.position, goal.position());
        let Some(&next) = path.get(1) else {
            ctx.unreachable.mark(goal.position());
            self.clear_goal();
            debug!(?goal, "no path to goal, abandoning");
            events.push(SimEvent::GoalAbandoned { goal });
            return;
        };

        // A keyed door swings open before the agent steps through it.
        if let Some(color) = ctx.world.entities.try_open_door_at(next, &self.inventory) {
            info!(x = next.x, y = next.y, %color, "opened door");
            events.push(SimEvent::OpenedDoor { color });
        }

        self.position = next;
        ctx.visibility.reveal(next);
        debug!(x = next.x, y = next.y, "moved");
        events.push(SimEvent::MovedTo { at: next });

        let mut picked_up = false;
        while let Some(key) = ctx.world.entities.pickup_key_at(next) {
            info!(x = next.x, y = next.y, color = %key.color, "picked up key");
            events.push(SimEvent::PickedUp { color: key.color });
            self.inventory.insert(key);
            picked_up = true;
        }
        if let Some(color) = ctx.world.entities.try_open_door_at(next, &self.inventory) {
            info!(x = next.x, y = next.y, %color, "opened door");
            events.push(SimEvent::OpenedDoor { color });
        }

        if picked_up {
            self.clear_goal();
            if ctx.memo_policy == MemoPolicy::ResetOnPickup && !ctx.unreachable.is_empty() {
                trace!(cleared = ctx.unreachable.len(), "inventory changed, clearing unreachable memo");
                ctx.unreachable.clear();
            }
        } else {
            self.phase = Phase::Thinking;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        entities::EntityRegistry,
        map::{Grid, GridMap},
    };

    /// A 5x3 room whose only floor is the corridor (1,1)..=(3,1).
    fn corridor(keys: Vec<Key>) -> World {
        let walls = Grid::from_fn(5, 3, |p| p.y != 1 || p.x == 0 || p.x == 4);
        World {
            map: GridMap::from_walls(walls),
            entities: EntityRegistry::new(keys, Vec::new()),
        }
    }

    fn acting(at: Position, goal: Goal) -> Agent {
        Agent {
            goal: Some(goal),
            phase: Phase::Acting,
            ..Agent::new(at)
        }
    }

    fn step_once(
        agent: &mut Agent,
        world: &mut World,
        unreachable: &mut UnreachableSet,
        memo_policy: MemoPolicy,
    ) -> (TickOutcome, Vec<SimEvent>) {
        let mut visibility = VisibilityTracker::new(world.width(), world.height());
        let mut rng = StdRng::seed_from_u64(0);
        let mut events = Vec::new();
        let outcome = agent.step(
            TickContext {
                world,
                visibility: &mut visibility,
                unreachable,
                memo_policy,
                rng: &mut rng,
            },
            &mut events,
        );
        (outcome, events)
    }

    fn red_key_at(x: usize) -> Key {
        Key {
            position: Position::new(x, 1),
            color: KeyColor::Red,
        }
    }

    #[test]
    fn inventory_tracks_colors() {
        let mut inventory = Inventory::default();
        assert!(inventory.is_empty());
        inventory.insert(Key {
            position: Position::new(2, 2),
            color: KeyColor::Green,
        });
        assert!(inventory.holds(KeyColor::Green));
        assert!(!inventory.holds(KeyColor::Red));
        assert_eq!(inventory.colors().collect::<Vec<_>>(), vec![KeyColor::Green]);
    }

    #[test]
    fn stacked_keys_are_all_picked_up_in_one_step() {
        let cell = Position::new(2, 1);
        let blue = Key {
            position: cell,
            color: KeyColor::Blue,
        };
        let mut world = corridor(vec![red_key_at(2), blue]);
        let mut agent = acting(
            Position::new(1, 1),
            Goal::Key {
                at: cell,
                color: KeyColor::Red,
            },
        );
        let mut memo = UnreachableSet::default();

        let (outcome, events) =
            step_once(&mut agent, &mut world, &mut memo, MemoPolicy::default());

        assert_eq!(outcome, TickOutcome::Acted);
        assert_eq!(
            events,
            vec![
                SimEvent::MovedTo { at: cell },
                SimEvent::PickedUp { color: KeyColor::Red },
                SimEvent::PickedUp { color: KeyColor::Blue },
            ]
        );
        assert_eq!(
            agent.inventory.colors().collect::<Vec<_>>(),
            vec![KeyColor::Red, KeyColor::Blue]
        );
        assert!(world.entities.loose_keys().is_empty());
        assert_eq!(agent.goal, None);
        assert_eq!(agent.phase, Phase::Idle);
    }

    #[test]
    fn pickup_clears_memo_by_default() {
        let mut world = corridor(vec![red_key_at(2)]);
        let mut agent = acting(
            Position::new(1, 1),
            Goal::Key {
                at: Position::new(2, 1),
                color: KeyColor::Red,
            },
        );
        let mut memo = UnreachableSet::default();
        memo.mark(Position::new(3, 1));

        step_once(&mut agent, &mut world, &mut memo, MemoPolicy::ResetOnPickup);

        assert!(agent.inventory.holds(KeyColor::Red));
        assert!(memo.is_empty());
    }

    #[test]
    fn pickup_keeps_memo_when_kept_for_run() {
        let mut world = corridor(vec![red_key_at(2)]);
        let mut agent = acting(
            Position::new(1, 1),
            Goal::Key {
                at: Position::new(2, 1),
                color: KeyColor::Red,
            },
        );
        let mut memo = UnreachableSet::default();
        memo.mark(Position::new(3, 1));

        step_once(&mut agent, &mut world, &mut memo, MemoPolicy::KeepForRun);

        assert!(agent.inventory.holds(KeyColor::Red));
        assert_eq!(memo.len(), 1);
        assert!(memo.contains(Position::new(3, 1)));
    }

    #[test]
    fn plain_move_leaves_memo_alone() {
        let mut world = corridor(Vec::new());
        let mut agent = acting(
            Position::new(1, 1),
            Goal::Explore {
                at: Position::new(3, 1),
            },
        );
        let mut memo = UnreachableSet::default();
        memo.mark(Position::new(4, 4));

        step_once(&mut agent, &mut world, &mut memo, MemoPolicy::ResetOnPickup);

        assert_eq!(agent.position, Position::new(2, 1));
        assert_eq!(agent.phase, Phase::Thinking);
        assert!(memo.contains(Position::new(4, 4)));
    }

    #[test]
    fn goal_without_onward_step_is_abandoned() {
        let at = Position::new(3, 1);
        let goal = Goal::Explore { at };
        let mut world = corridor(Vec::new());
        let mut agent = acting(at, goal);
        let mut memo = UnreachableSet::default();

        let (outcome, events) =
            step_once(&mut agent, &mut world, &mut memo, MemoPolicy::default());

        assert_eq!(outcome, TickOutcome::Acted);
        assert_eq!(events, vec![SimEvent::GoalAbandoned { goal }]);
        assert!(memo.contains(at));
        assert_eq!(agent.goal, None);
        assert_eq!(agent.phase, Phase::Idle);
        assert_eq!(agent.position, at);
    }

    #[test]
    fn clearing_goal_returns_to_idle() {
        let mut agent = Agent::new(Position::new(1, 1));
        agent.goal = Some(Goal::Explore {
            at: Position::new(3, 3),
        });
        agent.phase = Phase::Acting;
        let dropped = agent.clear_goal();
        assert_eq!(dropped, Some(Goal::Explore { at: Position::new(3, 3) }));
        assert_eq!(agent.phase, Phase::Idle);
        assert!(agent.goal.is_none());
    }
}
