//! The owned simulation instance a host drives one tick at a time.

use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use tracing::info;

use crate::{
    Position,
    agent::{Agent, TickContext, TickOutcome},
    arbiter::UnreachableSet,
    config::SimConfig,
    entities::{Door, Key},
    environment::{LayoutError, World},
    events::{EventLog, LoggedEvent},
    map::Grid,
    visibility::VisibilityTracker,
};

/// Read-only state handed to renderers and narrators.
#[derive(Debug, Serialize)]
pub struct SimulationView<'a> {
    pub tick: u64,
    pub width: usize,
    pub height: usize,
    pub walls: &'a Grid<bool>,
    pub loose_keys: &'a [Key],
    pub doors: &'a [Door],
    pub agent: &'a Agent,
    pub explored: &'a Grid<bool>,
    pub unreachable: &'a UnreachableSet,
    pub events: &'a [LoggedEvent],
}

#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    /// Pristine world and spawn reinstalled by [`Simulation::restart`].
    blueprint: World,
    spawn: Position,
    world: World,
    agent: Agent,
    visibility: VisibilityTracker,
    unreachable: UnreachableSet,
    rng: StdRng,
    events: EventLog,
    tick: u64,
}

impl Simulation {
    /// A fresh run on the standard layout sized by `config`.
    pub fn new(config: SimConfig) -> Self {
        let blueprint = World::standard(config.width, config.height);
        let spawn = config.start;
        Self::install(config, blueprint, spawn)
    }

    /// A fresh run on a parsed text layout. Dimensions and spawn come from
    /// the layout; `config.start` is kept for later standard resets.
    pub fn from_layout(layout: &str, mut config: SimConfig) -> Result<Self, LayoutError> {
        let (blueprint, spawn) = World::from_layout(layout)?;
        config.width = blueprint.width();
        config.height = blueprint.height();
        Ok(Self::install(config, blueprint, spawn))
    }

    fn install(config: SimConfig, blueprint: World, spawn: Position) -> Self {
        let mut visibility = VisibilityTracker::new(blueprint.width(), blueprint.height());
        visibility.reveal(spawn);
        Simulation {
            rng: StdRng::seed_from_u64(config.seed),
            world: blueprint.clone(),
            agent: Agent::new(spawn),
            visibility,
            unreachable: UnreachableSet::default(),
            events: EventLog::default(),
            tick: 0,
            config,
            blueprint,
            spawn,
        }
    }

    /// Advances by exactly one think or act step.
    ///
    /// Once halted, further calls do nothing and keep returning
    /// [`TickOutcome::Halted`].
    pub fn tick(&mut self) -> TickOutcome {
        if self.agent.is_halted() {
            return TickOutcome::Halted;
        }
        self.tick += 1;

        let mut emitted = Vec::new();
        let outcome = self.agent.step(
            TickContext {
                world: &mut self.world,
                visibility: &mut self.visibility,
                unreachable: &mut self.unreachable,
                memo_policy: self.config.memo_policy,
                rng: &mut self.rng,
            },
            &mut emitted,
        );
        for event in emitted {
            self.events.push(self.tick, event);
        }
        outcome
    }

    /// Ticks until the agent halts or `max_ticks` ticks have run.
    ///
    /// Returns the number of ticks executed.
    pub fn run_until_halt(&mut self, max_ticks: u64) -> u64 {
        let mut ran = 0;
        while ran < max_ticks && !self.is_halted() {
            self.tick();
            ran += 1;
        }
        ran
    }

    /// Rebuilds everything on the standard layout with new dimensions.
    ///
    /// The host is expected to pass odd dimensions of at least 5.
    pub fn reset(&mut self, width: usize, height: usize) {
        self.config.width = width;
        self.config.height = height;
        self.blueprint = World::standard(width, height);
        self.spawn = self.config.start;
        self.restart();
    }

    /// Starts over from the current blueprint, whether standard or parsed.
    pub fn restart(&mut self) {
        info!(
            width = self.blueprint.width(),
            height = self.blueprint.height(),
            seed = self.config.seed,
            "simulation reset"
        );
        self.world = self.blueprint.clone();
        self.agent = Agent::new(self.spawn);
        self.visibility = VisibilityTracker::new(self.blueprint.width(), self.blueprint.height());
        self.visibility.reveal(self.spawn);
        self.unreachable.clear();
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.events.clear();
        self.tick = 0;
    }

    pub fn is_halted(&self) -> bool {
        self.agent.is_halted()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn visibility(&self) -> &VisibilityTracker {
        &self.visibility
    }

    pub fn unreachable(&self) -> &UnreachableSet {
        &self.unreachable
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn view(&self) -> SimulationView<'_> {
        SimulationView {
            tick: self.tick,
            width: self.world.width(),
            height: self.world.height(),
            walls: self.world.map.walls(),
            loose_keys: self.world.entities.loose_keys(),
            doors: self.world.entities.doors(),
            agent: &self.agent,
            explored: self.visibility.mask(),
            unreachable: &self.unreachable,
            events: self.events.entries(),
        }
    }
}
