use gridworld_core::{
    CandidatePool, Goal, GoalArbiter, KeyColor, MemoPolicy, Position, SimConfig, SimEvent,
    Simulation, World,
};
use rand::{SeedableRng, rngs::StdRng};

const TICK_BUDGET: u64 = 20_000;

fn config(seed: u64) -> SimConfig {
    SimConfig {
        seed,
        ..SimConfig::default()
    }
}

/// Runs a fresh arbitration pass against the simulation's current state.
fn arbitrate(sim: &Simulation) -> Option<Goal> {
    let world = sim.world();
    let arbiter = GoalArbiter::new(
        &world.map,
        &world.entities,
        sim.visibility(),
        &sim.agent().inventory,
        sim.agent().position,
    );
    let mut memo = sim.unreachable().clone();
    arbiter
        .select(&mut memo, &mut StdRng::seed_from_u64(99))
        .map(|s| s.goal)
}

#[test]
fn standard_twelve_grid_collects_everything_then_halts() {
    for seed in 0..8 {
        let mut sim = Simulation::new(config(seed));
        sim.run_until_halt(TICK_BUDGET);

        assert!(sim.is_halted(), "seed {seed} did not halt");
        for color in KeyColor::ALL {
            assert!(
                sim.agent().inventory.holds(color),
                "seed {seed} missing {color} key"
            );
        }
        assert!(sim.world().entities.loose_keys().is_empty());
        assert!(
            sim.world().entities.doors().iter().all(|d| d.is_open),
            "seed {seed} left a door closed"
        );
        assert_eq!(sim.events().events().last(), Some(&SimEvent::AllComplete));
        assert_eq!(arbitrate(&sim), None);
    }
}

#[test]
fn adjacent_key_is_first_goal_and_collected_first() {
    for seed in 0..8 {
        let mut sim = Simulation::new(config(seed));
        sim.tick();
        assert_eq!(
            sim.agent().goal,
            Some(Goal::Key {
                at: Position::new(2, 2),
                color: KeyColor::Red
            })
        );

        while !sim
            .events()
            .events()
            .any(|e| matches!(e, SimEvent::PickedUp { .. }))
        {
            sim.tick();
            assert!(sim.tick_count() < 20, "key pickup took too long");
        }

        let goals: Vec<_> = sim
            .events()
            .events()
            .filter_map(|e| match e {
                SimEvent::GoalSet { goal, pool } => Some((*goal, *pool)),
                _ => None,
            })
            .collect();
        assert_eq!(goals.len(), 1, "seed {seed}: another goal preceded the pickup");
        assert_eq!(goals[0].1, CandidatePool::VisibleKey);
        assert!(
            sim.events()
                .events()
                .any(|e| *e == SimEvent::PickedUp { color: KeyColor::Red })
        );
    }
}

/// The red door at (6,1) is walled in on all four sides; it can be seen
/// diagonally from (5,2) but never entered.
const SEALED_DOOR: &str = "
    WL WL WL WL WL WL WL WL
    WL ST BL KR BL WL DR WL
    WL BL BL BL BL BL WL WL
    WL WL WL WL WL WL WL WL
";

#[test]
fn walled_in_door_is_memoized_and_never_targeted() {
    let door = Position::new(6, 1);
    for policy in [MemoPolicy::ResetOnPickup, MemoPolicy::KeepForRun] {
        for seed in 0..4 {
            let cfg = SimConfig {
                seed,
                memo_policy: policy,
                ..SimConfig::default()
            };
            let mut sim = Simulation::from_layout(SEALED_DOOR, cfg).expect("layout");
            sim.run_until_halt(TICK_BUDGET);

            assert!(sim.is_halted());
            assert!(sim.agent().inventory.holds(KeyColor::Red));
            assert!(sim.unreachable().contains(door), "{policy:?}/{seed}");
            assert!(!sim.world().entities.door_at(door).is_some_and(|d| d.is_open));
            assert!(!sim.events().events().any(|e| matches!(
                e,
                SimEvent::GoalSet { goal, .. } if goal.position() == door
            )));
            assert_eq!(arbitrate(&sim), None);
        }
    }
}

#[test]
fn reset_mid_run_matches_fresh_run() {
    let mut sim = Simulation::new(SimConfig {
        width: 13,
        height: 13,
        seed: 5,
        ..SimConfig::default()
    });
    sim.run_until_halt(120);
    assert!(!sim.agent().inventory.is_empty());
    assert!(sim.visibility().explored_count() > 9);

    sim.reset(13, 13);
    let fresh = Simulation::new(SimConfig {
        width: 13,
        height: 13,
        seed: 5,
        ..SimConfig::default()
    });

    assert!(sim.agent().inventory.is_empty());
    assert!(sim.agent().goal.is_none());
    assert!(sim.unreachable().is_empty());
    assert!(sim.events().is_empty());
    assert_eq!(sim.tick_count(), 0);
    assert_eq!(sim.visibility(), fresh.visibility());
    assert_eq!(sim.world(), fresh.world());
    assert_eq!(sim.world(), &World::standard(13, 13));
    assert_eq!(sim.agent(), fresh.agent());

    // Same seed, same layout: the replay is identical.
    let mut fresh = fresh;
    sim.run_until_halt(300);
    fresh.run_until_halt(300);
    assert_eq!(sim.events(), fresh.events());
}

#[test]
fn reset_to_new_dimensions() {
    let mut sim = Simulation::new(config(1));
    sim.run_until_halt(50);
    sim.reset(15, 11);
    assert_eq!((sim.world().width(), sim.world().height()), (15, 11));
    assert_eq!(sim.world(), &World::standard(15, 11));
    assert_eq!(sim.visibility().explored_count(), 9);
    assert_eq!(sim.agent().position, Position::new(1, 1));
}

#[test]
fn same_seed_replays_identically() {
    let mut a = Simulation::new(config(42));
    let mut b = Simulation::new(config(42));
    a.run_until_halt(TICK_BUDGET);
    b.run_until_halt(TICK_BUDGET);
    assert_eq!(a.events(), b.events());
    assert_eq!(a.tick_count(), b.tick_count());
}
