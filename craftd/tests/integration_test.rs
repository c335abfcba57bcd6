//! Integration tests for craftd
//!
//! These drive the public API end to end against the simulated
//! collaborators, with a hand-advanced clock so every timing path is
//! deterministic.

use std::sync::{Arc, Mutex};

use craftd::clock::{Clock, ManualClock};
use craftd::collab::sim::{SimExecutor, SimInventory, SimMover, SimResolver, SimWorld};
use craftd::collab::{ActionIssuer, InventoryReader, JobExecutor, Mover, Resolver, WorldProbe};
use craftd::domain::{MaterialNeed, Plan, PlanStep, TaskStatus, Vec3};
use craftd::events::{Event, EventBus};
use craftd::fishing::{FishingConfig, FishingSession, FishingSpot, SessionState};
use craftd::workflow::{WorkflowConfig, WorkflowEngine, WorkflowState};

const OAK_LOG: u32 = 1;
const VARNISH: u32 = 2;
const OAK_PLANK: u32 = 10;
const OAK_TABLE: u32 = 11;

fn table_plan() -> Plan {
    Plan {
        craft_steps: vec![
            PlanStep {
                item_id: OAK_PLANK,
                name: "oak plank".into(),
                quantity: 4,
            },
            PlanStep {
                item_id: OAK_TABLE,
                name: "oak table".into(),
                quantity: 1,
            },
        ],
        gather_items: vec![MaterialNeed::new(OAK_LOG, "oak log", 8)],
        other_materials: vec![MaterialNeed::new(VARNISH, "varnish", 2)],
    }
}

struct CraftRig {
    inventory: Arc<SimInventory>,
    clock: Arc<ManualClock>,
    engine: WorkflowEngine,
}

fn craft_rig(bus: Option<&EventBus>, config: WorkflowConfig, gather_yield: f32) -> CraftRig {
    let inventory = Arc::new(SimInventory::new());
    let clock = ManualClock::new();
    let resolver = Arc::new(SimResolver::new().with_plan(OAK_TABLE, table_plan()));
    let crafter = Arc::new(SimExecutor::new("craft sim", inventory.clone()));
    let gatherer = Arc::new(SimExecutor::new("gather sim", inventory.clone()).with_yield_rate(gather_yield));

    let mut engine = WorkflowEngine::new(
        resolver as Arc<dyn Resolver>,
        inventory.clone() as Arc<dyn InventoryReader>,
        crafter as Arc<dyn JobExecutor>,
        gatherer as Arc<dyn JobExecutor>,
        clock.clone() as Arc<dyn Clock>,
    )
    .with_config(config);
    if let Some(bus) = bus {
        engine = engine.with_bus(bus);
    }

    CraftRig {
        inventory,
        clock,
        engine,
    }
}

/// Advance one second per tick until the engine settles, with a hard cap
fn run_to_terminal(rig: &mut CraftRig) {
    for _ in 0..300 {
        rig.clock.advance(1_000);
        rig.engine.update();
        if matches!(rig.engine.state(), WorkflowState::Completed | WorkflowState::Error) {
            return;
        }
    }
    panic!("workflow never reached a terminal state ({})", rig.engine.state());
}

// =============================================================================
// Workflow Tests
// =============================================================================

#[test]
fn test_full_workflow_gathers_then_crafts() {
    let mut rig = craft_rig(None, WorkflowConfig::default(), 1.0);
    rig.inventory.set_count(VARNISH, 5);

    rig.engine.start(OAK_TABLE, "oak table", 1);
    run_to_terminal(&mut rig);

    assert_eq!(rig.engine.state(), WorkflowState::Completed);
    assert!(!rig.engine.has_failures());
    assert_eq!(rig.inventory.count(OAK_TABLE), 1);
    assert!(rig.inventory.count(OAK_LOG) >= 8);
    assert_eq!(rig.inventory.count(OAK_PLANK), 4);

    // Every task settled terminally
    for task in rig.engine.gather_tasks().iter().chain(rig.engine.craft_tasks()) {
        assert!(task.status.is_terminal(), "{} not terminal", task.name);
    }
}

#[test]
fn test_prestocked_materials_skip_gathering() {
    let mut rig = craft_rig(None, WorkflowConfig::default(), 1.0);
    rig.inventory.set_count(OAK_LOG, 20);
    rig.inventory.set_count(VARNISH, 5);

    rig.engine.start(OAK_TABLE, "oak table", 1);
    run_to_terminal(&mut rig);

    assert_eq!(rig.engine.state(), WorkflowState::Completed);
    // Nothing was short, so the gather queue was never built
    assert!(rig.engine.gather_tasks().is_empty());
}

#[test]
fn test_lenient_run_continues_past_gather_failure() {
    // Gatherer accepts jobs but yields nothing, so every gather task retries
    // to exhaustion; a lenient run still proceeds to crafting.
    let mut rig = craft_rig(None, WorkflowConfig::default(), 0.0);
    rig.inventory.set_count(VARNISH, 5);

    rig.engine.start(OAK_TABLE, "oak table", 1);
    run_to_terminal(&mut rig);

    assert_eq!(rig.engine.state(), WorkflowState::Completed);
    assert!(rig.engine.has_failures());
    assert!(
        rig.engine
            .gather_tasks()
            .iter()
            .any(|t| t.status == TaskStatus::Failed)
    );
    // Crafting was still attempted
    assert!(!rig.engine.craft_tasks().is_empty());
}

#[test]
fn test_strict_run_halts_on_missing_materials() {
    let config = WorkflowConfig {
        strict_materials: true,
        ..Default::default()
    };
    // No varnish anywhere and nothing can produce it
    let mut rig = craft_rig(None, config, 1.0);

    rig.engine.start(OAK_TABLE, "oak table", 1);
    run_to_terminal(&mut rig);

    assert_eq!(rig.engine.state(), WorkflowState::Error);
    assert!(rig.engine.status_text().contains("varnish"));
}

#[test]
fn test_unknown_recipe_fails_in_resolution() {
    let mut rig = craft_rig(None, WorkflowConfig::default(), 1.0);

    rig.engine.start(999, "mystery box", 1);
    run_to_terminal(&mut rig);

    assert_eq!(rig.engine.state(), WorkflowState::Error);
    assert!(rig.engine.status_text().contains("no recipe"));
}

#[tokio::test]
async fn test_workflow_event_stream_ordering() {
    let bus = EventBus::with_default_capacity();
    let mut rx = bus.subscribe();

    let mut rig = craft_rig(Some(&bus), WorkflowConfig::default(), 1.0);
    rig.inventory.set_count(OAK_LOG, 20);
    rig.inventory.set_count(VARNISH, 5);

    rig.engine.start(OAK_TABLE, "oak table", 1);
    run_to_terminal(&mut rig);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    let started: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, Event::TaskStarted { .. }))
        .map(|(i, _)| i)
        .collect();
    let completed: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, Event::TaskCompleted { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(started.len(), 2, "one start per craft step");
    assert_eq!(completed.len(), 2);
    assert!(started[0] < completed[0], "start precedes completion");

    // Exactly one terminal workflow event, and it is the last workflow signal
    let finished: Vec<&Event> = events
        .iter()
        .filter(|e| matches!(e, Event::WorkflowCompleted { .. }))
        .collect();
    assert_eq!(finished.len(), 1);
    match finished[0] {
        Event::WorkflowCompleted {
            success, failed_tasks, ..
        } => {
            assert!(success);
            assert_eq!(*failed_tasks, 0);
        }
        _ => unreachable!(),
    }
}

// =============================================================================
// Fishing Tests
// =============================================================================

struct FishRig {
    clock: Arc<ManualClock>,
    session: FishingSession,
}

fn fish_rig(start: Vec3, bus: Option<&EventBus>) -> FishRig {
    let config = FishingConfig::default();
    let position = Arc::new(Mutex::new(start));

    let mut world = SimWorld::new(position.clone())
        .with_cast_action(config.cast_action_id)
        .with_dismount_action(config.dismount_action_id)
        .with_gp(700);
    world = world.with_buff(
        config.quality_buff.action_id,
        config.quality_buff.status_id,
        config.quality_buff.gp_cost,
    );
    let world = Arc::new(world);
    world.set_mounted(true);

    let mover = Arc::new(SimMover::new(position));
    let clock = ManualClock::new();

    let mut session = FishingSession::new(
        world.clone() as Arc<dyn WorldProbe>,
        mover as Arc<dyn Mover>,
        world as Arc<dyn ActionIssuer>,
        clock.clone() as Arc<dyn Clock>,
    )
    .with_config(config)
    .with_spots(vec![FishingSpot::new("pond", Vec3::new(0.0, 0.0, 0.0))]);
    if let Some(bus) = bus {
        session = session.with_emitter(bus.emitter_for("fishing"));
    }

    FishRig { clock, session }
}

#[test]
fn test_fishing_session_accumulates_catches() {
    let mut rig = fish_rig(Vec3::new(80.0, 0.0, 0.0), None);
    rig.session.start();

    let mut ticks = 0;
    while rig.session.catches() < 3 {
        ticks += 1;
        assert!(ticks < 2_000, "session never reached 3 catches ({:?})", rig.session.state());
        assert_ne!(rig.session.state(), SessionState::Error, "{:?}", rig.session.last_error());
        rig.clock.advance(500);
        rig.session.update();
    }

    assert_eq!(rig.session.catches(), 3);
    rig.session.stop();
    assert_eq!(rig.session.state(), SessionState::Stopped);
}

#[test]
fn test_fishing_requires_a_reachable_spot() {
    let mut rig = fish_rig(Vec3::new(5_000.0, 0.0, 0.0), None);
    rig.session.start();

    rig.clock.advance(500);
    rig.session.update();

    assert_eq!(rig.session.state(), SessionState::Error);
    assert!(rig.session.last_error().unwrap().contains("no fishing spot"));
}

#[tokio::test]
async fn test_fishing_emits_catch_events() {
    let bus = EventBus::with_default_capacity();
    let mut rx = bus.subscribe();

    let mut rig = fish_rig(Vec3::new(0.0, 0.0, 0.0), Some(&bus));
    rig.session.start();

    let mut ticks = 0;
    while rig.session.catches() < 2 {
        ticks += 1;
        assert!(ticks < 2_000, "session never reached 2 catches");
        rig.clock.advance(500);
        rig.session.update();
    }

    let mut catch_events = 0;
    while let Ok(event) = rx.try_recv() {
        if let Event::CatchRecorded { total, .. } = event {
            catch_events += 1;
            assert!(total <= 2);
        }
    }
    assert_eq!(catch_events, 2);
}
