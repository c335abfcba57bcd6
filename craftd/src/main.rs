//! craftd - supervised orchestration demo binary
//!
//! Wires the workflow engine and fishing session to the simulated
//! collaborators and drives them with a single cooperative tick loop,
//! streaming bus events to stdout.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use craftd::cli::{Cli, Command};
use craftd::clock::SystemClock;
use craftd::collab::InventoryReader;
use craftd::collab::sim::{SimExecutor, SimInventory, SimMover, SimResolver, SimWorld};
use craftd::config::Config;
use craftd::domain::{MaterialNeed, Plan, PlanStep, TaskStatus, Vec3};
use craftd::events::{Event, EventBus, create_event_bus};
use craftd::fishing::{FishingSession, SessionState};
use craftd::workflow::{WorkflowConfig, WorkflowEngine, WorkflowState};

/// Tick interval for the outer drive loop; each component applies its own
/// poll gate on top of this.
const DRIVE_INTERVAL: Duration = Duration::from_millis(100);

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("craftd")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Level priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("craftd.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Craft {
            item_id,
            quantity,
            buffer,
            strict,
            solver,
        } => cmd_craft(&config, item_id, quantity, buffer, strict, solver).await,
        Command::Fish { catches } => cmd_fish(&config, catches).await,
    }
}

/// Run one gather-then-craft workflow against the simulated executors
async fn cmd_craft(
    config: &Config,
    item_id: u32,
    quantity: u32,
    buffer: u32,
    strict: bool,
    solver: Option<String>,
) -> Result<()> {
    debug!(item_id, quantity, buffer, strict, ?solver, "cmd_craft: called");

    let bus = create_event_bus();
    spawn_event_printer(&bus);

    let inventory = Arc::new(SimInventory::new());
    // Pre-supplied materials the executors cannot obtain
    inventory.set_count(VARNISH, 10);

    let resolver = Arc::new(demo_resolver());
    let crafter = Arc::new(SimExecutor::new("craft sim", inventory.clone()));
    let gatherer = Arc::new(SimExecutor::new("gather sim", inventory.clone()));
    let clock = Arc::new(SystemClock::new());

    let workflow_config = WorkflowConfig {
        strict_materials: strict || config.workflow.strict_materials,
        quantity_buffer: buffer.max(config.workflow.quantity_buffer),
        craft_solver: solver.or_else(|| config.workflow.craft_solver.clone()),
    };

    let mut engine = WorkflowEngine::new(resolver, inventory.clone(), crafter, gatherer, clock)
        .with_config(workflow_config)
        .with_orchestrator_config(config.orchestrator.clone())
        .with_bus(&bus);

    let name = demo_item_name(item_id);
    println!("Crafting {} x{}", name.bold(), quantity);
    println!();

    engine.start(item_id, name.clone(), quantity);

    let mut ticker = tokio::time::interval(DRIVE_INTERVAL);
    loop {
        ticker.tick().await;
        engine.update();
        if matches!(engine.state(), WorkflowState::Completed | WorkflowState::Error) {
            break;
        }
    }

    // Let the printer drain before the summary
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!();
    print_task_summary("Gathered", engine.gather_tasks());
    print_task_summary("Crafted", engine.craft_tasks());
    println!("Final count of {}: {}", name, inventory.count(item_id));

    if engine.state() == WorkflowState::Error {
        println!("{} {}", "Workflow error:".red(), engine.status_text());
        std::process::exit(1);
    }
    if engine.has_failures() {
        println!("{}", "Workflow finished with failures".red());
        std::process::exit(1);
    }
    println!("{}", "Workflow completed".green());
    Ok(())
}

/// Run a fishing session against the simulated world
async fn cmd_fish(config: &Config, catches: Option<u32>) -> Result<()> {
    debug!(?catches, "cmd_fish: called");

    let bus = create_event_bus();
    spawn_event_printer(&bus);

    let fishing = config.fishing.clone();

    // Start away from the spot and mounted, so navigation and the full
    // pre-fish sequence are exercised.
    let position = Arc::new(Mutex::new(Vec3::new(120.0, 0.0, 30.0)));
    let mut world = SimWorld::new(position.clone())
        .with_cast_action(fishing.cast_action_id)
        .with_dismount_action(fishing.dismount_action_id)
        .with_gp(700);
    if fishing.cordial.enabled {
        world = world.with_cordial(fishing.cordial.action_id, fishing.cordial.gp_restored);
    }
    for buff in [&fishing.quality_buff, &fishing.secondary_buff] {
        if buff.enabled {
            world = world.with_buff(buff.action_id, buff.status_id, buff.gp_cost);
        }
    }
    let world = Arc::new(world);
    world.set_mounted(true);

    let mover = Arc::new(SimMover::new(position));
    let clock = Arc::new(SystemClock::new());

    let mut session = FishingSession::new(world.clone(), mover, world.clone(), clock)
        .with_config(fishing)
        .with_emitter(bus.emitter_for("fishing"));

    match catches {
        Some(n) => println!("Fishing until {} catches (Ctrl+C to stop)", n),
        None => println!("Fishing until Ctrl+C"),
    }
    println!();

    session.start();

    let mut ticker = tokio::time::interval(DRIVE_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.update();
                if let Some(n) = catches {
                    if session.catches() >= n {
                        session.stop();
                    }
                }
                if session.state().is_terminal() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("cmd_fish: ctrl_c received");
                session.stop();
                break;
            }
        }
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    println!();
    println!("Catches: {}", session.catches());
    if session.state() == SessionState::Error {
        if let Some(error) = session.last_error() {
            println!("{} {}", "Session error:".red(), error);
        }
        std::process::exit(1);
    }
    Ok(())
}

// === Demo environment ===

const OAK_LOG: u32 = 1;
const VARNISH: u32 = 2;
const PINE_LOG: u32 = 3;
const OAK_PLANK: u32 = 10;
const OAK_TABLE: u32 = 11;
const PINE_CHAIR: u32 = 12;
const PINE_PLANK: u32 = 13;

/// Single-unit recipes; the resolver scales them to the requested quantity
fn demo_resolver() -> SimResolver {
    SimResolver::new()
        .with_plan(
            OAK_TABLE,
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
            },
        )
        .with_plan(
            PINE_CHAIR,
            Plan {
                craft_steps: vec![
                    PlanStep {
                        item_id: PINE_PLANK,
                        name: "pine plank".into(),
                        quantity: 3,
                    },
                    PlanStep {
                        item_id: PINE_CHAIR,
                        name: "pine chair".into(),
                        quantity: 1,
                    },
                ],
                gather_items: vec![MaterialNeed::new(PINE_LOG, "pine log", 6)],
                other_materials: vec![],
            },
        )
}

fn demo_item_name(item_id: u32) -> String {
    match item_id {
        OAK_TABLE => "oak table".to_string(),
        PINE_CHAIR => "pine chair".to_string(),
        _ => format!("item {item_id}"),
    }
}

// === Event streaming ===

fn spawn_event_printer(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            print_event(&event);
        }
    });
}

fn print_event(event: &Event) {
    let tag = format!("[{}]", event.source()).cyan();
    match event {
        Event::WorkflowStateChanged { from, to, .. } | Event::SessionStateChanged { from, to, .. } => {
            println!("{} {} -> {}", tag, from.dimmed(), to.bold());
        }
        Event::StatusChanged { message, .. } => {
            println!("{} {}", tag, message.dimmed());
        }
        Event::WorkflowCompleted {
            success, failed_tasks, ..
        } => {
            if *success {
                println!("{} {}", tag, "workflow completed".green());
            } else {
                println!("{} {} ({} tasks failed)", tag, "workflow finished with failures".red(), failed_tasks);
            }
        }
        Event::TaskStarted { name, quantity, .. } => {
            println!("{} started {} x{}", tag, name.bold(), quantity);
        }
        Event::TaskCompleted { name, confirmed, .. } => {
            println!("{} {} {} (confirmed {})", tag, "completed".green(), name, confirmed);
        }
        Event::TaskFailed { name, reason, .. } => {
            println!("{} {} {}: {}", tag, "failed".red(), name, reason);
        }
        Event::CatchRecorded { total, .. } => {
            println!("{} {} (total {})", tag, "catch!".green().bold(), total);
        }
        Event::Error { context, message, .. } => {
            println!("{} {} [{}] {}", tag, "error".red().bold(), context, message);
        }
        Event::Warning { context, message, .. } => {
            println!("{} {} [{}] {}", tag, "warning".yellow(), context, message);
        }
    }
}

fn print_task_summary(label: &str, tasks: &[craftd::domain::Task]) {
    if tasks.is_empty() {
        return;
    }
    println!("{}:", label);
    for task in tasks {
        let status = match task.status {
            TaskStatus::Completed => "done".green(),
            TaskStatus::Skipped => "skipped".yellow(),
            TaskStatus::Failed => "failed".red(),
            _ => format!("{}", task.status).normal(),
        };
        println!("  {} {}/{} [{}]", task.name, task.confirmed, task.target, status);
    }
}
