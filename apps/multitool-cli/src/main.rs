use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use multitool_beam::BeamConfig;
use multitool_sim::{Demo, GameEvent, Outcome, SceneConfig, Session, run_scene};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "multitool-cli", about = "CLI tool for multitool scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and default tool tuning
    Info,
    /// Load a scene file and play its input script
    Run {
        /// Path to a scene YAML file
        scene: PathBuf,
        /// Print events and the summary as JSON lines
        #[arg(long)]
        json: bool,
        /// Exit with an error unless the mission is won
        #[arg(long)]
        require_win: bool,
    },
    /// Play one of the built-in scenes
    Demo {
        #[arg(value_enum)]
        which: DemoKind,
        /// Print events and the summary as JSON lines
        #[arg(long)]
        json: bool,
        /// Print the scene YAML instead of running it
        #[arg(long)]
        show: bool,
        /// Exit with an error unless the mission is won
        #[arg(long)]
        require_win: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DemoKind {
    Mining,
    Tractor,
    Repair,
}

impl From<DemoKind> for Demo {
    fn from(kind: DemoKind) -> Self {
        match kind {
            DemoKind::Mining => Demo::Mining,
            DemoKind::Tractor => Demo::Tractor,
            DemoKind::Repair => Demo::Repair,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("multitool-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", multitool_common::crate_info());
            println!("kernel: {}", multitool_kernel::crate_info());
            println!("input: {}", multitool_input::crate_info());
            println!("targets: {}", multitool_targets::crate_info());
            println!("objectives: {}", multitool_objectives::crate_info());
            println!("beam: {}", multitool_beam::crate_info());
            println!("sim: {}", multitool_sim::crate_info());

            let config = BeamConfig::default();
            println!(
                "beam defaults: range={} damage/s={} repair/s={} hold={} [{}, {}]",
                config.max_range,
                config.damage_per_second,
                config.repair_per_second,
                config.hold_distance,
                config.min_hold_distance,
                config.max_hold_distance
            );
            let demos: Vec<_> = Demo::ALL.iter().map(|d| d.name()).collect();
            println!("demos: {}", demos.join(", "));
        }
        Commands::Run {
            scene,
            json,
            require_win,
        } => {
            let config = SceneConfig::load(&scene)
                .with_context(|| format!("loading scene {}", scene.display()))?;
            play(&config, json, require_win)?;
        }
        Commands::Demo {
            which,
            json,
            show,
            require_win,
        } => {
            let demo = Demo::from(which);
            let config = demo
                .scene()
                .with_context(|| format!("built-in scene {}", demo.name()))?;
            if show {
                print!("{}", demo.source());
            } else {
                play(&config, json, require_win)?;
            }
        }
    }

    Ok(())
}

fn play(scene: &SceneConfig, json: bool, require_win: bool) -> anyhow::Result<()> {
    if !json {
        println!(
            "Scene {}: {} script steps, dt={}s",
            scene.name,
            scene.script.len(),
            scene.timestep
        );
    }
    let (session, events) = run_scene(scene)?;
    print_events(&events, json)?;
    print_summary(&session, json)?;
    if require_win && session.outcome() != Some(Outcome::Won) {
        anyhow::bail!("scene {} did not end in a win", scene.name);
    }
    Ok(())
}

fn print_events(events: &[GameEvent], json: bool) -> anyhow::Result<()> {
    for event in events {
        if json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("{event}");
        }
    }
    Ok(())
}

fn print_summary(session: &Session, json: bool) -> anyhow::Result<()> {
    let summary = session.summary();
    if json {
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }
    let outcome = match summary.outcome {
        Some(outcome) => format!("{outcome:?}"),
        None => "undecided".to_string(),
    };
    println!(
        "Done: ticks={}, elapsed={:.2}s, mode={}, objectives={}/{}, outcome={}",
        summary.ticks,
        summary.elapsed,
        summary.mode,
        summary.completed,
        summary.total,
        outcome
    );
    if let Some(remaining) = summary.time_remaining {
        println!("Time remaining: {remaining:.2}s");
    }
    println!(
        "World: entities={}, logged events={}",
        summary.entities, summary.world_events
    );
    Ok(())
}
