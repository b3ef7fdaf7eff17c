#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates zones and drives headless Deepfield runs.

mod config;
mod driver;
mod run_code;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use deepfield_core::{BiomeId, Command, Event, ViewSize, WorldConfig, Zone};
use deepfield_system_invariants::{
    DiagnosticSink, FileSink, InvariantGuard, MemorySink, SamplingMode,
};
use deepfield_system_zone_generation::fingerprint_hex;
use deepfield_world::{apply, query, World};
use tracing_subscriber::EnvFilter;

use driver::{SimulationOptions, SimulationReport};
use run_code::RunCode;

#[derive(Debug, Parser)]
#[command(name = "deepfield", about = "Seed-deterministic zone generation and headless runs")]
struct Cli {
    /// TOML file overriding the built-in biomes and tuning.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Raise log verbosity; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generates the zone at one depth of a run and prints it.
    Generate {
        /// Run seed.
        #[arg(long)]
        seed: Option<u32>,
        /// Theme pinned for the first block.
        #[arg(long)]
        theme: Option<String>,
        /// Zone depth, starting at one.
        #[arg(long, default_value_t = 1)]
        depth: u32,
        /// Share code replacing seed, theme and depth.
        #[arg(long, conflicts_with_all = ["seed", "theme", "depth"])]
        code: Option<String>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,
    },
    /// Drives a run with a scripted pilot under the invariant guard.
    Simulate {
        /// Run seed.
        #[arg(long)]
        seed: Option<u32>,
        /// Theme pinned for the first block.
        #[arg(long)]
        theme: Option<String>,
        /// Ticks to simulate.
        #[arg(long, default_value_t = 3_600)]
        ticks: u32,
        /// Seconds per tick.
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
        /// Seed for ambient enemy randomness and the pilot.
        #[arg(long, default_value_t = 0)]
        behavior_seed: u64,
        /// Directory receiving diagnostic snapshots.
        #[arg(long)]
        diagnostics: Option<PathBuf>,
        /// Check every entity after each tick instead of a sample.
        #[arg(long)]
        exhaustive: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Summary,
    Json,
}

/// Entry point for the Deepfield command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            seed,
            theme,
            depth,
            code,
            format,
        } => {
            let request = match code {
                Some(code) => RunCode::decode(&code).context("invalid share code")?,
                None => RunCode {
                    run_seed: seed.unwrap_or_else(rand::random),
                    theme: theme.map(BiomeId::new),
                    depth,
                },
            };
            generate(config, &request, format)
        }
        Commands::Simulate {
            seed,
            theme,
            ticks,
            dt,
            behavior_seed,
            diagnostics,
            exhaustive,
        } => {
            let options = SimulationOptions {
                ticks,
                dt,
                view: ViewSize::new(1_280.0, 720.0),
                pilot_seed: behavior_seed,
            };
            let sampling = if exhaustive {
                SamplingMode::Exhaustive
            } else {
                SamplingMode::default()
            };
            simulate(config, seed, theme.map(BiomeId::new), options, sampling, diagnostics)
        }
    }
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn start_run(world: &mut World, run_seed: Option<u32>, theme: Option<BiomeId>) -> Result<()> {
    let mut events = Vec::new();
    apply(world, Command::InitWorld { theme, run_seed }, &mut events);
    ensure_loaded(&events)
}

fn ensure_loaded(events: &[Event]) -> Result<()> {
    for event in events {
        if let Event::ZoneLoadFailed { index, error } = event {
            bail!("zone {index} failed to load: {error}");
        }
    }
    Ok(())
}

fn generate(config: WorldConfig, request: &RunCode, format: OutputFormat) -> Result<()> {
    let mut world = World::new(config);
    start_run(&mut world, Some(request.run_seed), request.theme.clone())?;
    if request.depth != 1 {
        let mut events = Vec::new();
        apply(&mut world, Command::LoadZone { index: request.depth }, &mut events);
        ensure_loaded(&events)?;
    }
    let zone = query::zone(&world).context("no zone loaded")?;
    let code = request.encode()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(zone)?),
        OutputFormat::Summary => print_summary(zone),
    }
    println!("fingerprint {}", fingerprint_hex(zone));
    println!("code        {code}");
    Ok(())
}

fn print_summary(zone: &Zone) {
    println!("zone {} ({}) seed {}", zone.depth, zone.biome, zone.seed);
    println!("  size       {:.0} x {:.0}", zone.width, zone.height);
    if !zone.modifiers.is_empty() {
        let names: Vec<String> = zone
            .modifiers
            .iter()
            .map(|modifier| format!("{modifier:?}"))
            .collect();
        println!("  modifiers  {}", names.join(", "));
    }
    println!("  enemies    {}", zone.enemy_spawns.len());
    println!("  elites     {}", zone.elite_spawns.len());
    if let Some(boss) = &zone.boss_spawn {
        println!("  boss       {:?}", boss.kind);
    }
    println!("  obstacles  {}", zone.obstacles.len());
    println!("  decor      {}", zone.decorations.len());
    match zone.exit_point {
        Some(exit) => println!("  exit       ({:.0}, {:.0})", exit.x, exit.y),
        None => println!("  exit       none"),
    }
}

fn simulate(
    config: WorldConfig,
    seed: Option<u32>,
    theme: Option<BiomeId>,
    options: SimulationOptions,
    sampling: SamplingMode,
    diagnostics: Option<PathBuf>,
) -> Result<()> {
    let caps = config.tuning.entity_caps;
    let sink: Box<dyn DiagnosticSink> = match diagnostics {
        Some(dir) => Box::new(FileSink::new(dir)),
        None => Box::new(MemorySink::new()),
    };
    let mut guard = InvariantGuard::new(caps, sink).with_sampling(sampling);
    let mut world = World::with_behavior_seed(config, options.pilot_seed);
    start_run(&mut world, seed, theme)?;
    let run_seed = query::run(&world).map(|run| run.run_seed);

    let report = driver::simulate(&mut world, &mut guard, options);
    print_report(run_seed, &report);
    if let Some(violation) = &report.violation {
        bail!("run aborted: {violation}");
    }
    Ok(())
}

fn print_report(run_seed: Option<u32>, report: &SimulationReport) {
    if let Some(run_seed) = run_seed {
        println!("run seed   {run_seed}");
    }
    println!("ticks      {}", report.ticks);
    println!("depth      {}", report.depth);
    println!("cleared    {}", report.zones_cleared);
    println!("spawned    {}", report.spawned);
    println!("kills      {}", report.kills);
    println!("bosses     {}", report.bosses);
    println!("shots      {}", report.shots);
    println!("trimmed    {}", report.trims);
}
