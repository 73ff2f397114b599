use std::collections::BTreeMap;
use std::fs;
use std::time::Instant;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, LevelFilter, Log, Metadata, Record};
use serde::Serialize;
use memlib::allocator::ContiguousAllocator;
use memlib::block::Block;
use memlib::buddy::BuddyAllocator;
use memlib::cache::CacheTrait;
use memlib::config::SimulationConfig;
use memlib::io::{load_script, load_trace, Command};
use memlib::pipeline::TranslationPipeline;
use memlib::placement_policies::Placement;
use memlib::stats::{fragmentation, utilization, StatsTracker};

#[derive(Parser, Debug)]
#[command(about = String::from("Memory subsystem simulator: allocators, caches, and virtual memory"))]
struct Args {
    #[command(subcommand)]
    command: Mode,

    /// Print how long the simulation took
    #[arg(short, long, global = true)]
    performance: bool,

    /// Log engine state transitions to stderr
    #[arg(short, long, global = true)]
    debug: bool,

    /// Log every access to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Translate a trace of virtual addresses through virtual memory and the cache hierarchy
    Translate {
        trace: String,
        #[arg(short, long)]
        config: Option<String>,
        /// Also print one JSON record per address
        #[arg(short, long)]
        records: bool,
    },
    /// Replay an allocation script against one of the allocators
    Allocate {
        script: String,
        #[arg(short, long)]
        config: Option<String>,
        /// Overrides the configured placement strategy
        #[arg(short, long, value_enum)]
        strategy: Option<AllocatorKind>,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum AllocatorKind {
    First,
    Best,
    Worst,
    Buddy,
}

#[derive(Serialize)]
struct ContiguousReport<'a> {
    strategy: String,
    blocks: &'a [Block],
    failed_frees: u64,
    external_fragmentation: f64,
    utilization: f64,
    stats: &'a StatsTracker,
}

#[derive(Serialize)]
struct BuddyReport<'a> {
    free_lists: BTreeMap<usize, &'a [u64]>,
    used: BTreeMap<u64, u64>,
    failed_frees: u64,
    utilization: f64,
    stats: &'a StatsTracker,
}

/// Writes log records to stderr
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    let level = match (args.verbose, args.debug) {
        (true, _) => LevelFilter::Trace,
        (false, true) => LevelFilter::Debug,
        _ => LevelFilter::Warn,
    };
    log::set_logger(&LOGGER).map_err(|e| format!("Couldn't install the logger: {e}"))?;
    log::set_max_level(level);

    let simulation_start = Instant::now();
    match &args.command {
        Mode::Translate { trace, config, records } => translate(trace, config.as_deref(), *records)?,
        Mode::Allocate { script, config, strategy } => allocate(script, config.as_deref(), *strategy)?,
    }
    if args.performance {
        let simulation_time = simulation_start.elapsed();
        let total_time = start.elapsed();
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<SimulationConfig, String> {
    let config = match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("Couldn't open the config file at path {path}: {e}"))?;
            SimulationConfig::from_json(&text).map_err(|e| format!("Couldn't parse the config file: {e}"))?
        }
        None => SimulationConfig::default(),
    };
    debug!("Parsed input configuration: {config:?}");
    Ok(config)
}

fn translate(trace: &str, config: Option<&str>, records: bool) -> Result<(), String> {
    let config = load_config(config)?;
    let mut pipeline = TranslationPipeline::from_config(&config).map_err(|e| format!("Invalid configuration: {e}"))?;
    let addresses = load_trace(trace).map_err(|e| format!("Couldn't read the trace file at path {trace}: {e}"))?;
    let mut failure = None;
    let result = pipeline.simulate(addresses, |record| {
        if records && failure.is_none() {
            match serde_json::to_string(record) {
                Ok(line) => println!("{line}"),
                Err(e) => failure = Some(format!("Couldn't serialise a trace record {e}")),
            }
        }
    });
    if let Some(e) = failure {
        return Err(e);
    }
    println!("{}", serde_json::to_string_pretty(&result).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    debug!(
        "Uninitialised cache lines by layer: ({}: {}, {}: {})",
        pipeline.l1().name(),
        pipeline.l1().get_uninitialised_line_count(),
        pipeline.l2().name(),
        pipeline.l2().get_uninitialised_line_count()
    );
    Ok(())
}

fn allocate(script: &str, config: Option<&str>, kind: Option<AllocatorKind>) -> Result<(), String> {
    let config = load_config(config)?;
    let commands = load_script(script).map_err(|e| format!("Couldn't read the script file at path {script}: {e}"))?;
    let strategy = match kind {
        Some(AllocatorKind::Buddy) => return allocate_buddy(&config, &commands),
        Some(AllocatorKind::First) => Placement::FirstFit,
        Some(AllocatorKind::Best) => Placement::BestFit,
        Some(AllocatorKind::Worst) => Placement::WorstFit,
        None => config.strategy.into(),
    };
    let mut allocator = ContiguousAllocator::new(config.memory_size, strategy).map_err(|e| format!("Invalid configuration: {e}"))?;
    let mut stats = StatsTracker::new(allocator.total_size());
    let mut failed_frees = 0;
    for command in &commands {
        match *command {
            Command::Allocate(size) => {
                stats.record_request();
                match allocator.allocate(size) {
                    Some(_) => stats.record_success(),
                    None => stats.record_failure(),
                }
            }
            Command::Free(id) => {
                if !allocator.free(id) {
                    failed_frees += 1;
                }
            }
        }
    }
    let report = ContiguousReport {
        strategy: format!("{:?}", allocator.strategy()),
        blocks: allocator.dump(),
        failed_frees,
        external_fragmentation: fragmentation(allocator.dump()),
        utilization: utilization(allocator.used_memory(), allocator.total_size()),
        stats: &stats,
    };
    println!("{}", serde_json::to_string_pretty(&report).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    Ok(())
}

fn allocate_buddy(config: &SimulationConfig, commands: &[Command]) -> Result<(), String> {
    let mut buddy = BuddyAllocator::new(config.buddy_size).map_err(|e| format!("Invalid configuration: {e}"))?;
    let mut stats = StatsTracker::new(buddy.size());
    let mut failed_frees = 0;
    for command in commands {
        match *command {
            Command::Allocate(size) => {
                stats.record_request();
                match buddy.allocate(size).and_then(|addr| buddy.allocated_size(addr)) {
                    Some(granted) => {
                        stats.record_success();
                        stats.add_internal_fragmentation(granted, size);
                    }
                    None => stats.record_failure(),
                }
            }
            Command::Free(addr) => {
                if !buddy.free(addr) {
                    failed_frees += 1;
                }
            }
        }
    }
    let report = BuddyReport {
        free_lists: buddy.free_lists().iter().enumerate()
            .filter(|(_, list)| !list.is_empty())
            .map(|(order, list)| (order, list.as_slice()))
            .collect(),
        used: buddy.used().iter().map(|(addr, order)| (*addr, 1u64 << order)).collect(),
        failed_frees,
        utilization: utilization(buddy.used_memory(), buddy.size()),
        stats: &stats,
    };
    println!("{}", serde_json::to_string_pretty(&report).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    Ok(())
}
