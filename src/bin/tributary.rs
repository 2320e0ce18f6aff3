//! Tributary CLI — lineage graph consolidation engine.
//!
//! Usage:
//!   tributary ingest --working <db> --file <events.jsonl>
//!   tributary run --working <db> --summary <db>
//!   tributary watch --working <db> --summary <db> [--interval secs]
//!   tributary rebuild --working <db> --summary <db>

use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tributary::{GraphMapper, GraphStore, LineageEvent, LineageResolver, RunReport};

#[derive(Parser)]
#[command(
    name = "tributary",
    version,
    about = "Column-level lineage graph consolidation engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed entity/relationship facts from a JSON Lines file into the working graph
    Ingest {
        /// Path to the working graph database
        #[arg(long)]
        working: PathBuf,
        /// Path to the events file (one JSON record per line)
        #[arg(long)]
        file: PathBuf,
    },
    /// Run one resolution pass over the working graph
    Run {
        /// Path to the working graph database
        #[arg(long)]
        working: PathBuf,
        /// Path to the summary graph database
        #[arg(long)]
        summary: PathBuf,
    },
    /// Run resolution passes on a fixed interval until interrupted
    Watch {
        /// Path to the working graph database
        #[arg(long)]
        working: PathBuf,
        /// Path to the summary graph database
        #[arg(long)]
        summary: PathBuf,
        /// Seconds between passes
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
    /// Discard the summary graph and repopulate it from the working graph
    Rebuild {
        /// Path to the working graph database
        #[arg(long)]
        working: PathBuf,
        /// Path to the summary graph database
        #[arg(long)]
        summary: PathBuf,
    },
}

fn open_store(path: &PathBuf) -> Result<Arc<GraphStore>, String> {
    GraphStore::open(path)
        .map(Arc::new)
        .map_err(|e| format!("failed to open graph store {}: {}", path.display(), e))
}

fn open_resolver(working: &PathBuf, summary: &PathBuf) -> Result<LineageResolver, String> {
    Ok(LineageResolver::new(open_store(working)?, open_store(summary)?))
}

fn print_report(report: &RunReport) {
    println!(
        "processes {}  scan-failed {}  resolved {}  committed {}  existing {}  failed {}  skipped {}  unresolved {}",
        report.processes_scanned,
        report.processes_failed,
        report.flows_resolved,
        report.units_committed,
        report.units_existing,
        report.units_failed,
        report.candidates_skipped,
        report.paths_unresolved,
    );
}

fn cmd_ingest(working: &PathBuf, file: &PathBuf) -> i32 {
    let store = match open_store(working) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let mapper = GraphMapper::new(&store);

    let reader = match std::fs::File::open(file) {
        Ok(f) => std::io::BufReader::new(f),
        Err(e) => {
            eprintln!("Error: cannot open '{}': {}", file.display(), e);
            return 1;
        }
    };

    let (mut created, mut existing, mut failed) = (0usize, 0usize, 0usize);
    for (number, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error: read failure at line {}: {}", number + 1, e);
                return 1;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let outcome = match serde_json::from_str::<LineageEvent>(&line) {
            Ok(LineageEvent::Entity(entity)) => mapper.upsert_vertex(&entity).map_err(|e| e.to_string()),
            Ok(LineageEvent::Relationship(rel)) => mapper.upsert_edge(&rel).map_err(|e| e.to_string()),
            Err(e) => Err(format!("malformed record: {}", e)),
        };
        // Per-record errors are reported and ingestion continues.
        match outcome {
            Ok(tributary::UpsertOutcome::Created) => created += 1,
            Ok(tributary::UpsertOutcome::Existing) => existing += 1,
            Err(e) => {
                failed += 1;
                eprintln!("Warning: line {}: {}", number + 1, e);
            }
        }
    }

    println!("ingested {} records ({} already present, {} failed)", created, existing, failed);
    if failed > 0 {
        1
    } else {
        0
    }
}

fn cmd_run(working: &PathBuf, summary: &PathBuf) -> i32 {
    let resolver = match open_resolver(working, summary) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match resolver.run() {
        Ok(report) => {
            print_report(&report);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_rebuild(working: &PathBuf, summary: &PathBuf) -> i32 {
    let resolver = match open_resolver(working, summary) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match resolver.rebuild() {
        Ok(report) => {
            print_report(&report);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_watch(working: &PathBuf, summary: &PathBuf, interval_secs: u64) -> i32 {
    let resolver = match open_resolver(working, summary) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match resolver.run() {
                    Ok(report) => print_report(&report),
                    // A failed pass is logged; the next tick tries again.
                    Err(e) => eprintln!("Warning: resolution pass failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("stopping after current pass");
                return 0;
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Ingest { working, file } => cmd_ingest(&working, &file),
        Commands::Run { working, summary } => cmd_run(&working, &summary),
        Commands::Watch {
            working,
            summary,
            interval,
        } => cmd_watch(&working, &summary, interval).await,
        Commands::Rebuild { working, summary } => cmd_rebuild(&working, &summary),
    };
    std::process::exit(code);
}
