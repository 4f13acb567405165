use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use warden_locks::*;

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Inspect permission strings and run access checks")]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the keys and locks of a permission string
    Parse {
        /// Permission string, e.g. "Builders, edit AND: Builders id(42)"
        permissions: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decide whether one world entity may act on another
    Check {
        /// World file (YAML, TOML or JSON)
        #[arg(short, long)]
        world: PathBuf,

        /// Name of the accessing entity
        accessing: String,

        /// Name of the accessed entity
        accessed: String,

        /// Action-type to check
        action: String,

        /// Deny actions no lock regulates
        #[arg(long)]
        default_deny: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Parse { permissions, json } => {
            run_parse(&permissions, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check {
            world,
            accessing,
            accessed,
            action,
            default_deny,
        } => run_check(world, &accessing, &accessed, &action, default_deny),
    }
}

fn run_parse(permissions: &str, json: bool) -> anyhow::Result<()> {
    let parsed = parse(permissions);

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        return Ok(());
    }

    println!("Keys ({}):", parsed.keys.len());
    for key in &parsed.keys {
        println!("  {}", key);
    }
    println!("Locks ({}):", parsed.locks.len());
    for (index, lock) in parsed.locks.iter().enumerate() {
        let marker = if lock.is_impassable() { " [impassable]" } else { "" };
        println!("  {}: {}{}", index, lock, marker);
    }

    Ok(())
}

fn run_check(
    path: PathBuf,
    accessing: &str,
    accessed: &str,
    action: &str,
    default_deny: bool,
) -> anyhow::Result<ExitCode> {
    let mut world = World::load(&path)
        .with_context(|| format!("failed to load world file {}", path.display()))?;
    EnvOverrides::apply(&mut world.config);

    let engine = LockEngine::from_config(&world.config);
    let decision = engine.check(
        world.entity(accessing)?,
        world.entity(accessed)?,
        action,
        default_deny,
    );

    let verdict = if decision.is_granted() {
        "granted"
    } else {
        "denied"
    };
    println!(
        "{} {} {}: {} ({})",
        accessing, action, accessed, verdict, decision
    );

    Ok(if decision.is_granted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
