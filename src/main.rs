mod app;
mod challenges;
mod color;
mod controller;
mod error;
mod registry;
mod store;
mod tier;
mod timer;
mod ui;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use store::{ExperienceRecord, ExperienceStore, FileStore};
use tier::Tier;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const APP_DIR: &str = "reflex-orion";
const LOG_FILE: &str = "reflex.log";

#[derive(Parser)]
#[command(name = "reflex-orion", version, about = "Terminal reaction and attention minigame")]
struct Cli
{
    /// Where experience counters and the log file live
    #[arg(long, env = "REFLEX_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Seed for challenge generation
    #[arg(long, env = "REFLEX_SEED", global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command
{
    /// Play in the terminal
    Play
    {
        /// Start straight into this tier instead of the tier menu
        #[arg(long, value_enum)]
        tier: Option<Tier>,

        /// Keep experience in memory only; nothing is written to disk
        #[arg(long)]
        no_save: bool,
    },
    /// List the challenges registered for each tier
    List,
    /// Show experience totals and unlocked tiers
    Stats
    {
        #[arg(long)]
        json: bool,
    },
    /// Erase experience for every tier
    Reset
    {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Serialize)]
struct StatsReport
{
    experience: ExperienceRecord,
    total: u64,
    unlocked: Vec<Tier>,
}

fn main()
{
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()>
{
    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_local_dir()
            .context("could not determine a data directory; pass --data-dir")?
            .join(APP_DIR),
    };
    init_logging(&data_dir)?;
    info!(data_dir = %data_dir.display(), seed = ?cli.seed, "starting");

    match cli.command {
        None => interactive_menu(&data_dir, cli.seed),
        Some(Command::Play { tier, no_save }) => play(&data_dir, cli.seed, tier, no_save),
        Some(Command::List) => list_challenges(),
        Some(Command::Stats { json }) => print_stats(&open_store(&data_dir)?, json),
        Some(Command::Reset { yes }) => {
            if !yes {
                bail!("refusing to erase experience without --yes");
            }
            open_store(&data_dir)?.reset_all()?;
            println!("Experience reset for all tiers.");
            Ok(())
        }
    }
}

fn init_logging(data_dir: &Path) -> Result<()>
{
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    let path = data_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn open_store(data_dir: &Path) -> Result<ExperienceStore>
{
    let backend = FileStore::open(data_dir)?;
    debug!(dir = %backend.dir().display(), "opened experience store");
    Ok(ExperienceStore::new(backend)?)
}

fn rng_from(seed: Option<u64>) -> StdRng
{
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn play(data_dir: &Path, seed: Option<u64>, tier: Option<Tier>, no_save: bool) -> Result<()>
{
    let store = if no_save {
        info!("playing without saving experience");
        ExperienceStore::in_memory()
    } else {
        open_store(data_dir)?
    };
    let registry = challenges::builtin_registry()?;
    let mut rng = rng_from(seed);
    let mut controller = controller::RoundController::new(store, registry, StdRng::from_rng(&mut rng)?);
    app::run(&mut controller, tier, &mut rng)?;

    let totals = controller.totals();
    println!(
        "Experience: {} total (easy {}, medium {}, hard {})",
        totals.total(),
        totals.easy,
        totals.medium,
        totals.hard
    );
    Ok(())
}

fn interactive_menu(data_dir: &Path, seed: Option<u64>) -> Result<()>
{
    println!("Reflex Orion");
    println!();
    println!("Select an option:");
    println!("  1. play  - open the tier menu");
    println!("  2. stats - show experience per tier");
    println!("  3. list  - show challenges per tier");
    println!();
    print!("Enter number, command or tier name (default 1, q to quit): ");
    std::io::stdout().flush().context("failed to flush stdout")?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .context("failed to read input")?;
    let choice = input.trim().to_ascii_lowercase();

    match choice.as_str() {
        "" | "1" | "play" => play(data_dir, seed, None, false),
        "2" | "stats" => print_stats(&open_store(data_dir)?, false),
        "3" | "list" => list_challenges(),
        "q" => Ok(()),
        other => match other.parse::<Tier>() {
            Ok(tier) => play(data_dir, seed, Some(tier), false),
            Err(_) => bail!("invalid selection '{other}'"),
        },
    }
}

fn list_challenges() -> Result<()>
{
    let registry = challenges::builtin_registry()?;
    for tier in Tier::ALL {
        println!(
            "{} ({}, {}s per challenge, {} challenges):",
            tier.as_str().to_uppercase(),
            tier.stage_name(),
            tier.time_limit_secs(),
            registry.len(tier)
        );
        for challenge in registry.challenges(tier) {
            println!("  {:<20} - {}", challenge.id(), challenge.title());
        }
    }
    Ok(())
}

fn print_stats(store: &ExperienceStore, json: bool) -> Result<()>
{
    let experience = store.totals();
    let unlocked: Vec<Tier> = Tier::ALL
        .into_iter()
        .filter(|tier| tier.is_unlocked(&experience))
        .collect();

    if json {
        let report = StatsReport {
            experience,
            total: experience.total(),
            unlocked,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Experience:");
    for tier in Tier::ALL {
        let status = match tier.unlock_requirement() {
            Some(req) if !unlocked.contains(&tier) => {
                format!("locked, needs {} {} XP", req.points, req.tier)
            }
            _ => "unlocked".to_string(),
        };
        println!("  {:<8} {:>6} XP  ({status})", tier.as_str(), experience.get(tier));
    }
    println!("  {:<8} {:>6} XP", "total", experience.total());
    Ok(())
}
