mod config;
mod delivery;
mod display;
mod import;
mod logging;
mod report;
mod scheduler;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::config::{KenoConfig, LogFormat};
use crate::delivery::{ConsoleSink, LogSink, PredictionSink};
use crate::display::{
    display_breakdown, display_draws, display_import_summary, display_prediction,
    display_saved_predictions, display_stats,
};
use crate::report::{DataStatus, status_message};
use crate::scheduler::{Scheduler, SchedulerOptions, ctrl_c_shutdown};
use keno_db::db::{fetch_last_draws, fetch_last_predictions, latest_draw_time, open_db};
use keno_db::models::{Draw, parse_numbers};
use keno_db::store::{DrawStore, SqliteStore};
use keno_engine::Predictor;
use keno_engine::sampler::date_seed;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum SinkKind {
    #[default]
    Console,
    Log,
}

#[derive(Parser)]
#[command(name = "keno", about = "Keno draw statistics and heuristic number scoring")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides the configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log output format (overrides the configuration)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import draws from a CSV file (draw_id,drawn_at,n1..n20)
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Record one draw
    Add {
        /// 20 numbers separated by commas or spaces; prompted when absent
        #[arg(short, long)]
        numbers: Option<String>,

        /// Draw identifier, defaults to manual_<unix time>
        #[arg(long)]
        id: Option<String>,
    },

    /// Print the database path
    DbPath,

    /// List the latest draws
    List {
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Per-number statistics and streaks
    Stats,

    /// Score every number and pick 4 + 10
    Predict {
        /// Seed for the low-data random pick
        #[arg(long, conflicts_with = "daily")]
        seed: Option<u64>,

        /// Seed from today's date
        #[arg(long)]
        daily: bool,

        /// Print the prediction as JSON
        #[arg(long)]
        json: bool,

        /// Store the prediction in the database
        #[arg(long)]
        save: bool,

        /// Rows of the score table
        #[arg(long, default_value = "20")]
        top: usize,
    },

    /// Data collection status
    Status,

    /// Predict periodically until interrupted
    Run {
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<u64>,

        #[arg(long)]
        seed: Option<u64>,

        /// Seconds between cycles (overrides the configuration)
        #[arg(long)]
        interval: Option<u64>,

        #[arg(long, default_value = "console")]
        sink: SinkKind,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = KenoConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    logging::init_tracing(config.log_format);

    let conn = open_db(&config.db_path)?;
    let store = SqliteStore::new(conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(store, &file),
        Command::Add { numbers, id } => cmd_add(store, &config, numbers, id),
        Command::DbPath => {
            println!("{}", config.db_path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&store, last),
        Command::Stats => cmd_stats(&store),
        Command::Predict {
            seed,
            daily,
            json,
            save,
            top,
        } => {
            let seed = if daily { Some(date_seed()) } else { seed };
            cmd_predict(store, &config, seed, json, save, top)
        }
        Command::Status => cmd_status(&store, &config),
        Command::Run {
            cycles,
            seed,
            interval,
            sink,
        } => {
            if let Some(secs) = interval {
                config.interval_secs = secs;
                config.validate()?;
            }
            cmd_run(store, &config, cycles, seed, sink)
        }
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn cmd_import(mut store: SqliteStore, file: &Path) -> Result<()> {
    let result = import::import_csv(&mut store, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_add(mut store: SqliteStore, config: &KenoConfig, numbers: Option<String>, id: Option<String>) -> Result<()> {
    let (numbers, interactive) = match numbers {
        Some(raw) => (parse_numbers(&raw)?, false),
        None => (prompt_numbers()?, true),
    };

    let now = Utc::now();
    let draw_id = id.unwrap_or_else(|| format!("manual_{}", now.timestamp()));
    let draw = Draw::new(draw_id, now, &numbers)?;

    if interactive {
        println!("\nDraw to record:");
        display_draws(std::slice::from_ref(&draw));
        let confirm = prompt("\nConfirm? (y/n): ")?;
        if !confirm.eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if store.record_draw(&draw)? {
        println!("Draw {} recorded.", draw.draw_id);
        let total = store.total_draws()?;
        if total == config.min_draws_for_prediction {
            info!(total, "minimum draw count reached, predictions now use collected data");
        }
    } else {
        println!("Draw {} already exists (duplicate ignored).", draw.draw_id);
    }
    Ok(())
}

fn cmd_list(store: &SqliteStore, last: u32) -> Result<()> {
    if store.total_draws()? == 0 {
        println!("Empty database. Run first: keno import --file <csv>");
        return Ok(());
    }
    let draws = fetch_last_draws(store.conn(), last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(store: &SqliteStore) -> Result<()> {
    let total = store.total_draws()?;
    if total == 0 {
        println!("Empty database. Run first: keno import --file <csv>");
        return Ok(());
    }
    display_stats(&store.number_stats()?, total);
    Ok(())
}

fn cmd_predict(
    store: SqliteStore,
    config: &KenoConfig,
    seed: Option<u64>,
    json: bool,
    save: bool,
    top: usize,
) -> Result<()> {
    let mut predictor = Predictor::new(store, config.history_window(), config.history_limit);
    let mut rng = make_rng(seed);
    let now = Utc::now();

    let result = if save {
        predictor.predict_and_save(now, &mut rng)?
    } else {
        predictor.predict(now, &mut rng)?
    };

    if json {
        let out = serde_json::to_string_pretty(&result).context("cannot serialize prediction")?;
        println!("{out}");
        return Ok(());
    }

    display_prediction(&result);
    display_breakdown(&predictor.scores(now)?, top);
    if save {
        println!("\nPrediction saved.");
    }
    Ok(())
}

fn cmd_status(store: &SqliteStore, config: &KenoConfig) -> Result<()> {
    let status = DataStatus {
        total_draws: store.total_draws()?,
        numbers_tracked: store.number_stats()?.len(),
        min_draws: config.min_draws_for_prediction,
    };
    println!("{}\n", status_message(&status, Local::now()));

    if let Some(at) = latest_draw_time(store.conn())? {
        println!("Latest draw: {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"));
    }
    println!("\nRecent predictions:");
    display_saved_predictions(&fetch_last_predictions(store.conn(), 5)?);
    Ok(())
}

fn cmd_run(
    store: SqliteStore,
    config: &KenoConfig,
    cycles: Option<u64>,
    seed: Option<u64>,
    sink: SinkKind,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start runtime")?;

    let predictor = Predictor::new(store, config.history_window(), config.history_limit);
    let options = SchedulerOptions::from_config(config, cycles);
    let rng = make_rng(seed);

    runtime.block_on(async move {
        let shutdown = ctrl_c_shutdown();
        let summary = match sink {
            SinkKind::Console => run_with(predictor, ConsoleSink, rng, options, shutdown).await?,
            SinkKind::Log => run_with(predictor, LogSink, rng, options, shutdown).await?,
        };
        println!(
            "Stopped after {} cycles: {} predictions, {} estimations, {} failed.",
            summary.cycles, summary.predictions, summary.estimations, summary.failed_cycles
        );
        Ok::<(), anyhow::Error>(())
    })
}

async fn run_with<K: PredictionSink>(
    predictor: Predictor<SqliteStore>,
    sink: K,
    rng: StdRng,
    options: SchedulerOptions,
    shutdown: tokio::sync::watch::Receiver<bool>,
) -> Result<scheduler::RunSummary> {
    Scheduler::new(predictor, sink, rng, options).run(shutdown).await
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input).context("cannot read input")?;
    if read == 0 {
        bail!("input closed");
    }
    Ok(input.trim().to_string())
}

fn prompt_numbers() -> Result<Vec<u8>> {
    loop {
        let input = prompt("20 numbers (1-80, separated by spaces or commas): ")?;
        match parse_numbers(&input).and_then(|numbers| {
            keno_db::models::validate_draw(&numbers)?;
            Ok(numbers)
        }) {
            Ok(numbers) => return Ok(numbers),
            Err(e) => println!("Invalid draw: {e}. Try again."),
        }
    }
}
