//! Bitacora CLI - inspect and manage a local tracking store.
//!
//! The `bitacora` command operates on the store named by `--store` or
//! `BITACORA_TRACKING_URI` (default `./bitruns`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bitacora::config::Config;
use bitacora::store::TrackingStore;

/// Bitacora - local ML experiment tracking
#[derive(Parser, Debug)]
#[command(
    name = "bitacora",
    author,
    version,
    about = "Inspect and manage a local experiment tracking store"
)]
struct Args {
    /// Tracking store URI (overrides BITACORA_TRACKING_URI)
    #[arg(short, long, global = true)]
    store: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage experiments
    #[command(subcommand)]
    Experiments(ExperimentsCommand),

    /// Inspect runs
    #[command(subcommand)]
    Runs(RunsCommand),
}

#[derive(Subcommand, Debug)]
enum ExperimentsCommand {
    /// Create a new experiment
    Create {
        /// Experiment name (unique per store)
        #[arg(long)]
        name: String,

        /// Artifact root URI for the experiment's runs
        #[arg(long)]
        artifact_root: Option<String>,
    },
    /// List active experiments
    List,
}

#[derive(Subcommand, Debug)]
enum RunsCommand {
    /// List runs of an experiment
    List {
        /// Experiment ID
        #[arg(long)]
        experiment_id: String,
    },
    /// Print a run as JSON (info, params, tags)
    Describe {
        /// Run ID
        run_id: String,
    },
}

fn open_store(args: &Args) -> anyhow::Result<impl TrackingStore> {
    let config = match &args.store {
        Some(uri) => Config::with_tracking_uri(uri)?,
        None => Config::from_env()?,
    };
    config
        .tracking_uri()
        .resolve_store()
        .with_context(|| format!("opening tracking store '{}'", config.tracking_uri()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let store = open_store(&args)?;

    match args.command {
        Command::Experiments(ExperimentsCommand::Create {
            name,
            artifact_root,
        }) => {
            let experiment = store.create_experiment(&name, artifact_root.as_deref())?;
            println!("{}", experiment.experiment_id());
        }
        Command::Experiments(ExperimentsCommand::List) => {
            for experiment in store.list_experiments()? {
                println!(
                    "{}\t{}\t{}",
                    experiment.experiment_id(),
                    experiment.name(),
                    experiment.artifact_location()
                );
            }
        }
        Command::Runs(RunsCommand::List { experiment_id }) => {
            for run in store.list_runs(&experiment_id)? {
                let started = run
                    .started_at()
                    .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
                println!("{}\t{:?}\t{}", run.run_id(), run.status(), started);
            }
        }
        Command::Runs(RunsCommand::Describe { run_id }) => {
            let run = store.get_run(&run_id)?;
            let params = store.get_params(&run_id)?;
            let tags = store.get_tags(&run_id)?;
            let doc = serde_json::json!({
                "info": run,
                "params": params,
                "tags": tags,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }
    Ok(())
}
