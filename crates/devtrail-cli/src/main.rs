use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use devtrail_core::DevtrailConfig;
use std::path::{Path, PathBuf};

mod commands;

/// Config file used when `--config` is not given.
const DEFAULT_CONFIG: &str = "devtrail.yaml";

#[derive(Parser, Debug)]
#[command(name = "devtrail", version, about = "Access-controlled activity logger")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, global = true, env = "DEVTRAIL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record one event
    Record {
        /// Actor performing the action (must be authorized)
        #[arg(long)]
        actor: String,

        /// Action label, e.g. "Method call"
        #[arg(long)]
        action: String,

        #[arg(long)]
        model: String,

        #[arg(long)]
        method: String,

        /// Outcome label
        #[arg(long, default_value = "success")]
        result: String,

        /// Fault category to attach, e.g. ZeroDivisionError
        #[arg(long = "error-kind")]
        error_kind: Option<String>,

        /// Fault message (requires --error-kind)
        #[arg(long = "error-message", requires = "error_kind", default_value = "")]
        error_message: String,

        /// Dispatch in the background and wait for it before exiting
        #[arg(long, default_value_t = false)]
        detach: bool,
    },

    /// List stored records, optionally filtered
    List {
        #[arg(long)]
        action: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        actor: Option<String>,

        /// Print a JSON array instead of log lines
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Validate the configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Record {
            actor,
            action,
            model,
            method,
            result,
            error_kind,
            error_message,
            detach,
        } => {
            let args = commands::record::RecordArgs {
                actor,
                action,
                model,
                method,
                result,
                error: error_kind.map(|kind| (kind, error_message)),
                detach,
            };
            commands::record::run(&config, args).await?
        }

        Command::List {
            action,
            model,
            actor,
            json,
        } => {
            let filter = devtrail_logger::RecordFilter {
                action,
                model,
                actor_id: actor,
            };
            commands::list::run(&config, &filter, json).await?
        }

        Command::Check => commands::check::run(&config, cli.config.as_deref())?,
    }

    Ok(())
}

/// Load the configuration.
///
/// An explicit path must exist. Without one, `devtrail.yaml` in the current
/// directory is used if present, otherwise the defaults.
fn load_config(explicit: Option<&Path>) -> Result<DevtrailConfig> {
    match explicit {
        Some(path) => DevtrailConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => {
            let path = Path::new(DEFAULT_CONFIG);
            if path.exists() {
                DevtrailConfig::from_file(path)
                    .with_context(|| format!("failed to load config from {}", path.display()))
            } else {
                tracing::debug!("No {} found, using default configuration", DEFAULT_CONFIG);
                Ok(DevtrailConfig::default())
            }
        }
    }
}
