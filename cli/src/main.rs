/*!

This is the command line interface for creating Juju controllers with jujusys and checking on them.

!*/

mod bootstrap;
mod error;
mod status;

use agent_utils::init_agent_logger;
use bootstrap_agent::BootstrapConfig;
use error::Result;
use jujusys_model::LocalDatastore;
use log::{debug, LevelFilter};
use snafu::ResultExt;
use std::path::PathBuf;
use std::sync::Arc;
use structopt::StructOpt;

/// The command line interface for bootstrapping Juju controllers.
#[derive(Debug, StructOpt)]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[structopt(long = "log-level", default_value = "info")]
    log_level: LevelFilter,
    /// Path to a YAML configuration file. Also can be passed with the JUJUSYS_CONFIG environment
    /// variable.
    #[structopt(long = "config", env = "JUJUSYS_CONFIG")]
    config: Option<PathBuf>,
    /// Path to the datastore file. Overrides `datastorePath` from the configuration file.
    #[structopt(long = "datastore", env = "JUJUSYS_DATASTORE")]
    datastore: Option<PathBuf>,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Create a Juju controller and import its models.
    Bootstrap(bootstrap::Bootstrap),
    /// Show what jujusys knows about a controller.
    Status(status::Status),
}

#[tokio::main]
async fn main() {
    let args = Args::from_args();
    if let Err(e) = run(args).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BootstrapConfig::from_path(path).context(error::ConfigSnafu)?,
        None => BootstrapConfig::default(),
    };
    if let Some(path) = args.datastore {
        config.datastore_path = path;
    }
    init_agent_logger(
        env!("CARGO_CRATE_NAME"),
        Some(args.log_level),
        config.log_file.as_deref(),
    )
    .context(error::LoggerSnafu)?;
    debug!("Using datastore '{}'", config.datastore_path.display());

    let datastore = Arc::new(
        LocalDatastore::open(&config.datastore_path)
            .await
            .context(error::DatastoreSnafu)?,
    );
    match args.command {
        Command::Bootstrap(bootstrap) => bootstrap.run(config, datastore).await,
        Command::Status(status) => status.run(datastore).await,
    }
}
