//! docsync - command-line client for Cockpit-style collection APIs.
//!
//! Downloads documents into a local mirror, and uploads edits back with a
//! structural diff and optimistic locking on the `_modified` revision.

use clap::{Parser, Subcommand};
use docsync::commands::{self, get::GetArgs, update::UpdateArgs};
use docsync::{CliError, Config, HttpStore, Mirror, Overrides};
use docsync_engine::Format;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "docsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pull, diff and push documents of a collection-based CMS")]
struct Cli {
    /// Instance alias defined in the config file
    #[arg(short, long)]
    instance: String,

    /// Override the base URL of the instance
    #[arg(long)]
    url: Option<String>,

    /// Override the API token
    #[arg(short = 't', long, env = "COCKPIT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Root of the local document mirror
    #[arg(long, default_value = "docs", value_name = "DIR")]
    docs_dir: PathBuf,

    /// Log requests and reconciliation steps to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List collection names, or the documents of one collection
    List {
        collection: Option<String>,

        /// Maximum number of documents
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Download a document into the local mirror
    Get {
        collection: String,
        id: String,

        /// json or yaml
        #[arg(short, long, default_value = "json")]
        format: Format,

        /// Output file (default: <docs-dir>/<collection>/<id>.<format>)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Upload a local document with optimistic locking
    Update {
        collection: String,
        id: Option<String>,

        /// Show the diff and the call that would be made, but save nothing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Format of the local file (json or yaml)
        #[arg(short, long)]
        format: Option<Format>,

        /// Read the document from this file instead of the mirror
        #[arg(short = 't', long, value_name = "FILE")]
        tempfile: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "docsync=debug,docsync_engine=debug"
    } else {
        "docsync=warn,docsync_engine=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::load()?;
    let overrides = Overrides {
        url: cli.url,
        token: cli.token,
    };
    let connection = config.connect(&cli.instance, &overrides)?;
    tracing::debug!(instance = %cli.instance, url = %connection.base_url, "resolved instance");

    let store = HttpStore::new(connection)?;
    let mirror = Mirror::new(cli.docs_dir);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::List { collection, limit } => {
            commands::list::run(&store, collection.as_deref(), limit, &mut out)
        }
        Command::Get {
            collection,
            id,
            format,
            output,
        } => {
            let args = GetArgs {
                collection: &collection,
                id: &id,
                format,
                output: output.as_deref(),
            };
            commands::get::run(&store, &mirror, args, &mut out).map(|_| ())
        }
        Command::Update {
            collection,
            id,
            dry_run,
            format,
            tempfile,
        } => {
            let args = UpdateArgs {
                collection: &collection,
                id: id.as_deref(),
                format,
                tempfile: tempfile.as_deref(),
                dry_run,
            };
            commands::update::run(&store, &mirror, args, &mut out).map(|_| ())
        }
    }
}
