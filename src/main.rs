use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use rostmerge::console::StdinConsole;
use rostmerge::ops;
use rostmerge::{MergeError, Result};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging()?;
    match cli.command {
        Command::Ingest(args) => ops::ingest(
            &cli.database,
            args.ts.as_deref(),
            args.usatf.as_deref(),
            args.clear,
        ),
        Command::Coaches(args) => ops::assign_coaches(&cli.database, &mut StdinConsole, args.clear),
        Command::Merge(args) => ops::merge_usatf(&cli.database, &mut StdinConsole, args.clear),
        Command::Export(args) => {
            ops::export_roster(&cli.database, &args.output, args.year).map(|_| ())
        }
    }
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| MergeError::Logging(error.to_string()))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge TeamSnap and USATF roster information."
)]
struct Cli {
    /// Roster database path.
    #[arg(short, long, global = true, default_value = "roster.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize the database and/or ingest roster data.
    Ingest(IngestArgs),
    /// Set (or clear) coach designations.
    Coaches(CoachesArgs),
    /// Match roster entries against USATF membership data.
    Merge(MergeArgs),
    /// Export the merged roster as a formatted workbook.
    Export(ExportArgs),
}

#[derive(clap::Args)]
#[command(group(
    ArgGroup::new("source").required(true).multiple(true).args(["ts", "usatf"])
))]
struct IngestArgs {
    /// CSV or XLSX roster exported from TeamSnap.
    #[arg(short, long, value_name = "TS_ROSTER")]
    ts: Option<PathBuf>,

    /// CSV or XLSX USATF membership and age verification export.
    #[arg(short, long, value_name = "USATF_DATA")]
    usatf: Option<PathBuf>,

    /// Remove entries missing from the newly ingested TeamSnap roster.
    #[arg(short, long)]
    clear: bool,
}

#[derive(clap::Args)]
struct CoachesArgs {
    /// Clear all coach designations and exit.
    #[arg(short, long)]
    clear: bool,
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Clear existing USATF matches and exit.
    #[arg(short, long)]
    clear: bool,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Name of the exported roster file.
    output: PathBuf,

    /// Year used for the age calculation, defaults to the current year.
    #[arg(short, long)]
    year: Option<i32>,
}
