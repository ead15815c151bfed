use crate::commands::{
    run_batch, run_favorites, run_geocode, run_hazards, run_report, run_score, BatchArgs,
    FavoritesCommand, GeocodeArgs, HazardArgs, ReportArgs, ScoreArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use sowsure::config::AppConfig;
use sowsure::error::AppError;
use sowsure::telemetry::{self, LogOutput};

#[derive(Parser, Debug)]
#[command(
    name = "Sow Sure",
    about = "Score farmer loan applications against financial and natural hazard risk",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score one application from a JSON file and print the assessment
    Score(ScoreArgs),
    /// Score every row of a CSV file of applications
    Batch(BatchArgs),
    /// Look up natural hazard levels for a point
    Hazards(HazardArgs),
    /// Geocode an address and download its hazard assessment report
    Report(ReportArgs),
    /// Resolve an address to Philippine coordinates
    Geocode(GeocodeArgs),
    /// Manage saved farm locations
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommand,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

impl Command {
    /// The server logs to stdout; one-shot commands keep stdout for their reports.
    fn log_output(&self) -> LogOutput {
        match self {
            Command::Serve(_) => LogOutput::Stdout,
            _ => LogOutput::Stderr,
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, command.log_output())?;

    match command {
        Command::Serve(args) => server::run(config, args).await,
        Command::Score(args) => run_score(&config, args).await,
        Command::Batch(args) => run_batch(args),
        Command::Hazards(args) => run_hazards(&config, args).await,
        Command::Report(args) => run_report(&config, args).await,
        Command::Geocode(args) => run_geocode(&config, args).await,
        Command::Favorites { command } => run_favorites(&config, command).await,
    }
}
