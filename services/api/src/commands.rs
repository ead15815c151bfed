use crate::infra::build_service;
use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value;
use sowsure::config::AppConfig;
use sowsure::error::AppError;
use sowsure::workflows::assessment::{
    ApplicantSubmission, AssessmentRequest, AssessmentService, HazardLookup, DEFAULT_REPORT_DIR,
};
use sowsure::workflows::batch::{score_batch_file, write_results_file, BatchSummary};
use sowsure::workflows::location::{
    Coordinates, FavoriteLocation, FavoritesStore, LocationError,
};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file with an application, or an assessment request with `applicant` and `location`
    #[arg(long)]
    pub(crate) input: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV file with one application per row
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Write per-row results to this CSV file
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct HazardArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) lng: f64,
    /// Address passed to the analysis for context
    #[arg(long)]
    pub(crate) address: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Address of the farm, e.g. "Cabanatuan, Nueva Ecija"
    pub(crate) address: String,
    /// Directory the report PDF is saved to
    #[arg(short, long, default_value = DEFAULT_REPORT_DIR)]
    pub(crate) output: PathBuf,
    /// Resolve the address and print its coordinates without downloading the report
    #[arg(long)]
    pub(crate) coords_only: bool,
    /// Use these coordinates instead of geocoding the address
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub(crate) lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub(crate) lng: Option<f64>,
}

#[derive(Args, Debug)]
pub(crate) struct GeocodeArgs {
    /// Free-text address, e.g. "Cabanatuan, Nueva Ecija"
    pub(crate) query: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum FavoritesCommand {
    /// List saved locations
    List,
    /// Save a location, geocoding the address unless coordinates are given
    Add(FavoriteAddArgs),
    /// Remove a saved location by name
    Remove { name: String },
    /// Remove every saved location
    Clear,
}

#[derive(Args, Debug)]
pub(crate) struct FavoriteAddArgs {
    pub(crate) name: String,
    pub(crate) address: String,
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub(crate) lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub(crate) lng: Option<f64>,
}


fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn run_score(config: &AppConfig, args: ScoreArgs) -> Result<(), AppError> {
    let raw = fs::read_to_string(&args.input)?;
    let request = parse_score_input(&raw)?;
    let report = build_service(config)?.assess(request).await?;
    print_json(&report)
}

/// `score --input` accepts a full assessment request when the document has an `applicant`
/// key, otherwise a bare application.
fn parse_score_input(raw: &str) -> Result<AssessmentRequest, AppError> {
    let value: Value = serde_json::from_str(raw)?;
    if value.get("applicant").is_some() {
        return Ok(serde_json::from_value(value)?);
    }
    let applicant: ApplicantSubmission = serde_json::from_value(value)?;
    Ok(AssessmentRequest {
        applicant,
        location: None,
    })
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let summary = score_batch_file(&args.csv)?;
    print_batch_summary(&summary);

    if let Some(output) = args.output {
        write_results_file(&summary, &output)?;
        println!("Results written to {}", output.display());
    }
    Ok(())
}

fn print_batch_summary(summary: &BatchSummary) {
    println!("Batch scoring summary");
    println!("=====================");
    println!("Total rows : {}", summary.total);
    println!("Scored     : {}", summary.successful);
    println!("Failed     : {}", summary.failed);
    println!("Success    : {:.2}%", summary.success_rate);

    for row in &summary.results {
        let label = row.label.as_deref().unwrap_or("-");
        match (&row.result, &row.error) {
            (Some(result), _) => println!(
                "  row {:>3} {label:<16} {:>3} {}",
                row.row, result.score, result.classification
            ),
            (None, Some(error)) => println!("  row {:>3} {label:<16} failed: {error}", row.row),
            (None, None) => println!("  row {:>3} {label:<16} failed", row.row),
        }
    }
}

pub(crate) async fn run_hazards(config: &AppConfig, args: HazardArgs) -> Result<(), AppError> {
    let lookup = HazardLookup {
        coordinates: Coordinates::new(args.lat, args.lng),
        address: args.address,
    };
    let assessment = build_service(config)?.assess_hazards(&lookup).await;
    if let Some(warning) = &assessment.warning {
        eprintln!("warning: {warning}");
    }
    print_json(&assessment)
}

pub(crate) async fn run_report(config: &AppConfig, args: ReportArgs) -> Result<(), AppError> {
    let service = build_service(config)?;
    let coordinates = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
        _ => first_match(&service, &args.address).await?,
    };
    println!(
        "{}: {:.4}, {:.4}",
        args.address, coordinates.lat, coordinates.lng
    );

    if args.coords_only {
        return Ok(());
    }

    let path = service.download_report(coordinates, &args.output).await?;
    println!("Hazard report saved to {}", path.display());
    Ok(())
}

async fn first_match(service: &AssessmentService, address: &str) -> Result<Coordinates, AppError> {
    let candidates = service.resolve_location(address).await?;
    let candidate = candidates
        .first()
        .ok_or_else(|| LocationError::NoResults(address.to_string()))?;
    Ok(candidate.coordinates)
}

pub(crate) async fn run_geocode(config: &AppConfig, args: GeocodeArgs) -> Result<(), AppError> {
    let candidates = build_service(config)?.resolve_location(&args.query).await?;
    for candidate in &candidates {
        println!(
            "{:>9.4}, {:>9.4}  {}",
            candidate.coordinates.lat, candidate.coordinates.lng, candidate.display_name
        );
    }
    Ok(())
}

pub(crate) async fn run_favorites(
    config: &AppConfig,
    command: FavoritesCommand,
) -> Result<(), AppError> {
    let store = FavoritesStore::new(config.assessment.favorites_path.clone());

    match command {
        FavoritesCommand::List => {
            let favorites = store.list()?;
            if favorites.is_empty() {
                println!("No saved locations in {}", store.path().display());
            }
            for favorite in &favorites {
                println!("{}", describe_favorite(favorite));
            }
        }
        FavoritesCommand::Add(args) => {
            let coordinates = match (args.lat, args.lng) {
                (Some(lat), Some(lng)) => {
                    let coordinates = Coordinates::new(lat, lng);
                    coordinates.validate()?;
                    coordinates
                }
                _ => first_match(&build_service(config)?, &args.address).await?,
            };
            let favorite = store.add(&args.name, &args.address, coordinates)?;
            println!("Saved {}", describe_favorite(&favorite));
        }
        FavoritesCommand::Remove { name } => {
            let removed = store.remove(&name)?;
            println!("Removed '{}'", removed.name);
        }
        FavoritesCommand::Clear => {
            let count = store.clear()?;
            println!("Cleared {count} saved location(s)");
        }
    }
    Ok(())
}

fn describe_favorite(favorite: &FavoriteLocation) -> String {
    let added = favorite
        .date_added
        .map(|date| format!(" (added {})", date.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!(
        "{}: {} [{:.4}, {:.4}]{added}",
        favorite.name, favorite.address, favorite.coordinates.lat, favorite.coordinates.lng
    )
}
