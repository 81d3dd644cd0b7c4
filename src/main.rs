use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use synthgen::app::{
    ArtifactTargets, DownloadDirectorySink, FormSubmission, GenerationController, IntakeOutcome,
    PresentationSurfaces, SubmissionOutcome,
};
use synthgen::domain::{FormId, GenerationMode};
use synthgen::infra::SystemReportViewer;
use synthgen::infra::backend::HttpGenerationBackend;
use synthgen::infra::config::{ClientConfig, ENV_BASE_URL, ENV_DOWNLOAD_DIR};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "synthgen=info";
const DEFAULT_ROWS: &str = "1000";
const DEFAULT_FORMAT: &str = "csv";

/// Backend, transport or delivery failure.
const EXIT_ERROR: u8 = 1;
/// Input rejected before anything was sent to the backend.
const EXIT_USAGE: u8 = 2;

#[derive(Parser)]
#[command(name = "synthgen")]
#[command(about = "Request synthetic datasets and EDA reports from a synthgen backend")]
#[command(version)]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = ENV_BASE_URL)]
    base_url: Option<String>,

    /// Directory that receives generated datasets
    #[arg(long, global = true, env = ENV_DOWNLOAD_DIR)]
    download_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate data from a free-text description
    Prompt {
        /// Description of the dataset to generate
        prompt: String,
        #[arg(long, short = 'r', default_value = DEFAULT_ROWS)]
        rows: String,
        #[arg(long, short = 'f', default_value = DEFAULT_FORMAT)]
        format: String,
    },
    /// Generate data that mimics an uploaded CSV or Excel file
    File {
        file: PathBuf,
        #[arg(long, short = 'r', default_value = DEFAULT_ROWS)]
        rows: String,
        #[arg(long, short = 'f', default_value = DEFAULT_FORMAT)]
        format: String,
        /// Do not ask the backend to preserve column statistics
        #[arg(long)]
        no_preserve_stats: bool,
    },
    /// Generate data from a JSON schema (inline text or @path)
    Schema {
        schema: String,
        #[arg(long, short = 'r', default_value = DEFAULT_ROWS)]
        rows: String,
        #[arg(long, short = 'f', default_value = DEFAULT_FORMAT)]
        format: String,
    },
    /// Generate a synthetic time series from a CSV file
    Timeseries {
        file: PathBuf,
        #[arg(long, short = 'r', default_value = DEFAULT_ROWS)]
        rows: String,
    },
    /// Build an exploratory data analysis report and open it
    Eda { file: PathBuf },
    /// Check that the backend is reachable
    Health,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("synthgen: {message}");
            return ExitCode::FAILURE;
        }
    };
    let backend = match HttpGenerationBackend::from_config(&config) {
        Ok(backend) => backend,
        Err(error) => {
            eprintln!("synthgen: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Commands::Health = cli.command {
        return match backend.health() {
            Ok(health) => {
                println!(
                    "{}: {}",
                    health.status,
                    health.message.unwrap_or_default()
                );
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("synthgen: backend at {} is unavailable: {error}", config.base_url);
                ExitCode::FAILURE
            }
        };
    }

    let (mode, file, submission) = match command_submission(cli.command) {
        Ok(parts) => parts,
        Err(message) => {
            eprintln!("synthgen: {message}");
            return ExitCode::FAILURE;
        }
    };

    let surfaces = PresentationSurfaces::new();
    let form = FormId::new(format!("{mode}-form"));
    let mut controller = GenerationController::new(
        mode,
        form.clone(),
        surfaces.clone(),
        Arc::new(backend),
        ArtifactTargets {
            downloads: Arc::new(DownloadDirectorySink::new(&config.download_dir)),
            viewer: Arc::new(SystemReportViewer::new(&config.report_dir)),
        },
    );

    if let Some(path) = file {
        match controller.choose_path(&path) {
            IntakeOutcome::Accepted { .. } | IntakeOutcome::Ignored => {}
            IntakeOutcome::Rejected { message } => {
                eprintln!("{message}");
                return ExitCode::FAILURE;
            }
        }
    }

    let outcome = controller.submit(submission);
    if let Some(record) = surfaces.notifications.latest(&form) {
        println!("{}", record.message);
    }
    if let Some(delivery) = outcome.delivery() {
        println!("{}", delivery.path.display());
    }
    ExitCode::from(exit_status(&outcome))
}

fn exit_status(outcome: &SubmissionOutcome) -> u8 {
    match outcome.error() {
        None => 0,
        Some(error) if error.is_local() => EXIT_USAGE,
        Some(_) => EXIT_ERROR,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig, String> {
    let mut config = ClientConfig::from_env().map_err(|error| error.to_string())?;
    if let Some(base_url) = cli.base_url.as_ref().filter(|url| !url.trim().is_empty()) {
        config.base_url = base_url.trim().to_string();
    }
    if let Some(download_dir) = cli.download_dir.as_ref() {
        config.download_dir = download_dir.clone();
    }
    Ok(config)
}

fn command_submission(
    command: Commands,
) -> Result<(GenerationMode, Option<PathBuf>, FormSubmission), String> {
    let parts = match command {
        Commands::Prompt {
            prompt,
            rows,
            format,
        } => (
            GenerationMode::Prompt,
            None,
            FormSubmission::Prompt {
                prompt,
                rows,
                format,
            },
        ),
        Commands::File {
            file,
            rows,
            format,
            no_preserve_stats,
        } => (
            GenerationMode::File,
            Some(file),
            FormSubmission::File {
                rows,
                format,
                preserve_stats: !no_preserve_stats,
            },
        ),
        Commands::Schema {
            schema,
            rows,
            format,
        } => (
            GenerationMode::Schema,
            None,
            FormSubmission::Schema {
                schema_text: read_schema_argument(&schema)?,
                rows,
                format,
            },
        ),
        Commands::Timeseries { file, rows } => (
            GenerationMode::TimeSeries,
            Some(file),
            FormSubmission::TimeSeries { rows },
        ),
        Commands::Eda { file } => (GenerationMode::Eda, Some(file), FormSubmission::Eda),
        Commands::Health => return Err("health has no generation request".to_string()),
    };
    Ok(parts)
}

fn read_schema_argument(raw: &str) -> Result<String, String> {
    match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|error| format!("could not read schema file {path}: {error}")),
        None => Ok(raw.to_string()),
    }
}
