use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::PathBuf;

use daten_export::config::{data_dir, Config};
use daten_export::export::{
    copy_export, CancellationToken, CsvFlavor, DuplicatePolicy, ExportJob, ExportSummary,
};
use daten_export::logging::{init_logging, LogConfig, LogFormat};
use daten_export::model::BuildingModel;
use daten_export::parser::parse_ifc_file;
use daten_export::ui::{headless, StatusWindow};

const LOG_FILENAME: &str = "daten-export.log";

#[derive(Parser, Debug)]
#[command(name = "daten-export")]
#[command(about = "DatenExport - export element parameters of a building model to CSV")]
#[command(version)]
struct Args {
    /// Path to IFC file
    #[arg(required_unless_present = "show_config")]
    file: Option<PathBuf>,

    /// Export file (defaults to the configured location)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,

    /// Console progress bar instead of the status window
    #[arg(long)]
    headless: bool,

    /// Save a copy of the finished export here
    #[arg(long, value_name = "FILE")]
    copy_to: Option<PathBuf>,

    /// CSV dialect (overrides the config file)
    #[arg(long, value_enum)]
    flavor: Option<CsvFlavor>,

    /// Fail on elements with two valued parameters of the same name
    #[arg(long)]
    strict_duplicates: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Log file (the status window always logs to a file)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let (config, config_path) = Config::load_or_init(args.config.as_deref())?;

    if args.show_config {
        print!("{}", config.describe(&config_path)?);
        return Ok(());
    }

    let log_file = match (&args.log_file, args.headless) {
        (Some(path), _) => Some(path.clone()),
        (None, false) => Some(data_dir()?.join(LOG_FILENAME)),
        (None, true) => None,
    };
    init_logging(
        &LogConfig::from_verbosity(args.verbose)
            .with_format(args.log_format)
            .with_log_file(log_file),
    )?;

    let file = args
        .file
        .as_deref()
        .ok_or_else(|| eyre!("no model file given"))?;
    let model = parse_ifc_file(file)?;

    let mut options = config.export_options();
    if let Some(flavor) = args.flavor {
        options.flavor = flavor;
    }
    if args.strict_duplicates {
        options.duplicates = DuplicatePolicy::Strict;
    }
    let output = match &args.output {
        Some(path) => path.clone(),
        None => config.export_path()?,
    };
    let job = ExportJob::new(output, CancellationToken::new()).with_options(options);

    let summary = if args.headless {
        run_headless(&args, &job, &model)?
    } else {
        run_with_status_window(&args, &job, &model)?
    };

    if let (Some(summary), Some(destination)) = (summary, &args.copy_to) {
        copy_export(&summary.path, destination)?;
        if args.headless {
            println!("Copied to: {}", destination.display());
        }
    }
    Ok(())
}

/// `None` when the user declined or cancelled.
fn run_headless(
    args: &Args,
    job: &ExportJob,
    model: &BuildingModel,
) -> Result<Option<ExportSummary>> {
    let confirmed = args.yes
        || headless::confirm(
            &mut std::io::stdin().lock(),
            &mut std::io::stdout(),
            model.total_elements(),
        )?;
    if !confirmed {
        return Ok(None);
    }
    headless::cancel_on_interrupt(job.token())?;

    match headless::run_with_progress_bar(job, &model.elements) {
        Ok(summary) => {
            print_summary(&summary);
            Ok(Some(summary))
        }
        Err(err) if err.is_cancelled() => {
            println!("Export cancelled");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn run_with_status_window(
    args: &Args,
    job: &ExportJob,
    model: &BuildingModel,
) -> Result<Option<ExportSummary>> {
    let window = StatusWindow::spawn(
        model.name.clone(),
        model.total_elements(),
        job.token().clone(),
        !args.yes,
    )?;

    if !args.yes && !window.confirmed() {
        window.close()?;
        return Ok(None);
    }

    let outcome = job.run(&model.elements, &window.events);
    window.finish(&outcome)?;

    match outcome {
        Ok(summary) => Ok(Some(summary)),
        Err(err) if err.is_cancelled() => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn print_summary(summary: &ExportSummary) {
    println!("Export ready at: {}", summary.path.display());
    println!(
        "  {} rows, {} parameter columns, {} elements skipped",
        summary.rows, summary.columns, summary.skipped
    );
}
