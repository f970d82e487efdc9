//! Command dispatch and wiring.
//!
//! Loads settings, opens the store and wires the dimension cache,
//! ingestion pipeline and query service together for each subcommand.

use crate::cache::DimensionCache;
use crate::cli::args::{Args, AverageArgs, Commands, UpdateArgs};
use crate::config::Settings;
use crate::ingest::headers::HeaderPlan;
use crate::ingest::{IngestOptions, Pipeline, validate_year};
use crate::query::{Average, AverageQueryService};
use crate::store::Store;
use crate::Result;
use tracing::info;

/// Run the selected subcommand
pub fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Update(update_args) => run_update(update_args),
        Commands::Average(average_args) => run_average(average_args),
    }
}

fn setup_logging(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("postcode_speeds={log_level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

/// Run the ingestion job
fn run_update(args: UpdateArgs) -> Result<()> {
    setup_logging(args.get_log_level());

    args.validate()?;
    let year = validate_year(&args.year)?;
    let headers = HeaderPlan::new(
        args.postcode_header.as_deref(),
        &args.down_headers,
        &args.up_headers,
    )?;

    let settings = Settings::load(&args.settings)?;
    let store = Store::open(&settings)?;
    store.ensure_schema()?;
    let cache = DimensionCache::new();

    let pipeline = Pipeline::new(
        &store,
        &cache,
        IngestOptions {
            year,
            input_dir: args.csv_dir,
            headers,
            dry_run: args.dry_run,
        },
    );
    pipeline.run()?;

    info!("Done.");
    Ok(())
}

/// Query stored averages for one postcode and print them
fn run_average(args: AverageArgs) -> Result<()> {
    setup_logging(args.get_log_level());

    let settings = Settings::load(&args.settings)?;
    let store = Store::open(&settings)?;
    store.ensure_schema()?;
    let cache = DimensionCache::new();
    let service = AverageQueryService::new(&store, &cache);

    if args.lenient {
        let summary = service.get_averages_lenient(&args.postcode, &args.connection)?;
        if summary.results.is_empty() {
            println!("{}", summary.message);
        } else {
            print_averages(&summary.results);
        }
    } else {
        let results = service.get_averages(&args.postcode, &args.connection)?;
        if results.is_empty() {
            println!("No results.");
        } else {
            print_averages(&results);
        }
    }

    Ok(())
}

fn print_averages(results: &[Average]) {
    for average in results {
        println!(
            "{}: download {} Mbit/s, upload {} Mbit/s",
            average.connection,
            format_speed(average.download),
            format_speed(average.upload)
        );
    }
}

fn format_speed(speed: Option<f64>) -> String {
    match speed {
        Some(value) => format!("{value:.1}"),
        None => "-".to_string(),
    }
}
