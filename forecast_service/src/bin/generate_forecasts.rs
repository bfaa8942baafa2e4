//! generate_forecasts - rebuild the project forecast caches
//!
//! Reads settings from `config/forecasts.*` and `PROJECT_FORECASTS__*`
//! variables; log verbosity follows `RUST_LOG`.

use anyhow::{bail, Context, Result};
use forecast_core::ForecastAssembler;
use forecast_service::{generate_all, CategoryGroup, ForecastCache, JsonDirSource, Settings};
use std::env;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    semesters: Option<usize>,
    lookup: Option<(CategoryGroup, String)>,
}

fn parse_args(args: &[String]) -> Result<Option<Args>> {
    let mut parsed = Args::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "-c" | "--config" => {
                let path = iter.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "-s" | "--semesters" => {
                let value = iter.next().context("--semesters needs a number")?;
                let semesters = value
                    .parse()
                    .with_context(|| format!("invalid semester count: {}", value))?;
                if semesters == 0 {
                    bail!("--semesters must be at least 1");
                }
                parsed.semesters = Some(semesters);
            }
            "--lookup" => {
                let group = iter.next().context("--lookup needs a group and a name")?;
                let name = iter.next().context("--lookup needs a category name")?;
                parsed.lookup = Some((group.parse()?, name.clone()));
            }
            other => bail!("unknown option: {}", other),
        }
    }

    Ok(Some(parsed))
}

fn print_usage() {
    println!("generate_forecasts - rebuild the project forecast caches");
    println!();
    println!("USAGE:");
    println!("    generate_forecasts [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>         Extra settings file");
    println!("    -s, --semesters <N>         Semesters to forecast");
    println!("        --lookup <GROUP> <NAME> Print one cached record after generating");
    println!("    -h, --help                  Show this help");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let argv: Vec<String> = env::args().collect();
    let Some(args) = parse_args(&argv)? else {
        print_usage();
        return Ok(());
    };

    let mut settings =
        Settings::load(args.config.as_deref()).context("failed to load settings")?;
    if let Some(semesters) = args.semesters {
        settings.semesters = Some(semesters);
    }

    info!(
        source = %settings.source_dir.display(),
        cache = %settings.cache_dir.display(),
        semesters = settings.horizon(),
        "generating project forecasts"
    );

    let source = JsonDirSource::new(&settings.source_dir);
    let cache = ForecastCache::new(&settings.cache_dir);
    let mut assembler = ForecastAssembler::from_config(settings.forecast.clone())?;

    let summaries = generate_all(&source, &cache, &mut assembler, settings.horizon())?;
    for summary in &summaries {
        println!(
            "{:<6} {:>4} categories -> {}",
            summary.group,
            summary.categories,
            summary.path.display()
        );
    }

    if let Some((group, name)) = args.lookup {
        let record = cache.find(group, &name, settings.horizon())?;
        println!("{}", serde_json::to_string_pretty(&record)?);
    }

    Ok(())
}
