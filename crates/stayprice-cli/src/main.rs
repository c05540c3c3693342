use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use stayprice::api::{IndexStrategy, DEFAULT_RADIUS_KM};
use stayprice::dataset::{clean, read_clean_csv, read_raw_csv, write_clean_csv};
use stayprice::features::{build_features, FeatureConfig, FeatureTable};
use stayprice::model::{train, TrainConfig};
use stayprice::primitives::CandidateScope;

#[derive(Parser, Debug)]
#[command(name = "stayprice", version, about = "Short-term rental price pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clean a raw listings export: retained columns, parsed prices.
    Clean {
        /// Raw listings CSV.
        input: PathBuf,
        /// Destination for the cleaned CSV.
        output: PathBuf,
    },
    /// Build the numeric feature table, including the neighbor columns.
    Features {
        /// Cleaned listings CSV.
        input: PathBuf,
        /// Destination for the feature CSV.
        output: PathBuf,
        /// Neighbor radius in kilometers.
        #[arg(long, default_value_t = DEFAULT_RADIUS_KM)]
        radius_km: f64,
        /// Which rows serve as neighbor candidates.
        #[arg(long, value_enum, default_value_t = ScopeArg::All)]
        scope: ScopeArg,
        /// Candidate lookup strategy.
        #[arg(long, value_enum, default_value_t = IndexArg::Grid)]
        index: IndexArg,
        /// Aggregate listings on a single thread.
        #[arg(long)]
        sequential: bool,
    },
    /// Train and cross-validate a price regression on a feature table.
    Train {
        /// Feature CSV produced by `features`.
        input: PathBuf,
        /// Training configuration (TOML); defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Destination for the fitted model (JSON).
        #[arg(long, default_value = "model.json")]
        model_out: PathBuf,
        /// Optional destination for cross-validation scores (JSON).
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    /// Every positioned listing is a candidate.
    All,
    /// Only listings with a parsed price are candidates.
    PricedOnly,
}

impl From<ScopeArg> for CandidateScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::All => CandidateScope::AllListings,
            ScopeArg::PricedOnly => CandidateScope::PricedOnly,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IndexArg {
    Scan,
    Grid,
}

impl From<IndexArg> for IndexStrategy {
    fn from(arg: IndexArg) -> Self {
        match arg {
            IndexArg::Scan => IndexStrategy::Scan,
            IndexArg::Grid => IndexStrategy::Grid,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Clean { input, output } => run_clean(&input, &output),
        Commands::Features {
            input,
            output,
            radius_km,
            scope,
            index,
            sequential,
        } => {
            let config = FeatureConfig {
                radius_km,
                scope: scope.into(),
                parallel: !sequential,
                strategy: index.into(),
            };
            run_features(&input, &output, &config)
        }
        Commands::Train {
            input,
            config,
            model_out,
            metrics_out,
        } => run_train(&input, config.as_deref(), &model_out, metrics_out.as_deref()),
    }
}

fn run_clean(input: &Path, output: &Path) -> anyhow::Result<()> {
    let file =
        File::open(input).with_context(|| format!("open raw listings {}", input.display()))?;
    let records = clean(read_raw_csv(file)?);
    write_clean_csv(create(output)?, &records)?;
    println!("cleaned {} rows -> {}", records.len(), output.display());
    Ok(())
}

fn run_features(input: &Path, output: &Path, config: &FeatureConfig) -> anyhow::Result<()> {
    let file = File::open(input)
        .with_context(|| format!("open cleaned listings {}", input.display()))?;
    let records = read_clean_csv(file)?;
    let table = build_features(&records, config)?;
    table.write_csv(create(output)?)?;
    println!(
        "{} rows x {} columns -> {}",
        table.rows.len(),
        table.names.len() + 1,
        output.display()
    );
    Ok(())
}

fn run_train(
    input: &Path,
    config: Option<&Path>,
    model_out: &Path,
    metrics_out: Option<&Path>,
) -> anyhow::Result<()> {
    let config: TrainConfig = match config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("read train config {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parse train config {}", path.display()))?
        }
        None => TrainConfig::default(),
    };
    info!("train config: {config:?}");

    let file =
        File::open(input).with_context(|| format!("open feature table {}", input.display()))?;
    let table = FeatureTable::read_csv(file)?;
    let report = train(&table, &config)?;

    report.artifact.save(create(model_out)?)?;
    if let Some(path) = metrics_out {
        serde_json::to_writer_pretty(create(path)?, &report.scores)?;
    }

    println!("model: {}", config.model.name());
    println!("mean mse: {:.6}", report.scores.mean_mse);
    println!("mean rmse: {:.6}", report.scores.mean_rmse);
    println!("mean r2: {:.6}", report.scores.mean_r2);
    println!("model -> {}", model_out.display());
    Ok(())
}

fn create(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("create {}", path.display()))
}
