//! Stock and Fund Signal Engine
//!
//! Trains the classifiers, prints fused signals and serves the JSON API.

use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use stock_signals::{
    api,
    client::price_source,
    config::Config,
    service::{export_predictions, SignalService, TrainReport},
    storage::{FileArtifactStore, LoadPolicy, ModelRegistry},
    strategy::FusionPolicy,
    types::FundHorizon,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "stock-signals")]
#[command(about = "Stock and fund direction classifiers with fused trading signals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Read prices from the CSV cache only
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Asset {
    Stock,
    Fund,
    All,
}

#[derive(Subcommand)]
enum Commands {
    /// Train classifiers and print their held-out reports
    Train {
        #[arg(long, value_enum, default_value = "all")]
        asset: Asset,
        /// Fund horizon in days; defaults to every configured horizon
        #[arg(long)]
        horizon: Option<u32>,
        /// Retrain even when an artifact exists
        #[arg(long)]
        force: bool,
    },
    /// Print the fused signal for a ticker
    Signal {
        #[arg(short, long)]
        ticker: String,
        /// Fund horizon in days
        #[arg(long)]
        horizon: Option<u32>,
        /// independent | categorical
        #[arg(long)]
        policy: Option<FusionPolicy>,
    },
    /// Dump the indicator table for a ticker as CSV
    Features {
        #[arg(short, long)]
        ticker: String,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Run the HTTP API
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    config.data.offline |= cli.offline;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    let service = Arc::new(build_service(config)?);

    match cli.command {
        Commands::Train {
            asset,
            horizon,
            force,
        } => train(&service, asset, horizon, force).await,
        Commands::Signal {
            ticker,
            horizon,
            policy,
        } => show_signal(&service, &ticker, horizon, policy).await,
        Commands::Features { ticker, limit } => show_features(&service, &ticker, limit).await,
        Commands::Serve => {
            let addr = service.config().server.bind_addr();
            api::serve(&addr, service).await?;
            Ok(())
        }
    }
}

fn build_service(config: Config) -> anyhow::Result<SignalService> {
    let source = price_source(&config.data)?;
    tracing::info!(source = source.name(), "Price source ready");

    let store = FileArtifactStore::new(config.models.artifact_path());
    let registry = Arc::new(ModelRegistry::new(Arc::new(store)));
    Ok(SignalService::new(source, registry, config))
}

fn horizon_or(days: Option<u32>, fallback: FundHorizon) -> anyhow::Result<FundHorizon> {
    match days {
        Some(d) => Ok(FundHorizon::from_days(d)?),
        None => Ok(fallback),
    }
}

fn print_report(report: &TrainReport) {
    let trained = &report.classifier;
    println!("\n=== {} ({}) ===", report.key, trained.model.name());
    let Some(metrics) = &report.metrics else {
        println!("Reused stored classifier trained at {}", trained.trained_at);
        return;
    };

    println!(
        "Rows: {} train ({} fitted), {} test",
        metrics.train_rows, metrics.fitted_rows, metrics.test_rows
    );
    println!("Accuracy: {:.3}", metrics.accuracy());
    println!("{}", metrics.report);
    println!("Latest prediction confidence: {:.3}", metrics.latest_confidence);
    if metrics.single_class_predictions {
        println!("Warning: every held-out prediction is the same class");
    }
    println!("Feature importances:");
    for (name, importance) in metrics.ranked_importances() {
        println!("  {:<14} {:.4}", name, importance);
    }
}

async fn train(
    service: &SignalService,
    asset: Asset,
    horizon: Option<u32>,
    force: bool,
) -> anyhow::Result<()> {
    let policy = LoadPolicy::for_training(force);
    if matches!(asset, Asset::Stock | Asset::All) {
        let report = service.train_stock(policy).await?;
        print_report(&report);
        if let Some(metrics) = &report.metrics {
            let path = service.config().models.predictions_path();
            export_predictions(&path, &metrics.test_predictions)?;
            println!("Predictions written to {}", path.display());
        }
    }

    if matches!(asset, Asset::Fund | Asset::All) {
        let horizons = match horizon {
            Some(d) => vec![FundHorizon::from_days(d)?],
            None => service.config().models.horizons.clone(),
        };
        for report in service.train_funds(&horizons, policy).await? {
            print_report(&report);
        }
    }
    Ok(())
}

async fn show_signal(
    service: &SignalService,
    ticker: &str,
    horizon: Option<u32>,
    policy: Option<FusionPolicy>,
) -> anyhow::Result<()> {
    let horizon = horizon_or(horizon, service.config().models.default_horizon)?;
    let combined = service.combined_signal(ticker, horizon, policy).await?;

    println!("\nTicker: {} (as of {})", combined.ticker, combined.as_of);
    match combined.stock {
        Some(p) => println!("Stock model confidence: {:.3}", p.probability_up),
        None => println!("Stock model confidence: n/a"),
    }
    match combined.etf {
        Some(p) => println!("Fund {} confidence:   {:.3}", combined.horizon, p.probability_up),
        None => println!("Fund {} confidence:   n/a", combined.horizon),
    }
    println!("Policy: {}", combined.policy);
    println!("Signal: {}", combined.signal.label());
    Ok(())
}

async fn show_features(service: &SignalService, ticker: &str, limit: usize) -> anyhow::Result<()> {
    let rows = service.features(ticker, limit).await?;
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
