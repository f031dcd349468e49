use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use knnrec_api::RestApi;
use knnrec_core::{LabeledReport, PredictionMode, Recommender, RecommenderConfig, SimilarityMetric};
use knnrec_storage::{Dataset, DatasetConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Neighborhood-based rating prediction
#[derive(Parser, Debug)]
#[command(name = "knnrec")]
#[command(about = "k-nearest-neighbor collaborative filtering", long_about = None)]
struct Args {
    /// Directory holding u.data and u.item
    #[arg(short, long, default_value = "./movieLens_data", global = true)]
    data_dir: PathBuf,

    /// Always parse the text files, never read or write the dataset cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Log level
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict USER's rating of ITEM from K neighbors
    Predict {
        user: u32,
        item: u32,
        k: usize,

        /// Pipelines to run: user, item or both
        #[arg(long, default_value = "both")]
        mode: PredictionMode,

        /// Similarity metric: pearson or cosine
        #[arg(long, default_value = "pearson")]
        metric: SimilarityMetric,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Serve predictions over HTTP
    Serve {
        /// HTTP API port
        #[arg(long, default_value_t = 8080)]
        http_port: u16,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting knnrec v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);

    let config = DatasetConfig {
        use_cache: !args.no_cache,
        ..DatasetConfig::new(&args.data_dir)
    };
    let dataset = Dataset::open(&config)
        .with_context(|| format!("failed to load dataset from {:?}", args.data_dir))?;

    match args.command {
        Command::Predict {
            user,
            item,
            k,
            mode,
            metric,
            format,
        } => {
            let recommender = Recommender::new(dataset.matrix(), RecommenderConfig { k, metric, mode })?;
            let reports = recommender.recommend(user, item)?;

            let label = dataset.item_label(item);
            let labeled: Vec<LabeledReport<'_>> = reports
                .iter()
                .map(|report| LabeledReport::new(report, &label))
                .collect();

            match format {
                OutputFormat::Text => {
                    for report in &labeled {
                        println!("{}", report);
                    }
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&labeled)?);
                }
            }
        }
        Command::Serve { http_port } => serve(Arc::new(dataset), http_port).await,
    }

    Ok(())
}

async fn serve(dataset: Arc<Dataset>, http_port: u16) {
    let http_handle = std::thread::spawn(move || {
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(dataset, http_port).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
}
