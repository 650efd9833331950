// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use news_medallion::utils::logging::{
    format_error, format_info, format_report, format_step, format_success, format_warning,
    init_logger,
};
use news_medallion::{
    ArtifactLayout, ArtifactRef, BronzeRecord, ColumnarRecord, Config, EmbeddingModel, Fetcher,
    GoldRecord, LanceDbClient, LocalObjectStore, ObjectStore, PipelineError, PipelineRunner,
    RetryPolicy, RunLock, SchemaManager, SilverRecord, Stage, Validator, import_directory,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "news_medallion")]
#[command(version = "0.1.0")]
#[command(about = "Medallion ETL for news articles with a LanceDB similarity index", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run extraction, normalization, enrichment and embedding in order
    Run {
        /// Fail on the first stage error instead of retrying
        #[arg(long)]
        no_retry: bool,
    },

    /// Run a single stage against the current artifacts
    Stage {
        #[arg(value_enum)]
        stage: Stage,

        #[arg(long)]
        no_retry: bool,
    },

    /// Copy *.html files from a local directory into the raw bucket
    Import { dir: PathBuf },

    /// Download pages into the raw bucket
    Fetch {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Search indexed articles by semantic similarity
    Search {
        query: String,

        #[arg(short, long)]
        limit: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Row counts per artifact and in the index
    Stats,

    /// Drop the similarity index collection
    Reset {
        #[arg(long)]
        confirm: bool,
    },

    /// Remove a run lock left behind by an interrupted run
    Unlock {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        let config = Config::default_config();
        config.validate().context("Invalid default configuration")?;
        config
    };

    match cli.command {
        Commands::Run { no_retry } => cmd_run(&config, cli.color, no_retry).await?,
        Commands::Stage { stage, no_retry } => {
            cmd_stage(&config, cli.color, stage, no_retry).await?
        }
        Commands::Import { dir } => cmd_import(&config, &dir)?,
        Commands::Fetch { urls } => cmd_fetch(&config, &urls).await?,
        Commands::Search { query, limit, json } => cmd_search(&config, &query, limit, json).await?,
        Commands::Stats => cmd_stats(&config).await?,
        Commands::Reset { confirm } => cmd_reset(&config, confirm).await?,
        Commands::Unlock { force } => cmd_unlock(&config, force)?,
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<LocalObjectStore> {
    LocalObjectStore::new(&config.storage.root).context("Failed to open object store")
}

async fn open_index(config: &Config) -> Result<LanceDbClient> {
    let client = LanceDbClient::new(config.index.clone())
        .await
        .context("Failed to create LanceDB client")?;

    client.ping().await.context("Database connection failed")?;
    Ok(client)
}

fn retry_policy(config: &Config, no_retry: bool) -> RetryPolicy {
    if no_retry {
        RetryPolicy::new(0, config.pipeline.retry_delay())
    } else {
        RetryPolicy::from_config(&config.pipeline)
    }
}

async fn cmd_run(config: &Config, color: bool, no_retry: bool) -> Result<()> {
    info!("Starting medallion pipeline");

    let store = open_store(config)?;
    let index = open_index(config).await?;
    let model = EmbeddingModel::from_config(&config.embedding)?;

    let runner = PipelineRunner::new(config, &store, &index, &model)
        .with_retry(retry_policy(config, no_retry))
        .with_color(color);

    let stats = match runner.run_all().await {
        Ok(stats) => stats,
        Err(PipelineError::RunInProgress(path)) => {
            println!(
                "{}",
                format_error(&format!("Another run holds {}", path.display()))
            );
            anyhow::bail!("pipeline run already in progress");
        }
        Err(e) => return Err(e).context("Pipeline run failed"),
    };

    println!();
    let total = stats.reports.len();
    for (idx, report) in stats.reports.iter().enumerate() {
        println!("{} {}", format_step(idx + 1, total, ""), format_report(report));
    }

    println!(
        "\n{}",
        format_success(&format!(
            "{} articles indexed in {}s ({:.1}% of raw documents)",
            stats.articles_indexed,
            stats.duration_secs,
            stats.yield_rate()
        ))
    );
    if stats.documents_skipped > 0 {
        println!(
            "{}",
            format_warning(&format!(
                "{} raw documents could not be decoded",
                stats.documents_skipped
            ))
        );
    }

    Ok(())
}

async fn cmd_stage(config: &Config, color: bool, stage: Stage, no_retry: bool) -> Result<()> {
    let store = open_store(config)?;
    let index = open_index(config).await?;
    let model = EmbeddingModel::from_config(&config.embedding)?;

    let runner = PipelineRunner::new(config, &store, &index, &model)
        .with_retry(retry_policy(config, no_retry))
        .with_color(color);

    let start = Instant::now();
    let report = runner
        .run_stage(stage)
        .await
        .with_context(|| format!("Stage {} failed", stage))?;

    println!("{}", format_report(&report));
    info!("Stage {} complete in {:.2}s", stage, start.elapsed().as_secs_f64());

    Ok(())
}

fn cmd_import(config: &Config, dir: &Path) -> Result<()> {
    let store = open_store(config)?;
    let stored = import_directory(&store, &config.storage.raw_bucket, dir)
        .with_context(|| format!("Failed to import {}", dir.display()))?;

    println!(
        "{}",
        format_success(&format!(
            "Imported {} documents into '{}'",
            stored.len(),
            config.storage.raw_bucket
        ))
    );
    Ok(())
}

async fn cmd_fetch(config: &Config, urls: &[String]) -> Result<()> {
    let store = open_store(config)?;
    let fetcher = Fetcher::new(&config.ingest).context("Failed to build http client")?;

    let summary = fetcher
        .fetch_into(&store, &config.storage.raw_bucket, urls)
        .await?;

    for name in &summary.stored {
        println!("{}", format_success(name));
    }
    for url in &summary.failed {
        println!("{}", format_error(&format!("Failed to fetch {}", url)));
    }
    Ok(())
}

async fn cmd_search(
    config: &Config,
    query: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    info!("Searching for: {}", query);

    let client = open_index(config).await?;
    let limit = limit.unwrap_or(client.top_k());
    Validator::validate_limit(limit)?;

    let model = EmbeddingModel::from_config(&config.embedding)?;
    let query_embedding = model
        .embed(query)
        .await
        .context("Failed to embed query")?;

    let results = client
        .vector_search(query_embedding, limit)
        .await
        .context("Vector search failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("\nNo results found for query: \"{}\"\n", query);
        println!("Try:");
        println!("  - Using different search terms");
        println!("  - Checking that the pipeline has been run");
        return Ok(());
    }

    println!("\nSearch Results for: \"{}\"\n", query);
    println!("Found {} result(s)\n", results.len());
    println!("{}", "=".repeat(80));

    for (idx, result) in results.iter().enumerate() {
        print!("\n{}. {}", idx + 1, result.format_summary(300));
        println!("   Id: {}", result.id);
        if let Some(distance) = result.distance {
            println!("   Distance: {:.4}", distance);
        }
    }

    println!("\n{}", "=".repeat(80));
    info!("Search complete");

    Ok(())
}

fn artifact_rows<T: ColumnarRecord>(
    store: &dyn ObjectStore,
    artifact: &ArtifactRef,
) -> Result<Option<usize>> {
    if !store.exists(&artifact.bucket, &artifact.object)? {
        return Ok(None);
    }
    let rows: Vec<T> = news_medallion::storage::read_artifact(store, artifact)?;
    Ok(Some(rows.len()))
}

async fn cmd_stats(config: &Config) -> Result<()> {
    info!("Gathering statistics");

    let store = open_store(config)?;
    let layout = ArtifactLayout::from_config(config);

    let raw = store
        .list(&layout.raw_bucket)?
        .iter()
        .filter(|name| name.ends_with(".html"))
        .count();

    let counts = [
        (layout.bronze.clone(), artifact_rows::<BronzeRecord>(&store, &layout.bronze)?),
        (layout.silver.clone(), artifact_rows::<SilverRecord>(&store, &layout.silver)?),
        (layout.gold.clone(), artifact_rows::<GoldRecord>(&store, &layout.gold)?),
    ];

    println!("{}", format_info(&format!("raw/*.html: {} documents", raw)));
    for (artifact, rows) in counts {
        match rows {
            Some(rows) => println!("{}", format_info(&format!("{}: {} rows", artifact, rows))),
            None => println!("{}", format_warning(&format!("{}: absent", artifact))),
        }
    }

    let client = open_index(config).await?;
    let doc_count = client.get_document_count().await?;
    println!(
        "{}",
        format_info(&format!(
            "index '{}': {} vectors",
            client.collection(),
            doc_count
        ))
    );

    Ok(())
}

async fn cmd_reset(config: &Config, confirm: bool) -> Result<()> {
    if !confirm {
        println!(
            "{}",
            format_error("This will delete the similarity index. Use --confirm to proceed")
        );
        return Ok(());
    }

    warn!("Resetting index - all vectors will be lost");

    let client = open_index(config).await?;
    let dropped = SchemaManager::new(&client)
        .drop_collection()
        .await
        .context("Failed to drop collection")?;

    if dropped {
        println!("{}", format_success("Index collection dropped"));
    } else {
        println!("{}", format_info("Index collection did not exist"));
    }

    Ok(())
}

fn cmd_unlock(config: &Config, force: bool) -> Result<()> {
    if !force {
        println!(
            "{}",
            format_error("Only remove the lock when no run is active. Use --force to proceed")
        );
        return Ok(());
    }

    if RunLock::force_release(&config.storage.root).context("Failed to remove run lock")? {
        println!("{}", format_success("Run lock removed"));
    } else {
        println!("{}", format_info("No run lock present"));
    }

    Ok(())
}
