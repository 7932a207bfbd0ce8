use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::info;

use skillora_ingest::config::IngestConfig;
use skillora_ingest::logging;
use skillora_ingest::progress::{ConsoleProgress, Progress};
use skillora_ingest::runner::{TaskStatus, TaskTracker};
use skillora_ingest::storage::{SqliteStorage, Storage};
use skillora_ingest::tasks::{process_file, ProcessFileParams};

#[derive(Parser)]
#[command(name = "skillora_ingest")]
#[command(about = "Skillora tabular job-data ingestion pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one uploaded file into the job store
    Process {
        /// File name inside the configured upload directory
        #[arg(long)]
        file_id: String,
        /// Column mapping entries, canonical=Source (repeatable)
        #[arg(long = "map")]
        map: Vec<String>,
        /// Override the configured chunk size
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Override the configured SQLite database path
        #[arg(long)]
        db: Option<String>,
        /// Run through the task tracker instead of inline
        #[arg(long)]
        tracked: bool,
    },
}

fn parse_column_map(entries: &[String]) -> anyhow::Result<Option<HashMap<String, String>>> {
    if entries.is_empty() {
        return Ok(None);
    }
    let mut map = HashMap::new();
    for entry in entries {
        let (canonical, source) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("malformed --map entry '{entry}', expected canonical=Source"))?;
        map.insert(canonical.trim().to_string(), source.trim().to_string());
    }
    Ok(Some(map))
}

async fn run_tracked(
    storage: Arc<dyn Storage>,
    config: IngestConfig,
    params: ProcessFileParams,
) -> anyhow::Result<skillora_ingest::tasks::ProcessFileResult> {
    let tracker = TaskTracker::new(storage, config);
    let task_id = tracker.spawn(params).await;
    println!("   task id: {task_id}");

    loop {
        tokio::time::sleep(Duration::from_millis(200)).await;
        match tracker.status(task_id).await {
            Some(TaskStatus::Running(Progress::Batch {
                processed,
                total,
                percent,
            })) => {
                println!("   {processed}/{total} rows ({percent}%)");
            }
            Some(TaskStatus::Running(Progress::Stage { stage })) => {
                println!("   stage: {stage}");
            }
            Some(TaskStatus::Completed(result)) => return Ok(result),
            Some(TaskStatus::Failed(e)) => anyhow::bail!("ingestion task failed: {e}"),
            Some(TaskStatus::Pending) | None => {}
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            file_id,
            map,
            chunk_size,
            db,
            tracked,
        } => {
            let mut config = IngestConfig::load()?;
            if let Some(size) = chunk_size {
                config.chunk_size = size.max(1);
            }
            if let Some(db) = db {
                config.database_path = db;
            }

            let column_map = parse_column_map(&map)?;
            let params = ProcessFileParams { file_id, column_map };

            info!("opening job store at {}", config.database_path);
            let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open(&config.database_path)?);

            println!("🚀 Processing upload {}...", params.file_id);
            let result = if tracked {
                run_tracked(storage, config, params).await?
            } else {
                process_file(storage, &config, params, &ConsoleProgress).await
            };

            println!("📊 Result:");
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
