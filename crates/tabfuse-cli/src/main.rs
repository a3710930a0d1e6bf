//! tabfuse CLI: submit merge tasks and query merged results.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;

use tabfuse_core::config::{ConfigOverlay, ServiceConfig};
use tabfuse_core::id::TaskId;
use tabfuse_core::task::TaskStatus;
use tabfuse_core::types::Table;
use tabfuse_exec::{parse_query, parse_task_request, ReadBackQuery, TaskRequest, TaskService};
use tabfuse_io::{FsCatalog, SourceCatalog};

#[derive(Parser)]
#[command(name = "tabfuse")]
#[command(about = "Filter and outer-join tabular sources into one merged dataset", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Settings {
    /// YAML file with service settings (overrides environment)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory that source names resolve against
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory for persisted merged records (in-memory when unset)
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    /// Categorical match threshold, 0-100
    #[arg(long, global = true)]
    fuzzy_threshold: Option<u8>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a task request (JSON or YAML) and wait for it to finish
    Run {
        /// Path to the task request file
        #[arg(short, long)]
        task: PathBuf,

        /// Print the merged rows when the task completes
        #[arg(long)]
        show: bool,
    },

    /// Check a task request file without running it
    Validate {
        #[arg(short, long)]
        task: PathBuf,
    },

    /// List loadable sources with their column types
    Sources,

    /// List the columns available in persisted results
    Fields,

    /// Pivot persisted results back into a table
    Query {
        /// Read-back query file (JSON or YAML)
        #[arg(short, long, conflicts_with = "fields")]
        query: Option<PathBuf>,

        /// Comma-separated columns to read back
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Restrict to one task
        #[arg(long)]
        task_id: Option<u64>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_config(&cli.settings).and_then(|config| match cli.command {
        Commands::Run { task, show } => run_task(&config, &task, show),
        Commands::Validate { task } => validate_task(&config, &task),
        Commands::Sources => list_sources(&config),
        Commands::Fields => list_fields(&config),
        Commands::Query {
            query,
            fields,
            task_id,
        } => run_query(&config, query.as_deref(), fields, task_id),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Defaults, then environment, then the config file, then flags.
fn load_config(settings: &Settings) -> CliResult<ServiceConfig> {
    let mut config = ServiceConfig::from_env();
    if let Some(path) = &settings.config {
        let overlay: ConfigOverlay = serde_yaml::from_str(&fs::read_to_string(path)?)?;
        config.apply(&overlay);
    }
    apply_flags(&mut config, settings);
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

fn apply_flags(config: &mut ServiceConfig, settings: &Settings) {
    config.apply(&ConfigOverlay {
        data_dir: settings.data_dir.clone(),
        results_dir: settings.results_dir.clone(),
        fuzzy_threshold: settings.fuzzy_threshold,
        ..Default::default()
    });
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn run_task(config: &ServiceConfig, path: &Path, show: bool) -> CliResult<()> {
    let request = parse_task_request(&fs::read_to_string(path)?)?;
    runtime()?.block_on(submit_and_wait(config, request, show))
}

async fn submit_and_wait(config: &ServiceConfig, request: TaskRequest, show: bool) -> CliResult<()> {
    let service = TaskService::from_config(config)?;
    let mut events = service.subscribe();
    let id = service.submit(request)?;
    println!("Task {} submitted", id);

    loop {
        match events.recv().await {
            Ok(ev) if ev.task_id == id => {
                println!("  {}", ev.status);
                if ev.status.is_terminal() {
                    break;
                }
            }
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => break,
        }
    }
    service.shutdown().await?;

    let task = service
        .task(id)?
        .ok_or_else(|| format!("task {} disappeared", id))?;
    if task.status != TaskStatus::Completed {
        return Err(format!(
            "task {} ended {}: {}",
            id,
            task.status,
            task.failure_reason.unwrap_or_default()
        )
        .into());
    }

    println!("✓ Task {} completed", id);
    if show {
        let fields = service.fields()?.into_iter().map(|c| c.name).collect();
        let table = service.read_back(&ReadBackQuery {
            fields,
            task_id: Some(id),
            ..Default::default()
        })?;
        print_table(&table);
    }
    Ok(())
}

fn validate_task(config: &ServiceConfig, path: &Path) -> CliResult<()> {
    let request = parse_task_request(&fs::read_to_string(path)?)?;
    request.validate()?;
    let catalog = FsCatalog::new(config.data_dir.clone(), config.type_sample_rows);
    for spec in &request.data_sources {
        if !catalog.exists(&spec.source) {
            println!("  warning: source '{}' not found; it would be skipped", spec.source);
        }
    }
    println!("✓ Task request is valid");
    Ok(())
}

fn list_sources(config: &ServiceConfig) -> CliResult<()> {
    let catalog = FsCatalog::new(config.data_dir.clone(), config.type_sample_rows);
    for source in catalog.list_sources()? {
        println!("{}", source.name);
        for field in source.columns {
            println!("  {} ({})", field.name, field.kind);
        }
    }
    Ok(())
}

fn list_fields(config: &ServiceConfig) -> CliResult<()> {
    let store = tabfuse_io::open_store(config)?;
    for col in store.columns()? {
        let kind = if col.is_categorical { "categorical" } else { "numeric" };
        println!("{} ({})", col.name, kind);
    }
    Ok(())
}

fn run_query(
    config: &ServiceConfig,
    query_path: Option<&Path>,
    fields: Vec<String>,
    task_id: Option<u64>,
) -> CliResult<()> {
    let mut query = match query_path {
        Some(path) => parse_query(&fs::read_to_string(path)?)?,
        None => ReadBackQuery::new(fields),
    };
    if let Some(id) = task_id {
        query.task_id = Some(TaskId::new(id));
    }
    if query.fields.is_empty() {
        return Err("no fields requested; pass --fields or --query".into());
    }
    let store = tabfuse_io::open_store(config)?;
    let table = tabfuse_exec::query_results(store.as_ref(), &query, config.fuzzy_threshold)?;
    print_table(&table);
    Ok(())
}

/// Tab-separated, header first; nulls print as empty cells.
fn print_table(table: &Table) {
    println!("{}", table.column_names().join("\t"));
    for row in table.rows() {
        let cells: Vec<String> = row
            .iter()
            .map(|v| v.canonical().unwrap_or_default())
            .collect();
        println!("{}", cells.join("\t"));
    }
}
