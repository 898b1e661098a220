use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use graphmind_core::config::{AppConfig, RetryConfig};
use graphmind_core::traits::CompletionClient;
use graphmind_gateway::GatewayServer;
use graphmind_graph::GraphOrchestrator;
use graphmind_ingest::{DocumentLoader, RecursiveCharacterSplitter};
use graphmind_store::{FsBlobStore, HttpEmbeddingProvider, SqliteTaskStore, SqliteVectorIndex};
use graphmind_workflow::{
    BackgroundExecutor, FlowManager, StageSet, TaskManager, TaskSweeper, WorkflowEngine,
};

#[derive(Parser)]
#[command(name = "graphmind", version, about = "Retrieval-augmented knowledge graph pipeline")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "graphmind.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve,
    /// Run a query through the full pipeline
    Query {
        /// The question to answer
        #[arg(trailing_var_arg = true)]
        query: Vec<String>,
        /// Document to ingest before answering
        #[arg(short, long)]
        file: Option<String>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ingest a document into the index
    Ingest {
        /// Path or key of the document
        file: String,
    },
    /// Inspect and manage background tasks
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },
    /// Show current configuration
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum TasksAction {
    /// List all live tasks
    List,
    /// Show a single task
    Show {
        /// Task id
        id: String,
    },
    /// Remove stale finished tasks
    Cleanup {
        /// Only remove tasks older than this many hours
        #[arg(long, default_value = "24")]
        older_than_hours: i64,
    },
}

/// The wired-up pipeline components.
struct Runtime {
    flow: Arc<FlowManager>,
    tasks: Arc<TaskManager>,
    executor: Arc<BackgroundExecutor>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("graphmind=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // Handle completions before config loading
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "graphmind", &mut std::io::stdout());
        return Ok(());
    }

    // Load config
    let config = if cli.config.exists() {
        AppConfig::load(&cli.config)?
    } else {
        let home_config = dirs_home().map(|h| h.join(".graphmind").join("config.toml"));
        if let Some(path) = home_config.filter(|p| p.exists()) {
            info!(path = %path.display(), "Loading config from home directory");
            AppConfig::load(&path)?
        } else {
            eprintln!("Warning: No config file found. Set GEMINI_API_KEY or create graphmind.toml");
            create_env_config()?
        }
    };

    if let Commands::Config = cli.command {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let runtime = build_runtime(&config)?;

    match cli.command {
        Commands::Serve => {
            let gateway_config = config.gateway.clone().unwrap_or_default();
            info!(bind = %gateway_config.bind, "Starting gateway");
            let server = GatewayServer::new(
                gateway_config,
                runtime.flow,
                runtime.tasks.clone(),
                runtime.executor,
            );
            let cancel = tokio_util::sync::CancellationToken::new();
            let cancel_clone = cancel.clone();

            // Graceful shutdown on Ctrl-C
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutting down gateway...");
                cancel_clone.cancel();
            });

            let sweeper = TaskSweeper::new(
                runtime.tasks,
                Duration::from_secs(config.tasks.sweep_interval_secs),
                config.tasks.cleanup_after_hours,
            );
            tokio::spawn(sweeper.run(cancel.clone()));

            server.run(cancel).await?;
        }
        Commands::Query { query, file, json } => {
            let text = query.join(" ");
            if text.trim().is_empty() {
                anyhow::bail!("Query cannot be empty");
            }
            let outcome = runtime.flow.process_query(&text, file.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                if let Some(summary) = &outcome.summary {
                    println!("{}", summary);
                }
                if let Some(graph) = &outcome.knowledge_graph {
                    println!(
                        "\n[graph: {} entities, {} relationships, density {}]",
                        graph.metrics.num_nodes, graph.metrics.num_edges, graph.metrics.density
                    );
                }
            }
        }
        Commands::Ingest { file } => {
            let outcome = runtime.flow.process_document(&file).await?;
            println!(
                "Ingested {} document(s) into {} chunk(s)",
                outcome.documents_processed, outcome.chunks_created
            );
        }
        Commands::Tasks { action } => match action {
            TasksAction::List => {
                let tasks = runtime.tasks.list_all().await?;
                if tasks.is_empty() {
                    println!("No live tasks.");
                } else {
                    for task in &tasks {
                        println!(
                            "{}  {}  {:>5.1}%  {}",
                            task.task_id,
                            task.status,
                            task.progress,
                            task.message.as_deref().unwrap_or("")
                        );
                    }
                }
            }
            TasksAction::Show { id } => match runtime.tasks.get(&id).await? {
                Some(task) => println!("{}", serde_json::to_string_pretty(&task)?),
                None => {
                    eprintln!("Task not found (may have expired): {}", id);
                }
            },
            TasksAction::Cleanup { older_than_hours } => {
                let removed = runtime.tasks.cleanup(older_than_hours).await?;
                println!("Removed {} task(s)", removed);
            }
        },
        Commands::Config | Commands::Completions { .. } => {
            unreachable!("handled before runtime setup")
        }
    }

    Ok(())
}

fn build_runtime(config: &AppConfig) -> anyhow::Result<Runtime> {
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir).ok();

    let embedder = Arc::new(HttpEmbeddingProvider::from_config(&config.embedding));
    let index = Arc::new(SqliteVectorIndex::open(
        &data_dir.join("index.db"),
        embedder,
    )?);
    let task_store = Arc::new(SqliteTaskStore::open(&data_dir.join("tasks.db"))?);
    let blob = Arc::new(FsBlobStore::new(data_dir.join("files")));

    // Build LLM client with retry and fallback chain
    let primary = graphmind_llm::create_client(&config.model);
    let llm: Arc<dyn CompletionClient> =
        if !config.fallback_models.is_empty() || config.model.retry.is_some() {
            let retry_config = config.model.retry.clone().unwrap_or_else(RetryConfig::default);
            let fallbacks: Vec<_> = config
                .fallback_models
                .iter()
                .map(|mc| (mc.clone(), graphmind_llm::create_client(mc)))
                .collect();
            Arc::new(graphmind_llm::RetryingClient::new(
                primary,
                fallbacks,
                retry_config,
            ))
        } else {
            Arc::from(primary)
        };

    let stages = StageSet::new(
        DocumentLoader::new(blob, config.ingest.max_file_size),
        RecursiveCharacterSplitter::new(config.ingest.chunk_size, config.ingest.chunk_overlap),
        index,
        llm.clone(),
        config.model.clone(),
        GraphOrchestrator::new(llm, config.model.clone(), config.graph.max_text_length),
        config.graph.top_k,
    );

    let flow = Arc::new(FlowManager::new(WorkflowEngine::new(stages)));
    let tasks = Arc::new(TaskManager::new(task_store, config.tasks.ttl_secs));
    let executor = Arc::new(BackgroundExecutor::new(flow.clone(), tasks.clone()));

    if config.model.api_key.is_none() && config.model.provider != "ollama" {
        error!(provider = %config.model.provider, "No API key configured for the model provider");
    }

    Ok(Runtime {
        flow,
        tasks,
        executor,
    })
}

fn create_env_config() -> anyhow::Result<AppConfig> {
    let gemini_key = std::env::var("GEMINI_API_KEY").ok();
    let openai_key = std::env::var("OPENAI_API_KEY").ok();

    let (provider, model_id, key, base_url) = if let Some(key) = gemini_key {
        ("gemini".to_string(), "gemini-2.0-flash".to_string(), Some(key), None)
    } else if let Some(key) = openai_key {
        ("openai".to_string(), "gpt-4o-mini".to_string(), Some(key), None)
    } else {
        // Default to Ollama (local)
        (
            "ollama".to_string(),
            "llama3.2".to_string(),
            None,
            Some("http://localhost:11434/v1".to_string()),
        )
    };

    let mut config: AppConfig = toml::from_str(&format!(
        "[model]\nprovider = \"{}\"\nmodel_id = \"{}\"",
        provider, model_id
    ))
    .map_err(|e| anyhow::anyhow!("failed to build env config: {}", e))?;
    config.model.api_key = key;
    config.model.base_url = base_url;
    Ok(config)
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
