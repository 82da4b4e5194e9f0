use anyhow::{Context, Result};
use ragsearch::cli::output::Output;
use ragsearch::cli::{Cli, Commands};
use ragsearch::rag::loader::DirectoryLoader;
use ragsearch::rag::persist::StoreFiles;
use ragsearch::rag::store::Startup;
use ragsearch::utils::toml_config::{LoggingConfig, RagSearchConfig};
use ragsearch::{SearchConfig, SearchService, VectorStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &output).await {
        output.error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    dotenvy::dotenv().ok();

    let config = RagSearchConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_tracing(&config.logging, cli.verbose);

    match cli.command {
        Commands::Build { data } => run_build(&config, output, data).await,
        Commands::Query { text, k, json } => run_query(&config, output, &text, k, json).await,
        Commands::Ask { question, k } => run_ask(&config, output, &question, k).await,
        Commands::Status => run_status(&config, output).await,
        Commands::Config { validate } => run_config(&config, output, &cli.config, validate),
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn open_store(config: &RagSearchConfig) -> Result<Arc<VectorStore>> {
    let embedder = config.create_embedder()?;
    let store = VectorStore::new(config.store_config(), embedder, config.embed_timeout())?;
    Ok(Arc::new(store))
}

async fn run_build(config: &RagSearchConfig, output: &Output, data: Option<PathBuf>) -> Result<()> {
    let data_dir = data.unwrap_or_else(|| config.data_dir.clone());

    output.step(1, 3, &format!("Loading documents from {}", data_dir.display()));
    let documents = DirectoryLoader::new(&data_dir)
        .with_extensions(config.store.extensions.iter().cloned())
        .load()?;
    if documents.is_empty() {
        output.warning("No documents found");
        output.hint("Supported extensions are set by store.extensions in the config file");
        return Ok(());
    }

    output.step(2, 3, &format!("Loading embedding model {}", config.embedding.model));
    let store = open_store(config)?;

    output.step(3, 3, &format!("Embedding {} document(s)", documents.len()));
    let info = store.build(&documents).await?;

    output.success(&format!(
        "Indexed {} chunks into {}",
        store.len(),
        config.store.persist_dir.display()
    ));
    output.build_info(&info, store.len());
    Ok(())
}

async fn run_query(
    config: &RagSearchConfig,
    output: &Output,
    text: &str,
    k: Option<usize>,
    json: bool,
) -> Result<()> {
    let store = open_store(config)?;
    store.load().await?;

    let hits = store.query(text, k.unwrap_or(config.retrieval.top_k)).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    output.header(&format!("{} result(s) for \"{}\"", hits.len(), text));
    for (rank, hit) in hits.iter().enumerate() {
        output.hit(rank + 1, hit);
    }
    Ok(())
}

async fn run_ask(
    config: &RagSearchConfig,
    output: &Output,
    question: &str,
    k: Option<usize>,
) -> Result<()> {
    let provider = config.llm_provider()?;
    let llm = provider.create_client().await?;

    let store = open_store(config)?;
    let data_dir = config.data_dir.clone();
    let extensions = config.store.extensions.clone();
    let startup = store
        .load_or_build(|| DirectoryLoader::new(data_dir).with_extensions(extensions).load())
        .await?;
    match startup {
        Startup::Loaded => output.info(&format!("Loaded {} indexed chunk(s)", store.len())),
        Startup::Built => output.info(&format!("Built store with {} chunk(s)", store.len())),
    }

    let mut search_config: SearchConfig = config.search_config();
    if let Some(k) = k {
        search_config.top_k = k;
    }
    let service = SearchService::new(store, llm, search_config);

    let answer = service.answer_with_sources(question).await?;
    output.answer(&answer.text);
    output.header("Sources");
    for (rank, hit) in answer.sources.iter().enumerate() {
        output.hit(rank + 1, hit);
    }
    Ok(())
}

async fn run_status(config: &RagSearchConfig, output: &Output) -> Result<()> {
    let files = StoreFiles::new(config.store.persist_dir.clone());
    output.header("Vector store");
    output.kv("Directory", &files.dir().display().to_string());

    if !files.exists() {
        output.warning("No persisted store");
        output.hint("Build one with:");
        output.command("rag-search build");
        return Ok(());
    }

    let snapshot = files.load().await?;
    output.build_info(&snapshot.info, snapshot.index.len());
    let configured = config.embedding_model_id();
    if snapshot.info.embedding_model != configured {
        output.warning(&format!(
            "Configured model '{}' differs; queries will fail until the store is rebuilt",
            configured
        ));
    }
    Ok(())
}

fn run_config(
    config: &RagSearchConfig,
    output: &Output,
    path: &std::path::Path,
    validate: bool,
) -> Result<()> {
    output.header("Configuration");
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    output.kv("File", &source);
    output.kv("Data directory", &config.data_dir.display().to_string());
    output.kv("Persist directory", &config.store.persist_dir.display().to_string());
    output.kv(
        "Chunking",
        &format!(
            "{} chars, {} overlap",
            config.store.chunk_size, config.store.chunk_overlap
        ),
    );
    output.kv("Embedding model", &config.embedding.model);
    output.kv("Top k", &config.retrieval.top_k.to_string());

    if validate {
        config.validate()?;
        output.success("Configuration is valid");
    }
    Ok(())
}
