use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use vecseed_core::config::{Config, DistanceSpace, EmbeddingProviderKind};
use vecseed_index::{
    ChromaClient, CollectionSpec, EmbedOptions, EmbeddingFunctionSpec, HnswParams,
};
use vecseed_ingest::{CorpusLoader, IngestionPipeline, RunReport};
use vecseed_llm::AnyEmbedder;
use vecseed_llm::openai::OpenAiEmbedder;

/// Rebuild a ChromaDB collection from a directory of templated JSON sources.
#[derive(Debug, Parser)]
#[command(name = "vecseed", version)]
struct Cli {
    /// TOML config file (default: `$VECSEED_CONFIG` or `config/default.toml`).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the `*.json` document sources.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Target collection name.
    #[arg(long)]
    collection: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; variables may come from the environment.
    let dotenv = dotenvy::dotenv();
    init_subscriber();
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(report) => {
            tracing::info!(
                collection = %report.collection,
                files = report.files_loaded,
                skipped = report.files_skipped,
                rejected = report.records_rejected,
                "Collection count: {}",
                report.count
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<RunReport> {
    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    if let Some(dir) = cli.data_dir {
        config.ingest.data_dir = dir;
    }
    if let Some(name) = cli.collection {
        config.index.collection = name;
    }
    config.validate().context("invalid configuration")?;

    let http = vecseed_llm::http::client_with_timeouts(
        Duration::from_secs(config.timeouts.connect_seconds),
        Duration::from_secs(config.timeouts.request_seconds),
    );
    let embedder = create_embedder(&config, http.clone())?;
    let index = ChromaClient::new(
        &config.index.base_url(),
        config.index.tenant.clone(),
        config.index.database.clone(),
    )
    .context("invalid index address")?
    .with_client(http);

    tracing::info!(
        index = index.base_url(),
        collection = %config.index.collection,
        embedder = embedder_label(&embedder),
        "starting ingestion"
    );

    let pipeline = IngestionPipeline::new(
        &index,
        &embedder,
        collection_spec(&config),
        config.ingest.data_dir.clone(),
    )
    .with_corpus_loader(CorpusLoader::new(config.ingest.max_file_size))
    .with_embed_options(EmbedOptions {
        batch_size: config.embedding.batch_size,
        concurrency: config.embedding.concurrency,
    });

    pipeline.run().await.map_err(|e| {
        let stage = e.stage();
        anyhow::Error::new(e).context(format!("ingestion failed at stage {stage}"))
    })
}

fn resolve_config_path(cli: Option<&std::path::Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("VECSEED_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn create_embedder(config: &Config, client: reqwest::Client) -> anyhow::Result<AnyEmbedder> {
    match config.embedding.provider {
        EmbeddingProviderKind::OpenAi => {
            let Some(key) = config.secrets.openai_api_key.as_ref() else {
                bail!("{} is not set", config.embedding.api_key_env_var);
            };
            let embedder = OpenAiEmbedder::new(
                key.expose().to_owned(),
                config.embedding.base_url.clone(),
                config.embedding.model.clone(),
            )
            .with_client(client);
            Ok(AnyEmbedder::OpenAi(embedder))
        }
        #[cfg(feature = "mock")]
        EmbeddingProviderKind::Mock => Ok(AnyEmbedder::Mock(
            vecseed_llm::mock::MockEmbedder::default(),
        )),
        #[cfg(not(feature = "mock"))]
        EmbeddingProviderKind::Mock => {
            bail!("embedding provider `mock` requires the `mock` feature")
        }
    }
}

fn embedder_label(embedder: &AnyEmbedder) -> String {
    use vecseed_llm::EmbeddingProvider;
    format!("{}/{}", embedder.name(), embedder.model())
}

fn collection_spec(config: &Config) -> CollectionSpec {
    CollectionSpec {
        name: config.index.collection.clone(),
        embedding: EmbeddingFunctionSpec {
            provider: "openai".into(),
            model: config.embedding.model.clone(),
            api_key_env_var: config.embedding.api_key_env_var.clone(),
        },
        hnsw: HnswParams {
            space: match config.index.hnsw.space {
                DistanceSpace::Cosine => vecseed_index::DistanceSpace::Cosine,
                DistanceSpace::L2 => vecseed_index::DistanceSpace::L2,
                DistanceSpace::Ip => vecseed_index::DistanceSpace::Ip,
            },
            ef_construction: config.index.hnsw.ef_construction,
            ef_search: config.index.hnsw.ef_search,
        },
    }
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
