//! Application state: the wired pipeline shared by the CLI and the REST API.
//!
//! `AppState` is generic over the database so the router can be exercised
//! against in-memory doubles; the binary pins it to [`SqlxDatabase`].

use std::sync::Arc;

use askdb_core::database::SqlDatabase;
use askdb_core::llm::request::GenerationSettings;
use askdb_core::pipeline::QueryPipeline;
use askdb_core::retrieval::box_store::BoxSchemaStore;
use askdb_core::retrieval::index::SchemaIndex;
use askdb_infra::chunker::SplitterChunker;
use askdb_infra::config::{require_database_url, resolve_api_key};
use askdb_infra::database::SqlxDatabase;
use askdb_infra::embedding::create_embedder;
use askdb_infra::llm::create_provider;
use askdb_infra::vector::lance::LanceSchemaStore;
use askdb_types::config::AppConfig;

/// Shared application state.
pub struct AppState<D = SqlxDatabase> {
    pub pipeline: Arc<QueryPipeline<D>>,
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<D: SqlDatabase> AppState<D> {
    pub fn new(pipeline: QueryPipeline<D>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

impl AppState {
    /// Connect, wire the pipeline and (in retrieval mode) build the schema index.
    pub async fn init(config: &AppConfig, retrieval: bool) -> anyhow::Result<Self> {
        Ok(Self::new(build_pipeline(config, retrieval).await?))
    }
}

/// Wire provider, database and optional schema index from configuration.
///
/// Retrieval is on when either the flag or `[retrieval] enabled` asks for it;
/// the index is built here so the first question does not pay for it.
pub async fn build_pipeline(
    config: &AppConfig,
    retrieval: bool,
) -> anyhow::Result<QueryPipeline<SqlxDatabase>> {
    require_database_url(config)?;
    let api_key = resolve_api_key(config)?;

    let provider = create_provider(&config.llm, api_key.clone())?;
    let database = SqlxDatabase::connect(&config.database).await?;
    let settings = GenerationSettings::new(config.llm.model.clone())
        .with_max_tokens(config.llm.max_tokens)
        .with_temperature(config.llm.temperature);

    tracing::info!(
        provider = provider.name(),
        model = %config.llm.model,
        dialect = database.dialect(),
        "pipeline configured"
    );

    let mut pipeline = QueryPipeline::new(provider, database, settings);

    if retrieval || config.retrieval.enabled {
        let rc = &config.retrieval;
        let embedder = create_embedder(rc, &config.llm, api_key)?;
        tracing::debug!(
            model = embedder.model_name(),
            dimension = embedder.dimension(),
            "embedder ready"
        );
        let store = LanceSchemaStore::open(rc.store_path.as_deref(), embedder.model_name()).await?;
        let chunker = SplitterChunker::from_config(rc)?;
        let index = SchemaIndex::new(
            embedder,
            BoxSchemaStore::new(store),
            Box::new(chunker),
            rc.top_k,
        );
        pipeline = pipeline.with_index(index);

        if let Some(chunks) = pipeline.prepare().await? {
            tracing::info!(chunks, "schema index built");
        }
    }

    Ok(pipeline)
}
