//! Fundmatch batch entrypoint.

use std::sync::Arc;

use anyhow::Context;
use mimalloc::MiMalloc;

use fundmatch::config::Config;
use fundmatch::constants::RANKING_SIZE;
use fundmatch::eligibility::{EligibilityFilter, GenaiReasoner};
use fundmatch::embedding::{EncoderConfig, QueryEncoder, Reranker, RerankerConfig};
use fundmatch::expansion::ExpansionController;
use fundmatch::location::{DiskLocationCache, GooglePlacesGeocoder, LocationResolver};
use fundmatch::pipeline::{BatchRunner, InMemoryCompanyDirectory, MatchingPipeline, load_incentives};
use fundmatch::results::JsonResultStore;
use fundmatch::retrieval::CandidateRetriever;
use fundmatch::scoring::{CompanyScorer, SemanticReranker};
use fundmatch::vectordb::QdrantClient;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let incentives_file = config
        .incentives_file
        .clone()
        .context("FUNDMATCH_INCENTIVES_FILE must be set")?;
    let companies_file = config
        .companies_file
        .clone()
        .context("FUNDMATCH_COMPANIES_FILE must be set")?;

    tracing::info!(
        storage = %config.storage_path.display(),
        qdrant = %config.qdrant_url,
        collection = %config.collection,
        model = %config.llm_model,
        "Fundmatch starting"
    );

    let incentives = load_incentives(&incentives_file)?;
    let directory = InMemoryCompanyDirectory::from_json_file(&companies_file)?;
    tracing::info!(
        incentives = incentives.len(),
        companies = directory.len(),
        "Loaded inputs"
    );

    let encoder_config = match &config.encoder_path {
        Some(path) => EncoderConfig::new(path.clone()),
        None => {
            tracing::warn!("No FUNDMATCH_ENCODER_PATH configured, running encoder in stub mode");
            EncoderConfig::stub()
        }
    };
    let encoder = Arc::new(QueryEncoder::load(encoder_config)?);

    let index = Arc::new(QdrantClient::new(&config.qdrant_url).await?);
    index.health_check().await?;
    if !index.collection_exists(&config.collection).await? {
        anyhow::bail!("Qdrant collection '{}' does not exist", config.collection);
    }
    let retriever = CandidateRetriever::new(encoder, index, config.collection.clone());

    let cache = Arc::new(DiskLocationCache::open(
        config.locations_dir(),
        config.location_cache_capacity,
    )?);
    let geocoder = Arc::new(GooglePlacesGeocoder::new(
        config.geocoder_url.clone(),
        config.require_geocoder_api_key()?,
        config.provider_timeout,
    ));
    let resolver = Arc::new(LocationResolver::new(
        cache,
        geocoder,
        config.country.clone(),
        config.provider_timeout,
        config.geocode_concurrency,
    ));

    let filter = EligibilityFilter::new(
        Arc::new(GenaiReasoner::new(config.llm_model.clone())),
        config.country.clone(),
        config.provider_timeout,
    );

    let reranker_config = match &config.reranker_path {
        Some(path) => RerankerConfig::new(path.clone()),
        None => {
            tracing::warn!("No FUNDMATCH_RERANKER_PATH configured, running reranker in stub mode");
            RerankerConfig::stub()
        }
    };
    let reranker = SemanticReranker::new(Arc::new(Reranker::load(reranker_config)?));

    let pipeline = Arc::new(MatchingPipeline::new(
        retriever,
        resolver.clone(),
        filter,
        ExpansionController::new(config.expansion)?,
        reranker,
        CompanyScorer::new(RANKING_SIZE),
        Arc::new(directory),
        Arc::new(JsonResultStore::new(config.results_dir())),
    ));

    let summary = BatchRunner::new(pipeline, config.incentive_concurrency)
        .run(&incentives)
        .await;

    let stats = resolver.stats();
    println!(
        "processed={} done={} exhausted={} failed={} geocoding_calls={} cache_hits={}",
        summary.processed(),
        summary.done,
        summary.exhausted,
        summary.failed.len(),
        stats.provider_calls,
        stats.cache_hits,
    );

    if summary.has_failures() {
        for (incentive_id, reason) in &summary.failed {
            eprintln!("incentive {}: {}", incentive_id, reason);
        }
        std::process::exit(1);
    }

    Ok(())
}
