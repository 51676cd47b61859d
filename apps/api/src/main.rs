mod config;
mod errors;
mod llm_client;
mod models;
mod rasterize;
mod review;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackend};
use crate::llm_client::LlmClient;
use crate::rasterize::pdfium::PdfiumRasterizer;
use crate::review::pipeline::ReviewPipeline;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryRecordStore, RecordStore, RedisRecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Review API v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn RecordStore> = match &config.store {
        StoreBackend::Redis { url } => Arc::new(RedisRecordStore::open(url)?),
        StoreBackend::Memory => {
            info!("In-memory record store initialized (reviews are lost on restart)");
            Arc::new(MemoryRecordStore::new())
        }
    };

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // PDFium is bound on the first upload, not here.
    let rasterizer = PdfiumRasterizer::new(config.pdfium_library_path.clone());

    let pipeline = ReviewPipeline::new(Arc::new(rasterizer), Arc::new(llm), store.clone());

    let state = AppState {
        pipeline: Arc::new(pipeline),
        store,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
