use anyhow::Result;
use axum::Router;
use clap::Parser;
use douggle_core::config::DEFAULT_NAMESPACE;
use douggle_core::{IdentityNormalizer, Language, Normalizer, StemmingNormalizer};
use server::{build_app, load_engine};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Folder of .txt documents
    #[arg(long, default_value = "./data")]
    data: String,
    /// Index cache directory
    #[arg(long, default_value = "./cache")]
    cache: String,
    /// Cache namespace
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,
    /// Stopword list and stemmer: indonesian or english
    #[arg(long, default_value = "indonesian")]
    language: Language,
    /// Treat documents as already normalized
    #[arg(long, default_value_t = false)]
    identity: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let normalizer: Arc<dyn Normalizer> = if args.identity {
        Arc::new(IdentityNormalizer)
    } else {
        Arc::new(StemmingNormalizer::for_language(args.language))
    };
    let engine = load_engine(&args.data, &args.cache, &args.namespace, normalizer)?;
    tracing::info!(num_docs = engine.num_docs(), cached = engine.was_cached(), "index ready");
    let app: Router = build_app(Arc::new(engine));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
