//! MuseumHub: booking-site backend serving page translation and the
//! scripted help chatbot.
//! Main library: context wiring, tracing setup, HTTP server lifecycle.

pub mod api;
pub mod chatbot;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pricing;
pub mod scheduler;
pub mod translate;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use api::SessionProbe;
use chatbot::Chatbot;
use config::AppConfig;
use metrics::MetricsRegistry;
use scheduler::Scheduler;
use translate::batch::BackendChain;
use translate::deepseek::DeepSeekClient;
use translate::libre::LibreTranslateClient;
use translate::sqlite_cache::SqliteCache;
use translate::{OriginalTextStore, TranslationBackend, TranslationCache, TranslationService};

/// Shared application state handed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub translator: Arc<TranslationService>,
    pub chatbot: Arc<Chatbot>,
    pub metrics: Arc<MetricsRegistry>,
    pub session: Arc<dyn SessionProbe>,
}

/// Initialize tracing. `RUST_LOG` wins over the built-in filter.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("museumhub=debug,tower_http=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Open both stores, build the backend chain and the dialogue engine.
pub fn build_context(config: &AppConfig) -> anyhow::Result<AppContext> {
    let metrics = Arc::new(MetricsRegistry::new());

    let persistent = SqliteCache::open(&config.cache_db_path)
        .with_context(|| format!("opening cache {}", config.cache_db_path.display()))?;
    let cache = Arc::new(TranslationCache::new(
        Arc::new(persistent),
        config.memory_cache_capacity,
    ));
    let originals = OriginalTextStore::open(&config.originals_path)
        .with_context(|| format!("opening snapshots {}", config.originals_path.display()))?;

    let mut backends: Vec<Arc<dyn TranslationBackend>> =
        vec![Arc::new(LibreTranslateClient::new(&config.libre)?)];
    match config.deepseek_api_key.clone() {
        Some(key) => match DeepSeekClient::new(key) {
            Ok(client) => {
                info!("DeepSeek API client initialized");
                backends.push(Arc::new(client));
            }
            Err(e) => warn!(error = %e, "DeepSeek client init failed, backend disabled"),
        },
        None => info!("no DeepSeek API key, LibreTranslate only"),
    }

    let chain = Arc::new(BackendChain::new(
        backends,
        config.backend_pause(),
        Arc::clone(&metrics),
    ));
    info!(backends = ?chain.backend_names(), "translation chain ready");

    let scheduler = Arc::new(Scheduler::new(config.worker_count, config.item_timeout()));
    let translator = Arc::new(TranslationService::new(
        cache,
        Arc::new(originals),
        chain,
        scheduler,
        Arc::clone(&metrics),
    ));
    let chatbot = Arc::new(Chatbot::new().context("compiling chatbot rules")?);

    Ok(AppContext {
        translator,
        chatbot,
        metrics,
        session: api::anonymous_sessions(),
    })
}

/// Serve until Ctrl-C, then drain in-flight requests.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let ctx = build_context(&config)?;
    let app = api::router(ctx);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "museumhub listening");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let token = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("shutdown requested");
                    token.cancel();
                }
                Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
            }
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server failed")?;

    info!("museumhub stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn context_builds_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            cache_db_path: dir.path().join("translations.db"),
            originals_path: dir.path().join("original_texts.json"),
            deepseek_api_key: Some("sk-test".into()),
            ..AppConfig::default()
        };

        let ctx = build_context(&config).unwrap();
        assert!(dir.path().join("original_texts.json").exists());
        assert!(!ctx.chatbot.rule_names().is_empty());
        assert!(ctx.translator.cache().persistent().is_empty());
    }
}
