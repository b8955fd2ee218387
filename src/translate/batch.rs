//! Batch translation orchestrator.
//! Cache hits are served immediately, misses are fanned out over the shared
//! scheduler through the backend fallback chain, and new results are written
//! back before the batch is reassembled in input order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{Language, OriginalTextStore, TranslationBackend, TranslationCache};
use crate::error::StoreError;
use crate::metrics::{metric_names, MetricsRegistry};
use crate::scheduler::Scheduler;

/// Backends tried in priority order for a single text.
pub struct BackendChain {
    backends: Vec<Arc<dyn TranslationBackend>>,
    /// Pause between two backends to go easy on rate-limited services.
    pause: Duration,
    metrics: Arc<MetricsRegistry>,
}

impl BackendChain {
    pub fn new(
        backends: Vec<Arc<dyn TranslationBackend>>,
        pause: Duration,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            backends,
            pause,
            metrics,
        }
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Translate one text. Never fails: if no backend produces a non-empty,
    /// changed result the input comes back unchanged.
    pub async fn translate_one(&self, text: &str, target: Language) -> String {
        if text.trim().is_empty() || target.is_source() {
            return text.to_string();
        }

        for (attempt, backend) in self.backends.iter().enumerate() {
            if attempt > 0 {
                tokio::time::sleep(self.pause).await;
            }

            let span = self.metrics.span(metric_names::BACKEND_CALL);
            let outcome = backend.translate(text, target).await;
            span.finish();

            match outcome {
                Ok(result) if !result.trim().is_empty() && result != text => return result,
                Ok(_) => {
                    debug!(
                        backend = backend.name(),
                        lang = %target,
                        "backend returned no usable translation"
                    );
                }
                Err(e) => {
                    self.metrics.incr(metric_names::BACKEND_FAILURE, 1);
                    warn!(
                        backend = backend.name(),
                        lang = %target,
                        error = %e,
                        "translation backend failed"
                    );
                }
            }
        }

        text.to_string()
    }
}

/// Page translation service: snapshot store + cache + bounded backend fan-out.
pub struct TranslationService {
    cache: Arc<TranslationCache>,
    originals: Arc<OriginalTextStore>,
    chain: Arc<BackendChain>,
    scheduler: Arc<Scheduler>,
    metrics: Arc<MetricsRegistry>,
}

/// Distinct text still needing translation and the positions it fills.
struct Pending {
    text: String,
    positions: Vec<usize>,
}

impl TranslationService {
    pub fn new(
        cache: Arc<TranslationCache>,
        originals: Arc<OriginalTextStore>,
        chain: Arc<BackendChain>,
        scheduler: Arc<Scheduler>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            cache,
            originals,
            chain,
            scheduler,
            metrics,
        }
    }

    pub fn originals(&self) -> &Arc<OriginalTextStore> {
        &self.originals
    }

    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    /// Translate `fragments` of page `page_id` into `target`.
    ///
    /// The output always has the input's length and order. Only a failing
    /// snapshot write is reported as an error; backend failures and timeouts
    /// degrade to the source fragment.
    pub async fn translate_batch(
        &self,
        fragments: &[String],
        target: Language,
        page_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        if target.is_source() {
            return Ok(self.revert(fragments, page_id));
        }

        if !fragments.is_empty() && !self.originals.contains(page_id) {
            self.originals.save(page_id, fragments)?;
        }

        let span = self.metrics.span(metric_names::TRANSLATE_BATCH);
        let mut results: Vec<Option<String>> = Vec::with_capacity(fragments.len());
        let mut pending: Vec<Pending> = Vec::new();
        let mut pending_index: HashMap<&str, usize> = HashMap::new();
        let mut hits = 0u64;

        for (pos, text) in fragments.iter().enumerate() {
            if text.trim().is_empty() {
                results.push(Some(text.clone()));
                continue;
            }
            if let Some(hit) = self.cache.lookup(text, target) {
                hits += 1;
                results.push(Some(hit));
                continue;
            }
            results.push(None);
            match pending_index.get(text.as_str()) {
                Some(&slot) => pending[slot].positions.push(pos),
                None => {
                    pending_index.insert(text.as_str(), pending.len());
                    pending.push(Pending {
                        text: text.clone(),
                        positions: vec![pos],
                    });
                }
            }
        }

        self.metrics.incr(metric_names::CACHE_HIT, hits);
        self.metrics.incr(metric_names::CACHE_MISS, pending.len() as u64);

        if !pending.is_empty() {
            info!(
                page_id,
                lang = %target,
                misses = pending.len(),
                hits,
                "translating cache misses"
            );
            self.fill_misses(pending, target, &mut results).await;
        }

        let out: Vec<String> = results
            .into_iter()
            .zip(fragments)
            .map(|(slot, source)| slot.unwrap_or_else(|| source.clone()))
            .collect();

        let elapsed_ms = span.finish();
        debug!(
            page_id,
            lang = %target,
            items = out.len(),
            elapsed_ms,
            "batch translation completed"
        );
        Ok(out)
    }

    /// Source-language request: hand back the stored originals when they
    /// line up with the request, otherwise the request itself.
    fn revert(&self, fragments: &[String], page_id: &str) -> Vec<String> {
        let originals = self.originals.get(page_id);
        if originals.len() == fragments.len() {
            self.metrics.incr(metric_names::REVERT_FROM_SNAPSHOT, 1);
            originals
        } else {
            if !originals.is_empty() {
                debug!(
                    page_id,
                    stored = originals.len(),
                    requested = fragments.len(),
                    "snapshot length mismatch, returning request fragments"
                );
            }
            fragments.to_vec()
        }
    }

    async fn fill_misses(
        &self,
        pending: Vec<Pending>,
        target: Language,
        results: &mut [Option<String>],
    ) {
        let handles: Vec<_> = pending
            .iter()
            .map(|item| {
                let chain = Arc::clone(&self.chain);
                let text = item.text.clone();
                self.scheduler
                    .submit(async move { chain.translate_one(&text, target).await })
            })
            .collect();

        for (item, handle) in pending.into_iter().zip(handles) {
            let translated = match handle.wait().await {
                Ok(translated) => translated,
                Err(e) => {
                    self.metrics.incr(metric_names::ITEM_FALLBACK, 1);
                    warn!(lang = %target, error = %e, "translation item fell back to source text");
                    item.text.clone()
                }
            };

            self.cache.store(&item.text, target, &translated);

            for pos in item.positions {
                results[pos] = Some(translated.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::sqlite_cache::SqliteCache;
    use crate::translate::testing::{Behaviour, ScriptedBackend};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        service: TranslationService,
        metrics: Arc<MetricsRegistry>,
    }

    fn fixture(backends: Vec<Arc<ScriptedBackend>>, item_timeout: Duration) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let metrics = Arc::new(MetricsRegistry::new());
        let cache = Arc::new(TranslationCache::new(
            Arc::new(SqliteCache::open(&dir.path().join("translations.db")).unwrap()),
            64,
        ));
        let originals =
            Arc::new(OriginalTextStore::open(&dir.path().join("original_texts.json")).unwrap());
        let backends: Vec<Arc<dyn TranslationBackend>> = backends
            .into_iter()
            .map(|b| b as Arc<dyn TranslationBackend>)
            .collect();
        let chain = Arc::new(BackendChain::new(
            backends,
            Duration::from_millis(100),
            Arc::clone(&metrics),
        ));
        let scheduler = Arc::new(Scheduler::new(5, item_timeout));
        let service = TranslationService::new(
            cache,
            originals,
            chain,
            scheduler,
            Arc::clone(&metrics),
        );
        Fixture {
            _dir: dir,
            service,
            metrics,
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn preserves_length_order_and_blanks() {
        let backend = Arc::new(ScriptedBackend::new("prefix", Behaviour::Prefix));
        let fx = fixture(vec![Arc::clone(&backend)], Duration::from_secs(10));

        let input = texts(&["Home", "", "   ", "Gallery", "Contact"]);
        let out = fx.service.translate_batch(&input, Language::Fn, "/").await.unwrap();

        assert_eq!(
            out,
            texts(&["[fn] Home", "", "   ", "[fn] Gallery", "[fn] Contact"])
        );
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn warm_cache_is_idempotent_and_skips_backends() {
        let backend = Arc::new(ScriptedBackend::new("prefix", Behaviour::Prefix));
        let fx = fixture(vec![Arc::clone(&backend)], Duration::from_secs(10));
        let input = texts(&["Book Tickets", "Pricing", ""]);

        let first = fx.service.translate_batch(&input, Language::Hn, "/book").await.unwrap();
        let calls_after_first = backend.calls();
        let second = fx.service.translate_batch(&input, Language::Hn, "/book").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.calls(), calls_after_first);
        assert_eq!(fx.metrics.counter(metric_names::CACHE_HIT), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn source_language_returns_original_snapshot() {
        let backend = Arc::new(ScriptedBackend::new("prefix", Behaviour::Prefix));
        let fx = fixture(vec![Arc::clone(&backend)], Duration::from_secs(10));
        let originals = texts(&["Welcome", "Opening hours"]);

        let translated = fx
            .service
            .translate_batch(&originals, Language::Ka, "/about")
            .await
            .unwrap();
        let calls = backend.calls();

        // the page now shows Kannada text and asks to go back to English
        let reverted = fx
            .service
            .translate_batch(&translated, Language::En, "/about")
            .await
            .unwrap();

        assert_eq!(reverted, originals);
        assert_eq!(backend.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn source_language_with_mismatched_snapshot_echoes_request() {
        let backend = Arc::new(ScriptedBackend::new("prefix", Behaviour::Prefix));
        let fx = fixture(vec![backend], Duration::from_secs(10));

        fx.service
            .translate_batch(&texts(&["One", "Two"]), Language::Fn, "/p")
            .await
            .unwrap();
        let request = texts(&["Un", "Deux", "Trois"]);
        let out = fx.service.translate_batch(&request, Language::En, "/p").await.unwrap();
        assert_eq!(out, request);

        let unknown = fx
            .service
            .translate_batch(&request, Language::En, "/never-seen")
            .await
            .unwrap();
        assert_eq!(unknown, request);
    }

    #[tokio::test(start_paused = true)]
    async fn first_capture_is_kept_across_calls() {
        let backend = Arc::new(ScriptedBackend::new("prefix", Behaviour::Prefix));
        let fx = fixture(vec![backend], Duration::from_secs(10));

        fx.service
            .translate_batch(&texts(&["A", "B"]), Language::Fn, "/x")
            .await
            .unwrap();
        fx.service
            .translate_batch(&texts(&["C", "D", "E"]), Language::Hn, "/x")
            .await
            .unwrap();

        assert_eq!(fx.service.originals().get("/x"), texts(&["A", "B"]));
    }

    #[tokio::test(start_paused = true)]
    async fn falls_through_the_chain_in_order() {
        let failing = Arc::new(ScriptedBackend::new("failing", Behaviour::Fail));
        let echo = Arc::new(ScriptedBackend::new("echo", Behaviour::Echo));
        let good = Arc::new(ScriptedBackend::new("good", Behaviour::Prefix));
        let fx = fixture(
            vec![Arc::clone(&failing), Arc::clone(&echo), Arc::clone(&good)],
            Duration::from_secs(10),
        );

        let out = fx
            .service
            .translate_batch(&texts(&["Museum Info"]), Language::Fn, "/")
            .await
            .unwrap();

        assert_eq!(out, texts(&["[fn] Museum Info"]));
        assert_eq!(failing.calls(), 1);
        assert_eq!(echo.calls(), 1);
        assert_eq!(good.calls(), 1);
        assert_eq!(fx.metrics.counter(metric_names::BACKEND_FAILURE), 1);
    }

    fn chain(backends: Vec<Arc<ScriptedBackend>>, pause: Duration) -> BackendChain {
        let backends: Vec<Arc<dyn TranslationBackend>> = backends
            .into_iter()
            .map(|b| b as Arc<dyn TranslationBackend>)
            .collect();
        BackendChain::new(backends, pause, Arc::new(MetricsRegistry::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_before_each_fallback_backend() {
        let chain = chain(
            vec![
                Arc::new(ScriptedBackend::new("failing", Behaviour::Fail)),
                Arc::new(ScriptedBackend::new("good", Behaviour::Prefix)),
            ],
            Duration::from_millis(100),
        );

        let start = tokio::time::Instant::now();
        let out = chain.translate_one("Hi", Language::Fn).await;
        assert_eq!(out, "[fn] Hi");
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn first_backend_runs_without_pause() {
        let chain = chain(
            vec![Arc::new(ScriptedBackend::new("good", Behaviour::Prefix))],
            Duration::from_millis(100),
        );

        let start = tokio::time::Instant::now();
        assert_eq!(chain.translate_one("Hi", Language::Ka).await, "[ka] Hi");
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn total_failure_returns_source_and_caches_nothing() {
        let failing = Arc::new(ScriptedBackend::new("failing", Behaviour::Fail));
        let fx = fixture(vec![Arc::clone(&failing)], Duration::from_secs(10));
        let input = texts(&["Guided Tour"]);

        let out = fx.service.translate_batch(&input, Language::Ka, "/").await.unwrap();
        assert_eq!(out, input);
        assert_eq!(fx.service.cache().lookup("Guided Tour", Language::Ka), None);

        // nothing cached, so the backend is asked again
        fx.service.translate_batch(&input, Language::Ka, "/").await.unwrap();
        assert_eq!(failing.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_item_times_out_without_blocking_siblings() {
        let mut table = std::collections::HashMap::new();
        table.insert("Fast".to_string(), "Rapide".to_string());
        let fast = Arc::new(ScriptedBackend::new("table", Behaviour::Table(table)));
        let slow = Arc::new(ScriptedBackend::new(
            "slow",
            Behaviour::Slow(Duration::from_secs(60)),
        ));
        // "Fast" is answered by the table; "Slow" misses it and hits the slow backend
        let fx = fixture(vec![fast, slow], Duration::from_secs(10));

        let out = fx
            .service
            .translate_batch(&texts(&["Fast", "Slow"]), Language::Fn, "/")
            .await
            .unwrap();

        assert_eq!(out, texts(&["Rapide", "Slow"]));
        assert_eq!(fx.metrics.counter(metric_names::ITEM_FALLBACK), 1);
        assert_eq!(fx.service.cache().lookup("Slow", Language::Fn), None);
        assert_eq!(
            fx.service.cache().lookup("Fast", Language::Fn).as_deref(),
            Some("Rapide")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_fragments_are_translated_once() {
        let backend = Arc::new(ScriptedBackend::new("prefix", Behaviour::Prefix));
        let fx = fixture(vec![Arc::clone(&backend)], Duration::from_secs(10));

        let out = fx
            .service
            .translate_batch(&texts(&["Main Menu", "Pricing", "Main Menu"]), Language::Hn, "/")
            .await
            .unwrap();

        assert_eq!(out[0], out[2]);
        assert_eq!(out[0], "[hn] Main Menu");
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_batch_is_fine() {
        let backend = Arc::new(ScriptedBackend::new("prefix", Behaviour::Prefix));
        let fx = fixture(vec![Arc::clone(&backend)], Duration::from_secs(10));
        let out = fx.service.translate_batch(&[], Language::Fn, "/empty").await.unwrap();
        assert!(out.is_empty());
        assert_eq!(backend.calls(), 0);
        // an empty request does not claim the page's snapshot
        assert!(!fx.service.originals().contains("/empty"));
    }
}
