//! Server application state.
//!
//! All process-scoped resources live behind one `Arc`: the capability set
//! handlers receive instead of ambient globals.

use crate::object_store::{ObjectStore, S3Store};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Semaphore;
use zar_analytics::GeoReader;
use zar_cache::{CacheClient, RateLimiter};
use zar_core::config::AppConfig;
use zar_core::constants::{MAX_REQUESTS, WINDOW_SECS};
use zar_core::{Clock, SystemClock};
use zar_db::connect_and_migrate;
use zar_monitor::SystemMonitor;
use zar_security::{CookiePolicy, TokenService};

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    db: PgPool,
    cache: CacheClient,
    rate_limiter: RateLimiter,
    tokens: TokenService,
    cookies: CookiePolicy,
    clock: Arc<dyn Clock>,
    geo: GeoReader,
    http: reqwest::Client,
    object_store: Option<Arc<dyn ObjectStore>>,
    monitor: Arc<SystemMonitor>,
    /// Bounds concurrent fire-and-forget response-cache writes.
    cache_write_permits: Arc<Semaphore>,
}

impl AppState {
    /// Open every shared resource: database pool (with migrations), cache
    /// pool, token service, GeoIP reader and the optional object store.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = connect_and_migrate(&config.database).await?;

        let cache = CacheClient::connect(&config.redis)?;
        match cache.ping().await {
            Ok(()) => tracing::info!("cache reachable"),
            Err(err) => tracing::warn!(error = %err, "cache unreachable at startup"),
        }

        let tokens = TokenService::new(&config.security)?;
        let cookies = CookiePolicy::new(config.server.is_production());
        let geo = GeoReader::open(config.geoip.db_path.as_deref().map(std::path::Path::new));

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.safe_browsing.timeout_secs,
            ))
            .build()?;

        let object_store: Option<Arc<dyn ObjectStore>> = if config.object_store.is_configured() {
            Some(Arc::new(S3Store::from_config(&config.object_store).await?))
        } else {
            None
        };

        let rate_limiter = RateLimiter::new(cache.clone(), MAX_REQUESTS, WINDOW_SECS);
        let cache_write_permits = Arc::new(Semaphore::new(config.cache.max_concurrent_ops));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                cache,
                rate_limiter,
                tokens,
                cookies,
                clock: Arc::new(SystemClock),
                geo,
                http,
                object_store,
                monitor: Arc::new(SystemMonitor::new()),
                cache_write_permits,
            }),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub fn cache(&self) -> &CacheClient {
        &self.inner.cache
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.rate_limiter
    }

    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    pub fn cookies(&self) -> CookiePolicy {
        self.inner.cookies
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    pub fn geo(&self) -> &GeoReader {
        &self.inner.geo
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub fn object_store(&self) -> Option<&Arc<dyn ObjectStore>> {
        self.inner.object_store.as_ref()
    }

    pub fn monitor(&self) -> &Arc<SystemMonitor> {
        &self.inner.monitor
    }

    pub fn cache_write_permits(&self) -> &Arc<Semaphore> {
        &self.inner.cache_write_permits
    }
}
