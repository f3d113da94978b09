//! Cache-aware feed reader
//!
//! Composes an [`HttpClient`], an optional [`FeedCache`] and a
//! [`FeedParser`]:
//!
//! ```text
//! fetch(url)
//!   ├─ no cache ──────────────▶ GET ─▶ 200 ─▶ parse
//!   └─ cache
//!       ├─ fresh entry ───────▶ cached mapping (no request)
//!       └─ stale / missing ───▶ GET (If-Modified-Since)
//!            ├─ 200 ──────────▶ parse ─▶ store entry
//!            ├─ 304 ──────────▶ touch ─▶ cached mapping
//!            └─ unreachable ──▶ touch ─▶ cached mapping (stale)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::config::{ConfigError, ReaderConfig};
use crate::feed::{FeedParser, ModuleMap};
use crate::repository::cache::FeedCache;
use crate::repository::error::ReaderError;
use crate::repository::http::{HttpClient, HttpRequest, HttpResponse};

const STATUS_OK: u16 = 200;
const STATUS_NOT_MODIFIED: u16 = 304;

pub struct FeedReader {
    client: Arc<dyn HttpClient>,
    parser: FeedParser,
    cache: Option<FeedCache>,
    user_agent: String,
    timeout: Duration,
    cache_ttl: Duration,
    touch_on_fail: bool,
    force_refresh: bool,
}

/// Cached entry usable when the origin cannot provide a fresh feed
struct Fallback {
    path: PathBuf,
    modules: ModuleMap,
}

impl FeedReader {
    pub fn new(
        config: &ReaderConfig,
        parser: FeedParser,
        client: Arc<dyn HttpClient>,
    ) -> Result<Self, ConfigError> {
        let cache = config.cache_dir.as_deref().and_then(FeedCache::open);

        Ok(Self {
            client,
            parser,
            cache,
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            cache_ttl: config.cache_ttl()?,
            touch_on_fail: config.touch_on_fail,
            force_refresh: config.force_refresh,
        })
    }

    pub fn client(&self) -> &Arc<dyn HttpClient> {
        &self.client
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Fetch the feed at `url` and return its compatible modules.
    ///
    /// `force` (or the `force_refresh` setting) skips any cached entry, both
    /// as a fresh result and as a fallback.
    pub async fn fetch(&self, url: &str, force: bool) -> Result<ModuleMap, ReaderError> {
        match &self.cache {
            None => self.fetch_direct(url).await,
            Some(cache) => {
                self.fetch_with_cache(cache, url, force || self.force_refresh)
                    .await
            }
        }
    }

    fn request(&self, url: &str) -> HttpRequest {
        HttpRequest::new(url, self.user_agent.clone(), self.timeout)
    }

    async fn fetch_direct(&self, url: &str) -> Result<ModuleMap, ReaderError> {
        info!("Fetching module feed {}", url);
        let response = self.client.get(&self.request(url)).await?;

        if response.status != STATUS_OK {
            warn!("Feed {} returned status {}", url, response.status);
            return Err(ReaderError::HttpStatus(response.status));
        }

        Ok(self.parser.parse(&response.body)?)
    }

    async fn fetch_with_cache(
        &self,
        cache: &FeedCache,
        url: &str,
        force: bool,
    ) -> Result<ModuleMap, ReaderError> {
        let path = cache.entry_path(url);
        let mut request = self.request(url);
        let mut fallback = None;

        let modified = if force { None } else { cache.modified(&path) };
        if let Some(modified) = modified {
            match cache.load(&path) {
                Ok(modules) => {
                    if self.is_fresh(modified) {
                        debug!("Using fresh cache entry for {}", url);
                        return Ok(modules);
                    }
                    request.if_modified_since = Some(modified);
                    fallback = Some(Fallback {
                        path: path.clone(),
                        modules,
                    });
                }
                Err(e) => warn!("Ignoring unreadable cache entry {:?}: {}", path, e),
            }
        }

        info!("Fetching module feed {}", url);
        let response = match self.client.get(&request).await {
            Ok(response) => response,
            Err(e) => {
                let Some(fallback) = fallback else {
                    return Err(e.into());
                };
                warn!("Feed {} unreachable, using cached copy: {}", url, e);
                if self.touch_on_fail {
                    self.touch(cache, &fallback);
                }
                return Ok(fallback.modules);
            }
        };

        match response {
            HttpResponse {
                status: STATUS_NOT_MODIFIED,
                ..
            } => match fallback {
                Some(fallback) => {
                    debug!("Feed {} not modified", url);
                    self.touch(cache, &fallback);
                    Ok(fallback.modules)
                }
                None => Err(ReaderError::HttpStatus(STATUS_NOT_MODIFIED)),
            },
            HttpResponse {
                status: STATUS_OK,
                body,
            } => {
                let modules = self.parser.parse(&body)?;
                if let Err(e) = cache.store(&path, &modules) {
                    warn!("Failed to cache feed {} at {:?}: {}", url, path, e);
                }
                Ok(modules)
            }
            HttpResponse { status, .. } => {
                warn!("Feed {} returned status {}", url, status);
                Err(ReaderError::HttpStatus(status))
            }
        }
    }

    fn is_fresh(&self, modified: SystemTime) -> bool {
        // An mtime in the future counts as age zero
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age < self.cache_ttl
    }

    fn touch(&self, cache: &FeedCache, fallback: &Fallback) {
        if let Err(e) = cache.touch(&fallback.path) {
            warn!("Failed to touch cache entry {:?}: {}", fallback.path, e);
        }
    }
}
