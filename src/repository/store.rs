//! Repository manager: snapshot of installable modules and install driver

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::DEFAULT_DOWNLOAD_TIMEOUT_SECS;
use crate::feed::ModuleMap;
use crate::repository::error::{DownloadError, InstallError, StoreError};
use crate::repository::http::HttpRequest;
use crate::repository::modules::{
    DisabledModules, InstallOutcome, InstalledModule, InstalledModules, ModuleInstaller,
};
use crate::repository::reader::FeedReader;
use crate::repository::search;
use crate::version::{CompareMode, CompareOp, versions_compare};

/// Modules offered by the repository relative to the local install set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySnapshot {
    /// In the feed, not installed
    pub new: ModuleMap,
    /// Installed, with a newer version in the feed
    pub update: ModuleMap,
}

impl RepositorySnapshot {
    /// Split feed modules against the local install set.
    ///
    /// Modules are ordered by case-insensitive id and disabled ids are
    /// dropped before splitting.
    pub fn compute(
        mut feed: ModuleMap,
        installed: &HashMap<String, InstalledModule>,
        disabled: &HashSet<String>,
    ) -> Self {
        feed.sort_by(|a, _, b, _| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });
        feed.retain(|id, _| !disabled.contains(id));

        let mut snapshot = Self::default();
        for (id, mut module) in feed {
            match installed.get(&id) {
                None => {
                    snapshot.new.insert(id, module);
                }
                Some(local) => {
                    if versions_compare(
                        &module.version,
                        &local.version,
                        CompareOp::Gt,
                        CompareMode::Strict,
                    ) {
                        module.root = Some(local.root.clone());
                        module.root_writable = Some(local.root_writable);
                        module.current_version = Some(local.version.clone());
                        snapshot.update.insert(id, module);
                    }
                }
            }
        }

        snapshot
    }
}

pub struct RepositoryManager {
    feed_url: Option<String>,
    reader: FeedReader,
    installed: Arc<dyn InstalledModules>,
    disabled: Arc<dyn DisabledModules>,
    installer: Option<Arc<dyn ModuleInstaller>>,
    download_timeout: Duration,
    snapshot: RepositorySnapshot,
}

impl RepositoryManager {
    pub fn new(
        feed_url: Option<String>,
        reader: FeedReader,
        installed: Arc<dyn InstalledModules>,
        disabled: Arc<dyn DisabledModules>,
    ) -> Self {
        Self {
            feed_url: feed_url.filter(|url| !url.is_empty()),
            reader,
            installed,
            disabled,
            installer: None,
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            snapshot: RepositorySnapshot::default(),
        }
    }

    pub fn with_installer(mut self, installer: Arc<dyn ModuleInstaller>) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn user_agent(&self) -> &str {
        self.reader.user_agent()
    }

    /// Refresh the snapshot from the feed.
    ///
    /// Returns false without touching the current snapshot when no feed is
    /// configured or the feed cannot be read.
    pub async fn check(&mut self, force: bool) -> bool {
        let Some(url) = self.feed_url.as_deref() else {
            debug!("No repository feed configured");
            return false;
        };

        let modules = match self.reader.fetch(url, force).await {
            Ok(modules) => modules,
            Err(e) => {
                warn!("Failed to read repository feed {}: {}", url, e);
                return false;
            }
        };

        let snapshot = RepositorySnapshot::compute(
            modules,
            &self.installed.installed_modules(),
            &self.disabled.disabled_module_ids(),
        );
        info!(
            "Repository offers {} new modules and {} updates",
            snapshot.new.len(),
            snapshot.update.len()
        );
        self.snapshot = snapshot;
        true
    }

    /// Updatable modules when `updates` is set, otherwise new ones
    pub fn get(&self, updates: bool) -> &ModuleMap {
        if updates {
            &self.snapshot.update
        } else {
            &self.snapshot.new
        }
    }

    /// Search new modules, best match first
    pub fn search(&self, query: &str) -> ModuleMap {
        search::search(&self.snapshot.new, query)
    }

    /// Download the package at `url` and install it
    pub async fn process(&self, url: &str, dest: &Path) -> Result<InstallOutcome, StoreError> {
        self.download(url, dest).await?;
        self.install(dest)
    }

    /// Download the package at `url` to `dest`.
    ///
    /// URLs without an `http://` or `https://` scheme are fetched over HTTP.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<(), StoreError> {
        let url = with_default_scheme(url);
        let wrap = |source: DownloadError| StoreError::Download {
            url: url.clone(),
            source,
        };

        info!("Downloading {} to {:?}", url, dest);
        let request = HttpRequest::new(
            url.clone(),
            self.reader.user_agent(),
            self.download_timeout,
        );
        let response = self
            .reader
            .client()
            .get(&request)
            .await
            .map_err(|e| wrap(e.into()))?;

        if response.status != 200 {
            return Err(wrap(DownloadError::HttpStatus(response.status)));
        }

        tokio::fs::write(dest, &response.body)
            .await
            .map_err(|e| wrap(e.into()))?;
        Ok(())
    }

    /// Install a downloaded package
    pub fn install(&self, package: &Path) -> Result<InstallOutcome, StoreError> {
        let installer = self.installer.as_ref().ok_or(InstallError::Unavailable)?;
        let outcome = installer.install_package(package)?;
        info!("Installed {:?}: {:?}", package, outcome);
        Ok(outcome)
    }
}

fn with_default_scheme(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}
