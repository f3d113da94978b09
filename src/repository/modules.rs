//! Local module collaborators
//!
//! The repository manager never reaches into the application directly; it
//! is handed these providers at construction.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::repository::error::InstallError;

/// A module installed on the local system
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledModule {
    pub version: String,
    pub root: PathBuf,
    #[serde(default)]
    pub root_writable: bool,
}

/// Result of installing a package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The module was not present before
    Installed,
    /// An existing module was replaced
    Updated,
}

/// Provides the set of locally installed modules
#[cfg_attr(test, automock)]
pub trait InstalledModules: Send + Sync {
    fn installed_modules(&self) -> HashMap<String, InstalledModule>;
}

/// Provides the ids of modules the site has disabled
#[cfg_attr(test, automock)]
pub trait DisabledModules: Send + Sync {
    fn disabled_module_ids(&self) -> HashSet<String>;
}

/// Installs a downloaded package into its target module set
#[cfg_attr(test, automock)]
pub trait ModuleInstaller: Send + Sync {
    fn install_package(&self, package: &Path) -> Result<InstallOutcome, InstallError>;
}

/// Module lists read from a JSON file:
///
/// ```json
/// {
///   "modules": { "gallery": { "version": "1.0", "root": "/srv/plugins/gallery", "rootWritable": true } },
///   "disabled": ["legacy"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JsonModuleList {
    modules: HashMap<String, InstalledModule>,
    disabled: HashSet<String>,
}

impl JsonModuleList {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl InstalledModules for JsonModuleList {
    fn installed_modules(&self) -> HashMap<String, InstalledModule> {
        self.modules.clone()
    }
}

impl DisabledModules for JsonModuleList {
    fn disabled_module_ids(&self) -> HashSet<String> {
        self.disabled.clone()
    }
}
