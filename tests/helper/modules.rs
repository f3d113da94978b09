//! In-memory module collaborators

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use dcrepo::repository::{DisabledModules, InstalledModule, InstalledModules};

pub fn installed(modules: &[(&str, &str)]) -> HashMap<String, InstalledModule> {
    modules
        .iter()
        .map(|(id, version)| {
            (
                id.to_string(),
                InstalledModule {
                    version: version.to_string(),
                    root: PathBuf::from(format!("/var/www/plugins/{id}")),
                    root_writable: true,
                },
            )
        })
        .collect()
}

/// Fixed installed and disabled sets
#[derive(Default)]
pub struct StaticModules {
    pub installed: HashMap<String, InstalledModule>,
    pub disabled: HashSet<String>,
}

impl StaticModules {
    pub fn new(installed: HashMap<String, InstalledModule>) -> Self {
        Self {
            installed,
            disabled: HashSet::new(),
        }
    }

    pub fn disable(mut self, id: &str) -> Self {
        self.disabled.insert(id.to_string());
        self
    }
}

impl InstalledModules for StaticModules {
    fn installed_modules(&self) -> HashMap<String, InstalledModule> {
        self.installed.clone()
    }
}

impl DisabledModules for StaticModules {
    fn disabled_module_ids(&self) -> HashSet<String> {
        self.disabled.clone()
    }
}
