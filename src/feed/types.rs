//! Common types for module feeds

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Insertion-ordered mapping of module id to record
pub type ModuleMap = IndexMap<String, ModuleRecord>;

/// A plugin or theme package advertised by a repository feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    /// Stable identifier, unique per feed (last occurrence wins)
    pub id: String,
    /// Package download URL
    pub file: String,
    pub name: String,
    /// Loose version string, compared with [`crate::version::compare_versions`]
    pub version: String,
    pub author: String,
    #[serde(rename = "desc")]
    pub description: String,
    /// Minimum core version the module declares compatibility with
    pub dc_min: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<String>,
    #[serde(default, rename = "sshot", skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    // Filled by the repository manager, never by the parser
    /// Installed module root, set on updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_writable: Option<bool>,
    /// Locally installed version, set on updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    /// Search score, set on search results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<u32>,
}

impl ModuleRecord {
    /// Display label (the module name)
    pub fn label(&self) -> &str {
        &self.name
    }

    /// Tags joined as a single display string: `"a, b, c"`
    pub fn tags_label(&self) -> String {
        self.tags.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_label_joins_with_comma_and_space() {
        let record = ModuleRecord {
            tags: vec!["blog".to_string(), "theme".to_string(), "dark".to_string()],
            ..Default::default()
        };

        assert_eq!(record.tags_label(), "blog, theme, dark");
    }

    #[test]
    fn tags_label_is_empty_without_tags() {
        assert_eq!(ModuleRecord::default().tags_label(), "");
    }

    #[test]
    fn serialization_omits_transient_fields() {
        let record = ModuleRecord {
            id: "gallery".to_string(),
            description: "Photo gallery".to_string(),
            screenshot: Some("http://example.com/shot.png".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "gallery",
                "file": "",
                "name": "",
                "version": "",
                "author": "",
                "desc": "Photo gallery",
                "dcMin": "",
                "sshot": "http://example.com/shot.png",
                "tags": []
            })
        );
    }
}
