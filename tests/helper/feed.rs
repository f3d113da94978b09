//! Feed document builder

pub const FEED_PATH: &str = "/plugins.xml";

pub fn feed_path() -> &'static str {
    FEED_PATH
}

struct Entry {
    id: String,
    version: String,
    name: String,
    description: String,
    dc_min: Option<String>,
}

/// Builds a repository feed using the extension namespace for fields
#[derive(Default)]
pub struct FeedBuilder {
    entries: Vec<Entry>,
}

impl FeedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(self, id: &str, version: &str) -> Self {
        self.described(id, version, id, "")
    }

    pub fn described(mut self, id: &str, version: &str, name: &str, description: &str) -> Self {
        self.entries.push(Entry {
            id: id.to_string(),
            version: version.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            dc_min: None,
        });
        self
    }

    /// Set the minimum core version of the last added module
    pub fn requires(mut self, dc_min: &str) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.dc_min = Some(dc_min.to_string());
        }
        self
    }

    pub fn build(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="utf-8"?>
<modules xmlns:da="http://dotaddict.org/da/">"#,
        );
        for entry in &self.entries {
            xml.push_str(&format!(
                r#"<module id="{}"><name>{}</name><version>{}</version><desc>{}</desc><file>https://downloads.example.com/{}.zip</file>"#,
                entry.id, entry.name, entry.version, entry.description, entry.id
            ));
            if let Some(dc_min) = &entry.dc_min {
                xml.push_str(&format!("<da:dcmin>{dc_min}</da:dcmin>"));
            }
            xml.push_str("</module>");
        }
        xml.push_str("</modules>");
        xml
    }
}
