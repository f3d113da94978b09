//! Module feed parser
//!
//! A feed is an XML document whose root element holds repeated
//! `<module id="...">` entries. Shared fields live in the default namespace,
//! repository-specific fields in [`EXTENSION_NAMESPACE`]:
//!
//! ```xml
//! <modules xmlns:da="http://dotaddict.org/da/">
//!   <module id="gallery">
//!     <name>Gallery</name>
//!     <version>1.2</version>
//!     <author>Jane</author>
//!     <desc>Photo galleries</desc>
//!     <file>https://example.com/plugin-gallery-1.2.zip</file>
//!     <da:dcmin>2.19</da:dcmin>
//!     <da:tags><da:tag>media</da:tag><da:tag>photo</da:tag></da:tags>
//!   </module>
//! </modules>
//! ```

use std::collections::HashMap;

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use tracing::debug;

use crate::feed::error::ParseError;
use crate::feed::types::{ModuleMap, ModuleRecord};
use crate::version::{CompareMode, CompareOp, versions_compare};

/// Namespace URI of the repository extension fields
pub const EXTENSION_NAMESPACE: &str = "http://dotaddict.org/da/";

/// Parses module feeds, keeping only modules compatible with the running core
#[derive(Debug, Clone)]
pub struct FeedParser {
    core_version: String,
    dev_mode: bool,
}

impl FeedParser {
    /// Creates a parser for the given core version.
    ///
    /// With `dev_mode` set, every module is kept regardless of its minimum
    /// core version.
    pub fn new(core_version: impl Into<String>, dev_mode: bool) -> Self {
        Self {
            core_version: core_version.into(),
            dev_mode,
        }
    }

    /// Parse a raw feed payload into a mapping of module id to record.
    ///
    /// Modules are kept in feed order; a repeated id replaces the earlier
    /// record. Version-incompatible modules are dropped here.
    pub fn parse(&self, raw: &[u8]) -> Result<ModuleMap, ParseError> {
        let text = std::str::from_utf8(raw)?;

        let mut reader = NsReader::from_str(text);
        let mut walker = FeedWalker::default();
        let mut modules = ModuleMap::new();

        loop {
            let finished = match reader.read_resolved_event() {
                Ok((ns, Event::Start(e))) => {
                    let extended = is_extension(&ns);
                    walker.open(&e, extended)?;
                    None
                }
                Ok((ns, Event::Empty(e))) => {
                    let extended = is_extension(&ns);
                    walker.open(&e, extended)?;
                    walker.close()
                }
                Ok((_, Event::End(_))) => walker.close(),
                Ok((_, Event::Text(t))) => {
                    let text = t.unescape().map_err(invalid_feed)?;
                    walker.text(&text)?;
                    None
                }
                Ok((_, Event::CData(c))) => {
                    walker.text(&String::from_utf8_lossy(&c.into_inner()))?;
                    None
                }
                Ok((_, Event::Eof)) => break,
                Ok(_) => None,
                Err(e) => return Err(invalid_feed(e)),
            };

            if let Some(record) = finished {
                if self.is_compatible(&record) {
                    modules.insert(record.id.clone(), record);
                } else {
                    debug!(
                        "Skipping module {}: requires core {}, running {}",
                        record.id, record.dc_min, self.core_version
                    );
                }
            }
        }

        if !walker.saw_root {
            return Err(ParseError::InvalidFeed(
                "document has no root element".to_string(),
            ));
        }
        if walker.depth != 0 {
            return Err(ParseError::InvalidFeed(
                "unexpected end of document".to_string(),
            ));
        }

        Ok(modules)
    }

    fn is_compatible(&self, record: &ModuleRecord) -> bool {
        self.dev_mode
            || versions_compare(
                &self.core_version,
                &record.dc_min,
                CompareOp::Ge,
                CompareMode::Loose,
            )
    }
}

fn is_extension(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == EXTENSION_NAMESPACE.as_bytes())
}

fn invalid_feed(e: impl std::fmt::Display) -> ParseError {
    ParseError::InvalidFeed(e.to_string())
}

/// Text-bearing children of a module element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    File,
    Name,
    Version,
    Author,
    Desc,
    DcMin,
    Details,
    Section,
    Support,
    Screenshot,
    Tag,
}

impl Field {
    fn resolve(local: &[u8], extended: bool) -> Option<Self> {
        match (extended, local) {
            (false, b"file") => Some(Field::File),
            (false, b"name") => Some(Field::Name),
            (false, b"version") => Some(Field::Version),
            (false, b"author") => Some(Field::Author),
            (false, b"desc") => Some(Field::Desc),
            (true, b"dcmin") => Some(Field::DcMin),
            (true, b"details") => Some(Field::Details),
            (true, b"section") => Some(Field::Section),
            (true, b"support") => Some(Field::Support),
            (true, b"sshot") => Some(Field::Screenshot),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct ModuleBuilder {
    id: String,
    fields: HashMap<Field, String>,
    tags: Vec<String>,
}

impl ModuleBuilder {
    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Tag => self.tags.push(value),
            // First occurrence wins
            _ => {
                self.fields.entry(field).or_insert(value);
            }
        }
    }

    fn take(&mut self, field: Field) -> String {
        self.fields.remove(&field).unwrap_or_default()
    }

    fn take_optional(&mut self, field: Field) -> Option<String> {
        Some(self.take(field)).filter(|value| !value.is_empty())
    }

    fn build(mut self) -> ModuleRecord {
        ModuleRecord {
            file: self.take(Field::File),
            name: self.take(Field::Name),
            version: self.take(Field::Version),
            author: self.take(Field::Author),
            description: self.take(Field::Desc),
            dc_min: self.take(Field::DcMin),
            details: self.take_optional(Field::Details),
            section: self.take_optional(Field::Section),
            support: self.take_optional(Field::Support),
            screenshot: self.take_optional(Field::Screenshot),
            tags: self.tags,
            id: self.id,
            ..Default::default()
        }
    }
}

/// Tracks the element nesting while streaming the feed.
///
/// Depth 1 is the root, 2 a module, 3 a module field (or the tag list),
/// 4 a single tag.
#[derive(Debug, Default)]
struct FeedWalker {
    depth: usize,
    saw_root: bool,
    module: Option<ModuleBuilder>,
    in_tags: bool,
    field: Option<(Field, usize)>,
    text: String,
}

impl FeedWalker {
    fn open(&mut self, e: &BytesStart<'_>, extended: bool) -> Result<(), ParseError> {
        if self.depth == 0 && self.saw_root {
            return Err(ParseError::InvalidFeed(
                "content after the root element".to_string(),
            ));
        }
        // Attribute iteration rejects duplicates and malformed values
        for attr in e.attributes() {
            attr.map_err(invalid_feed)?;
        }

        self.depth += 1;
        let local = e.local_name();
        let local = local.as_ref();

        match self.depth {
            1 => self.saw_root = true,
            2 if !extended && local == b"module" => {
                let id = match e.try_get_attribute("id").map_err(invalid_feed)? {
                    Some(attr) => attr.unescape_value().map_err(invalid_feed)?.into_owned(),
                    None => String::new(),
                };
                self.module = Some(ModuleBuilder {
                    id,
                    ..Default::default()
                });
            }
            3 if self.module.is_some() => {
                if extended && local == b"tags" {
                    self.in_tags = true;
                } else if let Some(field) = Field::resolve(local, extended) {
                    self.start_field(field);
                }
            }
            4 if self.in_tags && extended && local == b"tag" => self.start_field(Field::Tag),
            _ => {}
        }

        Ok(())
    }

    fn start_field(&mut self, field: Field) {
        self.field = Some((field, self.depth));
        self.text.clear();
    }

    /// Handle an end tag; returns a record when a module element closes
    fn close(&mut self) -> Option<ModuleRecord> {
        let mut finished = None;

        match self.field {
            Some((field, depth)) if depth == self.depth => {
                self.field = None;
                let value = self.text.trim().to_string();
                if let Some(module) = self.module.as_mut() {
                    module.set(field, value);
                }
            }
            _ => {
                if self.depth == 3 {
                    self.in_tags = false;
                } else if self.depth == 2 {
                    finished = self.module.take().map(ModuleBuilder::build);
                }
            }
        }

        self.depth = self.depth.saturating_sub(1);
        finished
    }

    fn text(&mut self, text: &str) -> Result<(), ParseError> {
        if self.depth == 0 && !text.trim().is_empty() {
            return Err(ParseError::InvalidFeed(
                "text outside the root element".to_string(),
            ));
        }
        if matches!(self.field, Some((_, depth)) if depth == self.depth) {
            self.text.push_str(text);
        }
        Ok(())
    }
}
