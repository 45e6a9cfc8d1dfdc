//! YAML frontmatter extraction and validation.
//!
//! A document may open with a `---` delimited YAML block carrying page
//! metadata (`title`, `description`, `template`, `date`, `type`, `category`,
//! `tipping`, ...). The block is stripped before Markdown parsing; the rest
//! of the pipeline consumes the metadata as an opaque string-keyed map with
//! typed accessors. Values are held as JSON values in document order.

use std::path::Path;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};

static FRONTMATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^---\s*\n(.*?)\n---\s*\n?(.*)$").expect("valid regex"));

/// Parsed frontmatter metadata.
#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    map: IndexMap<String, Value>,
}

impl Frontmatter {
    pub fn empty() -> Self {
        Frontmatter::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.map.get(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.get_str("description")
    }

    pub fn template(&self) -> Option<&str> {
        self.get_str("template")
    }

    pub fn page_type(&self) -> Option<&str> {
        self.get_str("type")
    }

    pub fn category(&self) -> Option<&str> {
        self.get_str("category")
    }

    pub fn author(&self) -> Option<&str> {
        self.get_str("author")
    }

    pub fn url(&self) -> Option<&str> {
        self.get_str("url")
    }

    /// The raw `date` value as written.
    pub fn date_str(&self) -> Option<String> {
        match self.map.get("date") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The `date` value parsed for sorting: `YYYY-MM-DD`, optionally with a
    /// trailing `HH:MM[:SS]` time.
    pub fn date(&self) -> Option<NaiveDateTime> {
        let raw = self.date_str()?;
        parse_date(&raw)
    }

    /// The index page's ordered category list.
    pub fn categories(&self) -> Vec<String> {
        match self.map.get("categories") {
            Some(Value::Array(seq)) => seq
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Payment channels from the `tipping` mapping, in document order.
    pub fn tipping(&self) -> Vec<(String, String)> {
        match self.map.get("tipping") {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        _ => return None,
                    };
                    Some((key.clone(), value))
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Split frontmatter from Markdown text.
///
/// Returns the metadata and the content with the block stripped; a document
/// without frontmatter comes back untouched with empty metadata. Invalid
/// YAML is a hard error — it must abort the page, not degrade.
pub fn extract(md_text: &str) -> Result<(Frontmatter, String)> {
    let Some(caps) = FRONTMATTER_RE.captures(md_text) else {
        return Ok((Frontmatter::empty(), md_text.to_string()));
    };

    let yaml = &caps[1];
    let content = caps[2].to_string();

    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| Error::Frontmatter(e.to_string()))?;
    let map = match value {
        serde_yaml::Value::Null => IndexMap::new(),
        value @ serde_yaml::Value::Mapping(_) => {
            serde_yaml::from_value(value).map_err(|e| Error::Frontmatter(e.to_string()))?
        }
        other => {
            return Err(Error::Frontmatter(format!(
                "expected a mapping, got: {other:?}"
            )));
        }
    };

    Ok((Frontmatter { map }, content))
}

/// Validate frontmatter fields. Returns human-readable problems; an empty
/// list means valid.
pub fn validate(frontmatter: &Frontmatter, file_path: &Path) -> Vec<String> {
    let mut errors = Vec::new();
    let path = file_path.display();

    let is_blog_type = matches!(frontmatter.page_type(), Some("blog") | Some("blog-post"));
    if is_blog_type {
        if !frontmatter.contains("date") {
            errors.push(format!("{path}: Blog posts require 'date' field"));
        } else if frontmatter.date().is_none() {
            errors.push(format!(
                "{path}: 'date' must be in ISO format (YYYY-MM-DD), got: {}",
                frontmatter.date_str().unwrap_or_default()
            ));
        }
        if !frontmatter.contains("title") {
            errors.push(format!("{path}: Blog posts require 'title' field"));
        }
    }

    if let Some(page_type) = frontmatter.page_type()
        && !matches!(page_type, "blog" | "blog-post" | "page")
    {
        errors.push(format!(
            "{path}: 'type' must be one of [\"blog\", \"blog-post\", \"page\"], got: {page_type}"
        ));
    }

    if frontmatter.contains("category") && frontmatter.category().is_none() {
        errors.push(format!("{path}: 'category' must be a string"));
    }

    errors
}
