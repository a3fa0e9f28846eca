use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SieveError};
use crate::index::AttrKind;

/// Top-level configuration for one index
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SieveConfig {
    pub source: SourceSchema,
    pub index: IndexSettings,
    pub tokenizer: TokenizerConfig,
    pub search: SearchSettings,
}

impl SieveConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SieveError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SieveError::Config(e.to_string()))
    }
}

/// Columns pulled from the row source, in catalogue order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSchema {
    pub attr_uint: Vec<String>,
    pub attr_float: Vec<String>,
    pub attr_multi: Vec<String>,
    pub attr_string: Vec<String>,
    /// Free-text fields; the position of a name is its field id
    pub text_fields: Vec<String>,
}

impl SourceSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uint(mut self, name: impl Into<String>) -> Self {
        self.attr_uint.push(name.into());
        self
    }

    pub fn with_float(mut self, name: impl Into<String>) -> Self {
        self.attr_float.push(name.into());
        self
    }

    pub fn with_multi(mut self, name: impl Into<String>) -> Self {
        self.attr_multi.push(name.into());
        self
    }

    pub fn with_string(mut self, name: impl Into<String>) -> Self {
        self.attr_string.push(name.into());
        self
    }

    pub fn with_text_field(mut self, name: impl Into<String>) -> Self {
        self.text_fields.push(name.into());
        self
    }

    /// Configured attribute names for one column kind
    pub fn attributes(&self, kind: AttrKind) -> &[String] {
        match kind {
            AttrKind::Uint => &self.attr_uint,
            AttrKind::Float => &self.attr_float,
            AttrKind::Multi => &self.attr_multi,
            AttrKind::String => &self.attr_string,
        }
    }

    /// Every configured column name, attributes first, then text fields
    pub fn all_columns(&self) -> impl Iterator<Item = &String> {
        self.attr_uint
            .iter()
            .chain(&self.attr_float)
            .chain(&self.attr_multi)
            .chain(&self.attr_string)
            .chain(&self.text_fields)
    }
}

/// Where index files live and how they are named
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub name: String,
    pub index_path: PathBuf,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            name: "sieve".to_string(),
            index_path: PathBuf::from("./data"),
        }
    }
}

impl IndexSettings {
    pub fn new(name: impl Into<String>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            index_path: index_path.into(),
        }
    }

    fn file(&self, extension: &str) -> PathBuf {
        let name = if self.name.is_empty() { "sieve" } else { &self.name };
        self.index_path.join(format!("{}.{}", name, extension))
    }

    /// Inverted index file
    pub fn index_file(&self) -> PathBuf {
        self.file("lci")
    }

    /// Attribute file for one column kind
    pub fn attr_file(&self, kind: AttrKind) -> PathBuf {
        self.file(kind.file_extension())
    }
}

/// Tokenizer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: true,
            stem: true,
            min_token_length: 2,
            max_token_length: 50,
        }
    }
}

/// Query-time defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub default_format: String,
    /// Write terms ordered by fingerprint so index files are reproducible
    pub sort_terms_on_write: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 4000,
            default_format: "xml".to_string(),
            sort_terms_on_write: true,
        }
    }
}
