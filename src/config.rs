use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    components::{file::StatisticsOptions, RasterEnv},
    errors::{ConfigurationError, Result},
    extensions::ExtensionFlags,
    item::{Link, MediaTypeChoice},
    properties::{parse_key_values, split_key_value, Temporal, PRIVATE_KEY},
};

/// Raw caller input, as collected from the command line or a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemOptions {
    /// Instant or `start/end` range.
    pub datetime: Option<String>,
    /// Extra schema identifiers to declare.
    pub extensions: Vec<String>,
    pub collection: Option<String>,
    pub collection_url: Option<String>,
    /// `KEY=VALUE` pairs.
    pub properties: Vec<String>,
    /// `KEY=VALUE` pairs nested under `_private`.
    pub private_properties: Vec<String>,
    pub with_private_data: bool,
    pub id: Option<String>,
    pub asset_name: String,
    pub asset_href: Option<String>,
    /// Media type token or `auto`.
    pub asset_mediatype: Option<String>,
    pub asset_roles: Vec<String>,
    pub with_proj: bool,
    pub with_raster: bool,
    pub with_eo: bool,
    pub max_raster_size: usize,
    pub histogram_bins: usize,
    pub densify_geom: usize,
    pub geom_precision: Option<u32>,
    /// `REL=HREF` pairs.
    pub links: Vec<String>,
    pub recursive: bool,
    pub patterns: Vec<String>,
    /// GDAL `NAME=VALUE` configuration options.
    pub gdal_config: Vec<String>,
}

impl Default for ItemOptions {
    fn default() -> Self {
        let statistics = StatisticsOptions::default();
        Self {
            datetime: None,
            extensions: Vec::new(),
            collection: None,
            collection_url: None,
            properties: Vec::new(),
            private_properties: Vec::new(),
            with_private_data: false,
            id: None,
            asset_name: "asset".to_string(),
            asset_href: None,
            asset_mediatype: None,
            asset_roles: Vec::new(),
            with_proj: true,
            with_raster: true,
            with_eo: true,
            max_raster_size: statistics.max_size,
            histogram_bins: statistics.histogram_bins,
            densify_geom: 0,
            geom_precision: None,
            links: Vec::new(),
            recursive: false,
            patterns: Vec::new(),
            gdal_config: Vec::new(),
        }
    }
}

impl ItemOptions {
    /// Validate the raw input.
    ///
    /// Every configuration error surfaces here, before any dataset is opened.
    pub fn resolve(&self) -> Result<ItemConfig> {
        let properties = parse_key_values(&self.properties)?;
        let private = parse_key_values(&self.private_properties)?;
        let private = match (self.with_private_data, properties.get(PRIVATE_KEY)) {
            (false, Some(_)) => Err(ConfigurationError::PrivateDataDisabled {
                key: PRIVATE_KEY.to_string(),
            })?,
            (false, None) => match private.keys().next() {
                Some(key) => Err(ConfigurationError::PrivateDataDisabled { key: key.clone() })?,
                None => None,
            },
            (true, Some(Value::Object(_)) | Some(Value::Null) | None) => Some(private),
            (true, Some(_)) => Err(ConfigurationError::PrivateNotObject)?,
        };

        let temporal = self.datetime.as_deref().map(Temporal::parse).transpose()?;
        let media_type = self
            .asset_mediatype
            .as_deref()
            .map(str::parse::<MediaTypeChoice>)
            .transpose()?
            .unwrap_or_default();
        let links = self
            .links
            .iter()
            .map(|pair| split_key_value(pair).map(|(rel, href)| Link::new(rel, href.trim())))
            .collect::<Result<Vec<_>>>()?;
        let env = self
            .gdal_config
            .iter()
            .map(|pair| {
                split_key_value(pair).map(|(key, value)| (key.to_string(), value.to_string()))
            })
            .collect::<Result<Vec<_>>>()
            .map(RasterEnv::new)?;
        let directory = if self.recursive {
            Some(DirectoryOptions {
                patterns: self
                    .patterns
                    .iter()
                    .map(|pattern| FilePattern::new(pattern))
                    .collect::<Result<Vec<_>>>()?,
            })
        } else {
            None
        };

        Ok(ItemConfig {
            temporal,
            extensions: self
                .extensions
                .iter()
                .filter(|extension| !extension.trim().is_empty())
                .cloned()
                .collect(),
            collection: self.collection.clone().map(|id| CollectionRef {
                id,
                url: self.collection_url.clone(),
            }),
            properties,
            private,
            id: self.id.clone(),
            asset: AssetOptions {
                name: self.asset_name.clone(),
                href: self.asset_href.clone(),
                media_type,
                roles: self.asset_roles.clone(),
            },
            flags: ExtensionFlags {
                proj: self.with_proj,
                raster: self.with_raster,
                eo: self.with_eo,
            },
            statistics: StatisticsOptions {
                enabled: self.with_raster,
                max_size: self.max_raster_size,
                histogram_bins: self.histogram_bins,
            },
            densify: self.densify_geom,
            precision: self.geom_precision,
            links,
            env,
            directory,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    pub id: String,
    pub url: Option<String>,
}

/// Single file asset settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetOptions {
    pub name: String,
    pub href: Option<String>,
    pub media_type: MediaTypeChoice,
    pub roles: Vec<String>,
}

/// Validated configuration driving item assembly.
#[derive(Debug, Clone)]
pub struct ItemConfig {
    pub temporal: Option<Temporal>,
    pub extensions: Vec<String>,
    pub collection: Option<CollectionRef>,
    pub properties: Map<String, Value>,
    /// `Some` only when private data is enabled.
    pub private: Option<Map<String, Value>>,
    pub id: Option<String>,
    pub asset: AssetOptions,
    pub flags: ExtensionFlags,
    pub statistics: StatisticsOptions,
    pub densify: usize,
    pub precision: Option<u32>,
    pub links: Vec<Link>,
    pub env: RasterEnv,
    /// Set in directory mode.
    pub directory: Option<DirectoryOptions>,
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryOptions {
    /// No pattern selects every file.
    pub patterns: Vec<FilePattern>,
}

impl DirectoryOptions {
    /// Whether a file, given relative to the directory, is selected.
    pub fn selects(&self, relative: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|pattern| pattern.matches(relative))
    }
}

/// Shell style file pattern.
///
/// Patterns holding a `/` are matched against the relative path, others
/// against the file name alone.
#[derive(Debug, Clone)]
pub struct FilePattern {
    pattern: String,
    regex: Regex,
    on_path: bool,
}

impl FilePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&glob_to_regex(pattern)).map_err(|source| {
            ConfigurationError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            on_path: pattern.contains('/'),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, relative: &str) -> bool {
        let candidate = if self.on_path {
            relative
        } else {
            Path::new(relative)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(relative)
        };
        self.regex.is_match(candidate)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            '[' => {
                let mut class = String::new();
                if chars.next_if_eq(&'!').is_some() {
                    class.push('^');
                }
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' && !class.is_empty() && class != "^" {
                        closed = true;
                        break;
                    }
                    if inner == '\\' || inner == '[' {
                        class.push('\\');
                    }
                    class.push(inner);
                }
                if closed {
                    regex.push('[');
                    regex.push_str(&class);
                    regex.push(']');
                } else {
                    // Unbalanced bracket, match it literally.
                    regex.push_str(&regex::escape(&format!("[{class}")));
                }
            }
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');
    regex
}
