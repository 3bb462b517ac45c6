use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
    components::{Histogram, Statistics},
    item::MediaType,
};

/// Nodata value, non finite values are rendered as strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoData(pub f64);

impl Serialize for NoData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            value if value.is_nan() => serializer.serialize_str("nan"),
            value if value == f64::INFINITY => serializer.serialize_str("inf"),
            value if value == f64::NEG_INFINITY => serializer.serialize_str("-inf"),
            value => serializer.serialize_f64(value),
        }
    }
}

/// One entry of an asset's `bands` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BandDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "eo:common_name", skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(rename = "eo:center_wavelength", skip_serializing_if = "Option::is_none")]
    pub center_wavelength: Option<f64>,
    #[serde(rename = "eo:full_width_half_max", skip_serializing_if = "Option::is_none")]
    pub full_width_half_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodata: Option<NoData>,
    #[serde(rename = "raster:scale", skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(rename = "raster:offset", skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    #[serde(rename = "raster:sampling", skip_serializing_if = "Option::is_none")]
    pub sampling: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(rename = "raster:histogram", skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
}

impl BandDescriptor {
    /// Band `index`, counted from 1.
    pub fn numbered(index: usize) -> Self {
        Self {
            name: format!("b{index}"),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub href: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub roles: Vec<String>,
    /// Extension fields such as `proj:code`.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bands: Vec<BandDescriptor>,
}

impl Asset {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            media_type: None,
            title: None,
            roles: Vec::new(),
            fields: Map::new(),
            bands: Vec::new(),
        }
    }

    pub fn with_media_type(mut self, media_type: Option<MediaType>) -> Self {
        self.media_type = media_type;
        self
    }

    pub fn with_roles<S: Into<String>>(mut self, roles: impl IntoIterator<Item = S>) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|candidate| candidate == role)
    }
}

/// Assets keyed by name, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assets(Vec<(String, Asset)>);

impl Assets {
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(name, _)| name == key)
    }

    pub fn get(&self, key: &str) -> Option<&Asset> {
        self.0
            .iter()
            .find_map(|(name, asset)| (name == key).then_some(asset))
    }

    /// Insert or replace in place.
    pub fn insert(&mut self, key: impl Into<String>, asset: Asset) {
        let key = key.into();
        match self.0.iter_mut().find(|(name, _)| *name == key) {
            Some((_, existing)) => *existing = asset,
            None => self.0.push((key, asset)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Assets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, asset) in &self.0 {
            map.serialize_entry(name, asset)?;
        }
        map.end()
    }
}
