mod asset;
mod media_type;

pub use asset::{Asset, Assets, BandDescriptor, NoData};
pub use media_type::{MediaType, MediaTypeChoice};

use serde::Serialize;

use crate::{
    components::{bounds::GeoJsonGeometry, BoundingBox, Footprint},
    errors::Result,
    properties::PropertySet,
};

pub const STAC_VERSION: &str = "1.1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: None,
        }
    }

    /// Link to the parent collection, `href` falls back to the collection id.
    pub fn collection(id: &str, url: Option<&str>) -> Self {
        Self {
            media_type: Some(MediaType::Json.as_str().to_string()),
            ..Self::new("collection", url.unwrap_or(id))
        }
    }
}

/// Catalog record of one observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    #[serde(rename = "type")]
    kind: &'static str,
    stac_version: &'static str,
    pub stac_extensions: Vec<String>,
    pub id: String,
    pub geometry: GeoJsonGeometry,
    pub bbox: BoundingBox,
    pub properties: PropertySet,
    pub links: Vec<Link>,
    pub assets: Assets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, footprint: &Footprint, properties: PropertySet) -> Self {
        Self {
            kind: "Feature",
            stac_version: STAC_VERSION,
            stac_extensions: Vec::new(),
            id: id.into(),
            geometry: footprint.geometry(),
            bbox: footprint.bbox(),
            properties,
            links: Vec::new(),
            assets: Assets::default(),
            collection: None,
        }
    }

    /// Attach the collection together with its mandatory link.
    pub fn set_collection(&mut self, id: &str, url: Option<&str>) {
        self.links.retain(|link| link.rel != "collection");
        self.links.insert(0, Link::collection(id, url));
        self.collection = Some(id.to_string());
    }

    /// Append schema identifiers, skipping those already declared.
    pub fn extend_extensions<S: AsRef<str>>(&mut self, schemas: impl IntoIterator<Item = S>) {
        for schema in schemas {
            let schema = schema.as_ref();
            if !self.stac_extensions.iter().any(|known| known == schema) {
                self.stac_extensions.push(schema.to_string());
            }
        }
    }

    /// Compact JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
