//! Projection, raster and eo extension payloads.
//!
//! Every extension is a descriptor with a schema URL and a build function.
//! Descriptors are folded in table order, so the key and array order of the
//! output only depends on the dataset.

mod eo;
mod projection;
mod raster;

pub use eo::{common_name, EO_COMMON_NAMES};

use log::debug;
use serde_json::{Map, Value};

use crate::{components::DatasetFacts, errors::Result, item::BandDescriptor};

pub const PROJECTION_SCHEMA: &str = "https://stac-extensions.github.io/projection/v2.0.0/schema.json";
pub const RASTER_SCHEMA: &str = "https://stac-extensions.github.io/raster/v2.0.0/schema.json";
pub const EO_SCHEMA: &str = "https://stac-extensions.github.io/eo/v2.0.0/schema.json";

/// Which extensions the caller allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExtensionFlags {
    pub proj: bool,
    pub raster: bool,
    pub eo: bool,
}

impl Default for ExtensionFlags {
    fn default() -> Self {
        Self {
            proj: true,
            raster: true,
            eo: true,
        }
    }
}

/// Everything the enabled extensions derived from one dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionOutput {
    /// Item level properties.
    pub properties: Map<String, Value>,
    /// Fields for the asset of the dataset.
    pub asset_fields: Map<String, Value>,
    pub bands: Vec<BandDescriptor>,
    /// Schema identifiers of the extensions that contributed.
    pub schemas: Vec<&'static str>,
}

impl ExtensionOutput {
    /// Band descriptors, created on first use.
    fn bands_mut(&mut self, count: usize) -> &mut [BandDescriptor] {
        if self.bands.is_empty() {
            self.bands = (1..=count).map(BandDescriptor::numbered).collect();
        }
        &mut self.bands
    }
}

type BuildFn = fn(&DatasetFacts, &mut ExtensionOutput) -> Result<bool>;

struct Extension {
    name: &'static str,
    schema: &'static str,
    enabled: fn(&ExtensionFlags) -> bool,
    /// Returns whether anything relevant was found.
    build: BuildFn,
}

const EXTENSIONS: [Extension; 3] = [
    Extension {
        name: "projection",
        schema: PROJECTION_SCHEMA,
        enabled: |flags| flags.proj,
        build: projection::build,
    },
    Extension {
        name: "raster",
        schema: RASTER_SCHEMA,
        enabled: |flags| flags.raster,
        build: raster::build,
    },
    Extension {
        name: "eo",
        schema: EO_SCHEMA,
        enabled: |flags| flags.eo,
        build: eo::build,
    },
];

/// Run every enabled extension against `facts`.
pub fn assemble(facts: &DatasetFacts, flags: &ExtensionFlags) -> Result<ExtensionOutput> {
    let mut output = ExtensionOutput::default();
    for extension in EXTENSIONS.iter().filter(|extension| (extension.enabled)(flags)) {
        if (extension.build)(facts, &mut output)? {
            output.schemas.push(extension.schema);
        } else {
            debug!(
                "{} extension not relevant for {:?}",
                extension.name, facts.source_path
            );
        }
    }
    Ok(output)
}
