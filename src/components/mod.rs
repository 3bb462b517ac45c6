pub mod antimeridian;
pub mod band;
pub mod bounds;
pub mod engines;
pub mod file;
pub mod transforms;

pub use band::{BandFacts, BandStatistics, Histogram, Statistics};
pub use bounds::{BoundingBox, Footprint};
pub use engines::gdal_engine::{GdalAccess, GdalFile, RasterEnv};
pub use file::{DatasetFacts, File, RasterAccess};
pub use transforms::GeoTransform;

use std::collections::BTreeMap;
pub type Metadata = BTreeMap<String, String>;
