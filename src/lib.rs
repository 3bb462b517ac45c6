//! STAC items from raster datasets.
//!
//! Raster facts are read through GDAL, footprints are reprojected with proj
//! and assembled into one item per file or per directory.

pub mod assembler;
pub mod components;
pub mod config;
pub mod crs_geo;
pub mod errors;
pub mod extensions;
pub mod item;
pub mod properties;

#[cfg(test)]
mod testing;

use std::path::Path;

pub use assembler::ItemAssembler;
pub use components::{DatasetFacts, GdalAccess, RasterAccess, RasterEnv};
pub use config::{ItemConfig, ItemOptions};
pub use crs_geo::{ProjReprojector, Reprojector};
pub use errors::{ConfigurationError, Result, RioStacError};
pub use item::{Asset, Item, MediaType};

/// Assembler reading with GDAL and reprojecting with proj.
pub fn gdal_assembler(config: ItemConfig) -> ItemAssembler<GdalAccess, ProjReprojector> {
    let access = GdalAccess::new(config.env.clone(), config.statistics);
    ItemAssembler::new(config, access, ProjReprojector)
}

/// Item for a raster file, or for a directory when `options.recursive` is set.
pub fn create_stac_item(input: impl AsRef<Path>, options: &ItemOptions) -> Result<Item> {
    gdal_assembler(options.resolve()?).run(input.as_ref())
}
