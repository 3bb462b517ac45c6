use log::warn;
use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};

use crate::{
    components::{engines::gdal_engine::RasterEnv, BandFacts, BandStatistics, GeoTransform, Metadata},
    crs_geo::Crs,
    errors::{ConfigurationError, Result},
};

/// How much work the access layer spends on band statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsOptions {
    pub enabled: bool,
    /// Above this size in either dimension statistics may be approximated.
    pub max_size: usize,
    pub histogram_bins: usize,
}

impl Default for StatisticsOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 1024,
            histogram_bins: 10,
        }
    }
}

pub trait File: Debug + Sized {
    fn open<P: AsRef<Path>>(path: P, env: &RasterEnv) -> Result<Self>;
    fn read_facts(&self, options: &StatisticsOptions) -> Result<DatasetFacts>;
}

/// Raster access layer as seen by item assembly.
///
/// Implementations open, read and release the source within one call.
pub trait RasterAccess: Sync {
    fn facts(&self, source: &Path) -> Result<DatasetFacts>;
}

/// Snapshot of everything item assembly needs from one raster source.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetFacts {
    pub source_path: PathBuf,
    /// Driver short name, e.g. `GTiff`.
    pub driver: String,
    /// `LAYOUT` item of the `IMAGE_STRUCTURE` domain.
    pub layout: Option<String>,
    pub transform: GeoTransform,
    /// (width, height)
    pub size: (usize, usize),
    pub crs: Option<Crs>,
    pub bands: Vec<BandFacts>,
    pub statistics: Vec<BandStatistics>,
    /// Default domain tags.
    pub tags: Metadata,
    /// `IMAGERY` domain tags.
    pub imagery: Metadata,
}

impl DatasetFacts {
    pub fn new(source_path: impl Into<PathBuf>, transform: GeoTransform, size: (usize, usize)) -> Self {
        Self {
            source_path: source_path.into(),
            driver: String::new(),
            layout: None,
            transform,
            size,
            crs: None,
            bands: Vec::new(),
            statistics: Vec::new(),
            tags: Metadata::new(),
            imagery: Metadata::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.size.0
    }

    pub fn height(&self) -> usize {
        self.size.1
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Bands zipped with their statistics, in band order.
    pub fn band_pairs(&self) -> Result<impl Iterator<Item = (&BandFacts, &BandStatistics)>> {
        if self.bands.len() != self.statistics.len() {
            Err(ConfigurationError::BandCountMismatch {
                source_path: self.source_path.clone(),
                bands: self.bands.len(),
                statistics: self.statistics.len(),
            })?
        }
        Ok(self.bands.iter().zip(self.statistics.iter()))
    }

    /// `CLOUDCOVER` imagery tag, when numeric.
    pub fn cloud_cover(&self) -> Option<f64> {
        let value = self.imagery.get("CLOUDCOVER")?;
        match value.trim().parse::<f64>() {
            Ok(cloud_cover) if cloud_cover.is_finite() => Some(cloud_cover),
            _ => {
                warn!(
                    "ignoring non numeric CLOUDCOVER {value:?} in {:?}",
                    self.source_path
                );
                None
            }
        }
    }

    /// Acquisition time tag, imagery domain first.
    pub fn acquisition_time(&self) -> Option<&str> {
        self.imagery
            .get("ACQUISITIONDATETIME")
            .or(self.tags.get("TIFFTAG_DATETIME"))
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn satellite_id(&self) -> Option<&str> {
        self.imagery.get("SATELLITEID").map(String::as_str)
    }

    /// `AREA_OR_POINT` tag, lower cased.
    pub fn area_or_point(&self) -> Option<String> {
        self.tags
            .get("AREA_OR_POINT")
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty())
    }

    pub fn is_georeferenced(&self) -> bool {
        self.crs.as_ref().and_then(Crs::definition).is_some()
    }
}
