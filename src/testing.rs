//! In-memory stand-ins for the raster access and reprojection seams.

use std::{collections::HashMap, path::Path};

use geo::LineString;

use crate::{
    components::{
        BandFacts, BandStatistics, DatasetFacts, GeoTransform, Histogram, RasterAccess, Statistics,
    },
    crs_geo::{Crs, Reprojector},
    errors::{Result, RioStacError},
};

/// Pretends every CRS already is WGS84.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityReprojector;

impl Reprojector for IdentityReprojector {
    fn reproject(&self, ring: &LineString, from: &Crs, source_path: &Path) -> Result<LineString> {
        match from.definition() {
            Some(_) => Ok(ring.clone()),
            None => Err(RioStacError::undefined_crs(source_path)),
        }
    }
}

/// Facts served by file name, regardless of the directory they are asked for in.
#[derive(Debug, Default, Clone)]
pub struct MemoryAccess {
    facts: HashMap<String, DatasetFacts>,
}

impl MemoryAccess {
    pub fn with(mut self, facts: DatasetFacts) -> Self {
        let name = file_name(&facts.source_path);
        self.facts.insert(name, facts);
        self
    }
}

impl RasterAccess for MemoryAccess {
    fn facts(&self, source: &Path) -> Result<DatasetFacts> {
        let mut facts = self
            .facts
            .get(&file_name(source))
            .cloned()
            .ok_or_else(|| RioStacError::UnreadableSource {
                source_path: source.to_path_buf(),
                source: gdal::errors::GdalError::BadArgument(format!("{source:?} is not a raster")),
            })?;
        facts.source_path = source.to_path_buf();
        Ok(facts)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Single band uint16 scene on a 10m UTM grid, 2x2 pixels.
pub fn uint16_facts(path: impl AsRef<Path>) -> DatasetFacts {
    let mut facts = DatasetFacts::new(
        path.as_ref(),
        GeoTransform::new(10., 0., 0., 0., -10., 100.),
        (2, 2),
    );
    facts.driver = "GTiff".into();
    facts.crs = Some(Crs::from_code("EPSG:32633"));
    let mut band = BandFacts::new("uint16");
    band.color = Some("Gray".into());
    facts.bands.push(band);
    facts.statistics.push(BandStatistics {
        statistics: Some(Statistics {
            mean: 2.5,
            minimum: 1.,
            maximum: 4.,
            stddev: 1.118,
            valid_percent: Some(100.),
        }),
        histogram: Some(Histogram {
            count: 11,
            min: 1.,
            max: 4.,
            buckets: vec![1, 0, 0, 1, 0, 0, 1, 0, 0, 1],
        }),
    });
    facts
}

/// Three band picture without georeference.
pub fn thumbnail_facts(path: impl AsRef<Path>) -> DatasetFacts {
    let mut facts = DatasetFacts::new(path.as_ref(), GeoTransform::default(), (64, 64));
    facts.driver = "PNG".into();
    for color in ["Red", "Green", "Blue"] {
        let mut band = BandFacts::new("uint8");
        band.color = Some(color.into());
        facts.bands.push(band);
        facts.statistics.push(BandStatistics::default());
    }
    facts
}
