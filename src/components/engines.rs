use std::path::Path;

use crate::{
    components::{
        file::{DatasetFacts, File, RasterAccess, StatisticsOptions},
        BandFacts, BandStatistics, GeoTransform, Histogram, Metadata, Statistics,
    },
    crs_geo::Crs,
    errors::{Result, RioStacError},
};

/// Normalise GDAL data type names to lower case numpy style names.
pub fn data_type_name(gdal_name: &str) -> String {
    match gdal_name {
        "Byte" => "uint8".to_string(),
        other => other.to_lowercase(),
    }
}

/// Implementations for gdal
pub mod gdal_engine {
    use std::path::PathBuf;

    use super::*;
    use gdal::{
        spatial_ref::SpatialRef, Dataset as GdalDataset, DatasetOptions, GdalOpenFlags,
        Metadata as GdalMetadata, MetadataEntry as GdalMetadataEntry,
    };
    use log::{debug, info, warn};

    /// Default and `IMAGERY` domain tags.
    fn tags_gdal(metadata: &impl GdalMetadata) -> (Metadata, Metadata) {
        let (mut tags, mut imagery) = (Metadata::new(), Metadata::new());
        for GdalMetadataEntry { domain, key, value } in GdalMetadata::metadata(metadata) {
            match domain.as_str() {
                "" => {
                    tags.insert(key, value);
                }
                "IMAGERY" => {
                    imagery.insert(key, value);
                }
                _ => (),
            }
        }
        (tags, imagery)
    }

    /// [Crs] of a spatial reference, resolving an EPSG code when the root
    /// element carries no authority.
    pub fn crs_from_spatial_ref(mut spatial_ref: SpatialRef) -> Option<Crs> {
        let wkt = spatial_ref.to_wkt().ok().filter(|wkt| !wkt.trim().is_empty())?;
        if spatial_ref.auth_name().is_none() {
            if let Err(err) = spatial_ref.auto_identify_epsg() {
                debug!("no EPSG code matches {wkt:?}: {err}");
            }
        }
        Some(Crs {
            code: spatial_ref.authority().ok(),
            wkt: Some(wkt),
        })
    }

    /// GDAL configuration options applied while opening a dataset.
    #[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub struct RasterEnv {
        pub options: Vec<(String, String)>,
    }

    impl RasterEnv {
        pub fn new(options: Vec<(String, String)>) -> Self {
            Self { options }
        }

        /// Run `f` with the options set for the current thread only.
        ///
        /// Every option is cleared afterwards, including when setting one failed.
        pub fn scoped<T>(&self, f: impl FnOnce() -> T) -> Result<T> {
            let applied = self.options.iter().try_for_each(|(key, value)| {
                gdal::config::set_thread_local_config_option(key, value)
            });
            let result = applied.map(|()| f());
            for (key, _) in &self.options {
                if let Err(err) = gdal::config::clear_thread_local_config_option(key) {
                    warn!("could not clear GDAL option {key}: {err}");
                }
            }
            Ok(result?)
        }
    }

    #[derive(Debug)]
    pub struct GdalFile {
        dataset: GdalDataset,
        path: PathBuf,
    }

    impl File for GdalFile {
        fn open<P: AsRef<Path>>(path: P, env: &RasterEnv) -> Result<Self> {
            let path = path.as_ref();
            let options = DatasetOptions {
                open_flags: GdalOpenFlags::GDAL_OF_RASTER,
                ..Default::default()
            };
            let dataset = env
                .scoped(|| GdalDataset::open_ex(path, options))?
                .map_err(|source| RioStacError::UnreadableSource {
                    source_path: path.to_path_buf(),
                    source,
                })?;
            info!("opened {path:?} with {}", dataset.driver().short_name());
            Ok(GdalFile::new(dataset, path))
        }

        fn read_facts(&self, options: &StatisticsOptions) -> Result<DatasetFacts> {
            let (transform, crs) = self.georeference();
            let size = self.dataset.raster_size();
            let mut facts = DatasetFacts::new(self.path.clone(), transform, size);
            facts.driver = self.dataset.driver().short_name();
            facts.layout = self.dataset.metadata_item("LAYOUT", "IMAGE_STRUCTURE");
            facts.crs = crs;
            (facts.tags, facts.imagery) = tags_gdal(&self.dataset);

            let approx = size.0.max(size.1) > options.max_size;
            for index in 1..=self.dataset.raster_count() {
                let (band, statistics) = self.band(index, options, approx)?;
                facts.bands.push(band);
                facts.statistics.push(statistics);
            }
            Ok(facts)
        }
    }

    impl GdalFile {
        pub fn new(dataset: GdalDataset, path: impl Into<PathBuf>) -> Self {
            Self {
                dataset,
                path: path.into(),
            }
        }

        /// Geo transform and CRS, fitted from ground control points when the
        /// dataset has no geo transform of its own.
        fn georeference(&self) -> (GeoTransform, Option<Crs>) {
            let crs = self.dataset.spatial_ref().ok().and_then(crs_from_spatial_ref);
            let err = match self.dataset.geo_transform() {
                Ok(gdal_transform) => return (GeoTransform::from_gdal(gdal_transform), crs),
                Err(err) => err,
            };
            let points: Vec<_> = self
                .dataset
                .gcps()
                .iter()
                .map(|gcp| (gcp.pixel(), gcp.line(), gcp.x(), gcp.y()))
                .collect();
            match GeoTransform::from_gcps(&points) {
                Some(transform) => {
                    debug!("{:?} georeferenced from {} GCPs", self.path, points.len());
                    let gcp_crs = self.dataset.gcp_spatial_ref().and_then(crs_from_spatial_ref);
                    (transform, gcp_crs.or(crs))
                }
                None => {
                    debug!("{:?} has no geo transform: {err}", self.path);
                    (GeoTransform::default(), crs)
                }
            }
        }

        fn band(
            &self,
            index: usize,
            options: &StatisticsOptions,
            approx: bool,
        ) -> Result<(BandFacts, BandStatistics)> {
            let raster_band = self.dataset.rasterband(index)?;
            let description = GdalMetadata::description(&raster_band)?;
            let color = raster_band.color_interpretation().name();
            let unit = raster_band.unit();
            let band = BandFacts {
                description: Some(description).filter(|value| !value.is_empty()),
                color: Some(color).filter(|value| value != "Undefined"),
                data_type: data_type_name(&raster_band.band_type().name()),
                nodata: raster_band.no_data_value(),
                scale: raster_band.scale(),
                offset: raster_band.offset(),
                unit: Some(unit).filter(|value| !value.is_empty()),
                imagery: tags_gdal(&raster_band).1,
            };

            if !options.enabled {
                return Ok((band, BandStatistics::default()));
            }
            let statistics = match raster_band.get_statistics(true, approx) {
                Ok(Some(all)) => Some(Statistics {
                    mean: all.mean,
                    minimum: all.min,
                    maximum: all.max,
                    stddev: all.std_dev,
                    valid_percent: raster_band
                        .metadata_item("STATISTICS_VALID_PERCENT", "")
                        .and_then(|value| value.parse().ok()),
                }),
                Ok(None) => None,
                Err(err) => {
                    warn!("no statistics for band {index} of {:?}: {err}", self.path);
                    None
                }
            };
            let histogram = statistics.as_ref().and_then(|stats| {
                raster_band
                    .histogram(
                        stats.minimum,
                        stats.maximum,
                        options.histogram_bins,
                        false,
                        approx,
                    )
                    .map(|histogram| Histogram {
                        count: options.histogram_bins + 1,
                        min: stats.minimum,
                        max: stats.maximum,
                        buckets: histogram.counts().to_vec(),
                    })
                    .map_err(|err| warn!("no histogram for band {index} of {:?}: {err}", self.path))
                    .ok()
            });
            Ok((
                band,
                BandStatistics {
                    statistics,
                    histogram,
                },
            ))
        }
    }

    /// [RasterAccess] opening each source with GDAL.
    #[derive(Debug, Clone, Default)]
    pub struct GdalAccess {
        pub env: RasterEnv,
        pub statistics: StatisticsOptions,
    }

    impl GdalAccess {
        pub fn new(env: RasterEnv, statistics: StatisticsOptions) -> Self {
            Self { env, statistics }
        }
    }

    impl RasterAccess for GdalAccess {
        fn facts(&self, source: &Path) -> Result<DatasetFacts> {
            // The dataset is released when `file` drops, on every path.
            let file = GdalFile::open(source, &self.env)?;
            file.read_facts(&self.statistics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{gdal_engine::*, *};
    use gdal::{
        raster::{Buffer, ColorInterpretation},
        spatial_ref::SpatialRef,
        Dataset as GdalDataset, DriverManager, Gcp, Metadata as GdalMetadata,
    };
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    const UTM_TRANSFORM: [f64; 6] = [300000., 10., 0., 5000000., 0., -10.];

    /// UTM 33N with only the geographic part carrying an authority.
    const UTM_WKT_WITHOUT_ROOT_AUTHORITY: &str = r#"PROJCS["WGS 84 / UTM zone 33N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",15],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",0],UNIT["metre",1]]"#;

    fn memory_dataset(bands: usize) -> GdalDataset {
        DriverManager::get_driver_by_name("MEM")
            .unwrap()
            .create_with_band_type::<u16, _>("", 2, 2, bands)
            .unwrap()
    }

    #[fixture]
    fn tagged() -> GdalDataset {
        let mut dataset = memory_dataset(1);
        dataset.set_geo_transform(&UTM_TRANSFORM).unwrap();
        dataset
            .set_spatial_ref(&SpatialRef::from_epsg(32633).unwrap())
            .unwrap();
        dataset.set_metadata_item("AREA_OR_POINT", "Area", "").unwrap();
        dataset
            .set_metadata_item("TIFFTAG_DATETIME", "2021:03:04 05:06:07", "")
            .unwrap();
        dataset.set_metadata_item("CLOUDCOVER", "12", "IMAGERY").unwrap();
        dataset.set_metadata_item("SATELLITEID", "SAT-1", "IMAGERY").unwrap();

        {
            let mut band = dataset.rasterband(1).unwrap();
            band.write((0, 0), (2, 2), &mut Buffer::new((2, 2), vec![1u16, 2, 3, 4]))
                .unwrap();
            band.set_no_data_value(Some(0.)).unwrap();
            band.set_color_interpretation(ColorInterpretation::GrayIndex)
                .unwrap();
            band.set_description("pan").unwrap();
            band.set_metadata_item("CENTRAL_WAVELENGTH_UM", "0.65", "IMAGERY")
                .unwrap();
        }
        dataset
    }

    #[rstest]
    fn reads_dataset_facts(tagged: GdalDataset) {
        let file = GdalFile::new(tagged, "scene.tif");
        let facts = file.read_facts(&StatisticsOptions::default()).unwrap();

        assert_eq!(facts.driver, "MEM");
        assert_eq!(facts.size, (2, 2));
        assert_eq!(facts.transform, GeoTransform::from_gdal(UTM_TRANSFORM));
        assert_eq!(
            facts.crs.as_ref().and_then(|crs| crs.code.as_deref()),
            Some("EPSG:32633")
        );
        assert_eq!(facts.area_or_point().as_deref(), Some("area"));
        assert_eq!(facts.acquisition_time(), Some("2021:03:04 05:06:07"));
        assert_eq!(facts.cloud_cover(), Some(12.));
        assert_eq!(facts.satellite_id(), Some("SAT-1"));

        let band = &facts.bands[0];
        assert_eq!(band.data_type, "uint16");
        assert_eq!(band.nodata, Some(0.));
        assert_eq!(band.color.as_deref(), Some("Gray"));
        assert_eq!(band.description.as_deref(), Some("pan"));
        assert_eq!(
            band.imagery.get("CENTRAL_WAVELENGTH_UM").map(String::as_str),
            Some("0.65")
        );
    }

    #[rstest]
    fn reads_statistics_and_histogram(tagged: GdalDataset) {
        let file = GdalFile::new(tagged, "scene.tif");
        let options = StatisticsOptions {
            histogram_bins: 4,
            ..Default::default()
        };
        let facts = file.read_facts(&options).unwrap();
        let band = &facts.statistics[0];

        let statistics = band.statistics.unwrap();
        assert_eq!((statistics.minimum, statistics.maximum), (1., 4.));
        assert!((statistics.mean - 2.5).abs() < 1e-9);
        assert_eq!(statistics.valid_percent, Some(100.));

        let histogram = band.histogram.as_ref().unwrap();
        assert_eq!(histogram.count, 5);
        assert_eq!(histogram.buckets.len(), 4);
        assert_eq!((histogram.min, histogram.max), (1., 4.));
    }

    #[rstest]
    fn statistics_can_be_skipped(tagged: GdalDataset) {
        let file = GdalFile::new(tagged, "scene.tif");
        let options = StatisticsOptions {
            enabled: false,
            ..Default::default()
        };
        let facts = file.read_facts(&options).unwrap();
        assert_eq!(facts.statistics, vec![BandStatistics::default()]);
    }

    #[rstest]
    fn georeferences_from_gcps() {
        let dataset = memory_dataset(1);
        let truth = GeoTransform::from_gdal(UTM_TRANSFORM);
        let gcps = [(0., 0.), (2., 0.), (2., 2.), (0., 2.)]
            .into_iter()
            .enumerate()
            .map(|(id, (pixel, line))| {
                let geo = truth.pixel_to_geo(pixel, line);
                Gcp {
                    id: id.to_string(),
                    info: String::new(),
                    pixel,
                    line,
                    x: geo.x,
                    y: geo.y,
                    z: 0.,
                }
            })
            .collect();
        dataset
            .set_gcps(gcps, &SpatialRef::from_epsg(32633).unwrap())
            .unwrap();

        let facts = GdalFile::new(dataset, "gcps.tif")
            .read_facts(&StatisticsOptions::default())
            .unwrap();
        assert!(facts.is_georeferenced());
        assert_eq!(
            facts.crs.as_ref().and_then(|crs| crs.code.as_deref()),
            Some("EPSG:32633")
        );
        for (fitted, expected) in facts.transform.coefficients().iter().zip(truth.coefficients()) {
            assert!((fitted - expected).abs() < 1e-6);
        }
    }

    #[rstest]
    fn ungeoreferenced_dataset_has_no_crs() {
        let facts = GdalFile::new(memory_dataset(3), "thumb.png")
            .read_facts(&StatisticsOptions::default())
            .unwrap();
        assert_eq!(facts.crs, None);
        assert_eq!(facts.transform, GeoTransform::default());
        assert_eq!(facts.band_count(), 3);
    }

    #[rstest]
    fn identifies_epsg_without_root_authority() {
        let spatial_ref = SpatialRef::from_wkt(UTM_WKT_WITHOUT_ROOT_AUTHORITY).unwrap();
        let crs = crs_from_spatial_ref(spatial_ref).unwrap();
        assert_eq!(crs.code.as_deref(), Some("EPSG:32633"));
        assert!(crs.wkt.is_some());
    }

    #[rstest]
    fn reads_geotiff_through_access() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.tif");
        {
            let mut dataset = DriverManager::get_driver_by_name("GTiff")
                .unwrap()
                .create_with_band_type::<u16, _>(&path, 2, 2, 1)
                .unwrap();
            dataset.set_geo_transform(&UTM_TRANSFORM).unwrap();
            dataset
                .set_spatial_ref(&SpatialRef::from_epsg(32633).unwrap())
                .unwrap();
            dataset
                .rasterband(1)
                .unwrap()
                .write((0, 0), (2, 2), &mut Buffer::new((2, 2), vec![1u16, 2, 3, 4]))
                .unwrap();
        }

        let facts = GdalAccess::default().facts(&path).unwrap();
        assert_eq!(facts.driver, "GTiff");
        assert_eq!(facts.source_path, path);
        assert_eq!(
            facts.crs.as_ref().and_then(|crs| crs.code.as_deref()),
            Some("EPSG:32633")
        );
        assert_eq!(facts.statistics[0].statistics.map(|s| s.maximum), Some(4.));
    }

    #[rstest]
    fn vector_files_are_not_rasters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("points.csv");
        std::fs::write(&path, "id,x,y\n1,10,45\n").unwrap();
        let err = GdalAccess::default().facts(&path).unwrap_err();
        assert!(matches!(err, RioStacError::UnreadableSource { .. }));
    }

    #[rstest]
    fn scoped_options_are_cleared() {
        let env = RasterEnv::new(vec![("RIO_STAC_TEST_OPTION".into(), "on".into())]);
        let inside = env
            .scoped(|| gdal::config::get_thread_local_config_option("RIO_STAC_TEST_OPTION", ""))
            .unwrap()
            .unwrap();
        assert_eq!(inside, "on");
        let after =
            gdal::config::get_thread_local_config_option("RIO_STAC_TEST_OPTION", "").unwrap();
        assert_eq!(after, "");
    }

    #[rstest]
    fn failed_option_still_clears_the_others() {
        let env = RasterEnv::new(vec![
            ("RIO_STAC_SET_FIRST".into(), "on".into()),
            ("BROKEN\0KEY".into(), "on".into()),
        ]);
        let mut called = false;
        assert!(env.scoped(|| called = true).is_err());
        assert!(!called);
        let after = gdal::config::get_thread_local_config_option("RIO_STAC_SET_FIRST", "").unwrap();
        assert_eq!(after, "");
    }

    #[rstest]
    #[case("Byte", "uint8")]
    #[case("UInt16", "uint16")]
    #[case("Float32", "float32")]
    fn normalises_data_types(#[case] gdal_name: &str, #[case] expected: &str) {
        assert_eq!(data_type_name(gdal_name), expected);
    }
}
