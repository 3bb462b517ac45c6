use std::path::Path;

use geo::{Coord, LineString};
use proj::Proj;

use crate::errors::{Result, RioStacError};

pub const WGS84: &str = "EPSG:4326";

/// Coordinate reference system as reported by the raster access layer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Crs {
    /// `authority:code` when the definition resolves to one.
    pub code: Option<String>,
    pub wkt: Option<String>,
}

impl Crs {
    pub fn from_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            wkt: None,
        }
    }

    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            code: None,
            wkt: Some(wkt.into()),
        }
    }

    /// Definition handed to proj, `None` if nothing usable is known.
    pub fn definition(&self) -> Option<&str> {
        self.code
            .as_deref()
            .or(self.wkt.as_deref())
            .filter(|definition| !definition.trim().is_empty())
    }

    pub fn is_wgs84(&self) -> bool {
        self.code.as_deref().is_some_and(is_wgs84)
    }
}

fn is_wgs84(code: &str) -> bool {
    matches!(
        code.to_ascii_uppercase().as_str(),
        "EPSG:4326" | "OGC:CRS84" | "CRS84"
    )
}

/// Geometry/CRS transform library seam.
pub trait Reprojector: Sync {
    /// Reproject a ring to WGS84 in longitude/latitude order.
    fn reproject(&self, ring: &LineString, from: &Crs, source_path: &Path) -> Result<LineString>;
}

/// [Reprojector] backed by `proj`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjReprojector;

impl Reprojector for ProjReprojector {
    fn reproject(&self, ring: &LineString, from: &Crs, source_path: &Path) -> Result<LineString> {
        let definition = from
            .definition()
            .ok_or_else(|| RioStacError::undefined_crs(source_path))?;
        if from.is_wgs84() {
            return Ok(ring.clone());
        }
        // `new_known_crs` normalises both ends to visualisation axis order.
        let proj = Proj::new_known_crs(definition, WGS84, None).map_err(|source| {
            RioStacError::UndefinedCrs {
                source_path: source_path.to_path_buf(),
                source: Some(source),
            }
        })?;
        let coords = ring
            .coords()
            .map(|coord| {
                proj.convert((coord.x, coord.y))
                    .map(|(x, y)| Coord { x, y })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(LineString::new(coords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Crs::from_code("EPSG:4326"), true)]
    #[case(Crs::from_code("ogc:crs84"), true)]
    #[case(Crs::from_code("EPSG:32633"), false)]
    #[case(Crs::from_wkt("PROJCS[...]"), false)]
    fn recognises_wgs84(#[case] crs: Crs, #[case] expected: bool) {
        assert_eq!(crs.is_wgs84(), expected);
    }

    #[rstest]
    fn blank_definition_is_undefined() {
        let crs = Crs::from_wkt("  ");
        assert!(crs.definition().is_none());
        let ring = LineString::from(vec![(0., 0.), (1., 0.), (0., 0.)]);
        let err = ProjReprojector
            .reproject(&ring, &crs, Path::new("blank.tif"))
            .unwrap_err();
        assert!(matches!(err, RioStacError::UndefinedCrs { .. }));
    }

    #[rstest]
    fn unparseable_definition_is_undefined() {
        let ring = LineString::from(vec![(0., 0.), (1., 0.), (0., 0.)]);
        let err = ProjReprojector
            .reproject(&ring, &Crs::from_wkt("garbage"), Path::new("garbage.tif"))
            .unwrap_err();
        match err {
            RioStacError::UndefinedCrs {
                source_path,
                source,
            } => {
                assert_eq!(source_path, Path::new("garbage.tif"));
                assert!(source.is_some());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[rstest]
    fn wgs84_is_identity() {
        let ring = LineString::from(vec![(10., 45.), (11., 45.), (11., 44.), (10., 45.)]);
        let reprojected = ProjReprojector
            .reproject(&ring, &Crs::from_code(WGS84), Path::new("wgs84.tif"))
            .unwrap();
        assert_eq!(reprojected, ring);
    }

    #[rstest]
    fn utm_to_wgs84() {
        // UTM 33N central meridian is 15°E.
        let ring = LineString::from(vec![(500000., 0.), (500000., 0.)]);
        let reprojected = ProjReprojector
            .reproject(&ring, &Crs::from_code("EPSG:32633"), Path::new("utm.tif"))
            .unwrap();
        let first = reprojected.0[0];
        assert!((first.x - 15.).abs() < 1e-6);
        assert!(first.y.abs() < 1e-6);
    }
}
