use geo::{Coord, LineString};
use serde::Serialize;

use crate::{
    components::{antimeridian, DatasetFacts, GeoTransform},
    crs_geo::Reprojector,
    errors::{Result, RioStacError},
};

/// Envelope of a ring, `[minx, miny, maxx, maxy]` once serialized.
///
/// In WGS84 `minx > maxx` marks an envelope across the antimeridian.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Coord,
    pub max: Coord,
}

impl BoundingBox {
    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coord>) -> Option<Self> {
        coords.into_iter().fold(None, |acc, coord| {
            Some(match acc {
                None => Self {
                    min: *coord,
                    max: *coord,
                },
                Some(Self { min, max }) => Self {
                    min: Coord {
                        x: min.x.min(coord.x),
                        y: min.y.min(coord.y),
                    },
                    max: Coord {
                        x: max.x.max(coord.x),
                        y: max.y.max(coord.y),
                    },
                },
            })
        })
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

/// GeoJSON geometry of a footprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum GeoJsonGeometry {
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
}

fn positions(ring: &LineString) -> Vec<[f64; 2]> {
    ring.coords().map(|coord| [coord.x, coord.y]).collect()
}

impl From<&[LineString]> for GeoJsonGeometry {
    fn from(rings: &[LineString]) -> Self {
        match rings {
            [ring] => Self::Polygon(vec![positions(ring)]),
            rings => Self::MultiPolygon(rings.iter().map(|ring| vec![positions(ring)]).collect()),
        }
    }
}

/// Outline of a dataset together with its envelope.
///
/// One ring, or one per side of the antimeridian.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    rings: Vec<LineString>,
    bbox: BoundingBox,
}

impl Footprint {
    fn from_ring(ring: LineString) -> Self {
        // Rings always hold at least the closing vertex.
        let bbox = BoundingBox::from_coords(ring.coords()).unwrap_or_default();
        Self {
            rings: vec![ring],
            bbox,
        }
    }

    /// Outline in the dataset's own CRS, without densification.
    pub fn native(facts: &DatasetFacts) -> Self {
        Self::from_ring(native_ring(&facts.transform, facts.size, 0))
    }

    /// Outline reprojected to WGS84 and cut at the antimeridian.
    ///
    /// `densify` vertices are inserted on every edge before reprojection,
    /// rounding to `precision` decimals happens after it.
    pub fn wgs84(
        facts: &DatasetFacts,
        densify: usize,
        precision: Option<u32>,
        reprojector: &impl Reprojector,
    ) -> Result<Self> {
        let crs = facts
            .crs
            .as_ref()
            .ok_or_else(|| RioStacError::undefined_crs(&facts.source_path))?;
        let ring = native_ring(&facts.transform, facts.size, densify);
        let ring = reprojector.reproject(&ring, crs, &facts.source_path)?;
        let antimeridian::Split {
            mut rings,
            mut bbox,
        } = antimeridian::split(&ring);
        if let Some(precision) = precision {
            rings.iter_mut().for_each(|ring| round_coords(&mut ring.0, precision));
            round_coords([&mut bbox.min, &mut bbox.max], precision);
        }
        Ok(Self { rings, bbox })
    }

    pub fn rings(&self) -> &[LineString] {
        &self.rings
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn geometry(&self) -> GeoJsonGeometry {
        GeoJsonGeometry::from(self.rings.as_slice())
    }
}

/// Ring through the pixel corners `(0,0), (W,0), (W,H), (0,H)`.
pub fn native_ring(transform: &GeoTransform, size: (usize, usize), densify: usize) -> LineString {
    let (width, height) = (size.0 as f64, size.1 as f64);
    let corners = [(0., 0.), (width, 0.), (width, height), (0., height)]
        .map(|(col, row)| transform.pixel_to_geo(col, row));

    let steps = densify + 1;
    let mut coords = Vec::with_capacity(4 * steps + 1);
    for (idx, start) in corners.iter().enumerate() {
        let end = corners[(idx + 1) % corners.len()];
        coords.extend((0..steps).map(|step| {
            let t = step as f64 / steps as f64;
            Coord {
                x: start.x + (end.x - start.x) * t,
                y: start.y + (end.y - start.y) * t,
            }
        }));
    }
    coords.push(corners[0]);
    LineString::new(coords)
}

/// Decimals beyond what an f64 coordinate can carry.
const MAX_PRECISION: u32 = 15;

fn round_coords<'a>(coords: impl IntoIterator<Item = &'a mut Coord>, precision: u32) {
    if precision > MAX_PRECISION {
        return;
    }
    let factor = 10f64.powi(precision as i32);
    coords.into_iter().for_each(|coord| {
        coord.x = (coord.x * factor).round() / factor;
        coord.y = (coord.y * factor).round() / factor;
    });
}

/// Reject a source whose outline cannot be placed on the globe.
pub fn require_georeference(facts: &DatasetFacts) -> Result<()> {
    if facts.is_georeferenced() {
        Ok(())
    } else {
        Err(RioStacError::undefined_crs(&facts.source_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crs_geo::Crs, testing::IdentityReprojector};
    use rstest::{fixture, rstest};

    #[fixture]
    fn facts() -> DatasetFacts {
        let mut facts = DatasetFacts::new(
            "scene.tif",
            GeoTransform::new(10., 0., 0., 0., -10., 100.),
            (2, 2),
        );
        facts.crs = Some(Crs::from_code("EPSG:32633"));
        facts
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(5)]
    #[case(21)]
    fn ring_is_closed_with_expected_vertex_count(#[case] densify: usize) {
        let transform = GeoTransform::new(0.3, 0.1, -12., 0.05, -0.3, 40.);
        let ring = native_ring(&transform, (37, 11), densify);
        assert_eq!(ring.0.len(), 4 * (densify + 1) + 1);
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[rstest]
    fn native_ring_follows_pixel_corners(facts: DatasetFacts) {
        let footprint = Footprint::native(&facts);
        let coords: Vec<(f64, f64)> = footprint.rings()[0].coords().map(|c| c.x_y()).collect();
        assert_eq!(
            coords,
            vec![(0., 100.), (20., 100.), (20., 80.), (0., 80.), (0., 100.)]
        );
        assert_eq!(footprint.bbox().to_array(), [0., 80., 20., 100.]);
    }

    #[rstest]
    fn densified_vertices_are_evenly_spaced(facts: DatasetFacts) {
        let ring = native_ring(&facts.transform, facts.size, 1);
        assert_eq!(ring.0[1], Coord { x: 10., y: 100. });
        assert_eq!(ring.0[3], Coord { x: 20., y: 90. });
    }

    #[rstest]
    #[case((0, 2))]
    #[case((2, 0))]
    #[case((0, 0))]
    fn zero_area_is_degenerate_but_closed(mut facts: DatasetFacts, #[case] size: (usize, usize)) {
        facts.size = size;
        let footprint = Footprint::wgs84(&facts, 2, None, &IdentityReprojector).unwrap();
        assert_eq!(footprint.rings()[0].0.len(), 13);
        assert_eq!(footprint.rings()[0].0.first(), footprint.rings()[0].0.last());
        let bbox = footprint.bbox();
        assert!(bbox.min.x <= bbox.max.x && bbox.min.y <= bbox.max.y);
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(6)]
    fn rounding_keeps_vertices_and_limits_digits(mut facts: DatasetFacts, #[case] precision: u32) {
        facts.transform = GeoTransform::new(0.123456789, 0., 3.987654321, 0., -0.111111111, 45.555555555);
        let unrounded = Footprint::wgs84(&facts, 3, None, &IdentityReprojector).unwrap();
        let rounded = Footprint::wgs84(&facts, 3, Some(precision), &IdentityReprojector).unwrap();
        assert_eq!(unrounded.rings()[0].0.len(), rounded.rings()[0].0.len());
        for coord in rounded.rings()[0].coords() {
            for value in [coord.x, coord.y] {
                let text = serde_json::to_string(&value).unwrap();
                let digits = text
                    .split_once('.')
                    .map_or(0, |(_, frac)| frac.trim_end_matches('0').len());
                assert!(digits <= precision as usize, "{text} has more than {precision} digits");
            }
        }
        let bbox = rounded.bbox();
        assert_eq!(
            BoundingBox::from_coords(rounded.rings()[0].coords()),
            Some(bbox)
        );
    }

    #[rstest]
    #[case(16)]
    #[case(400)]
    #[case(u32::MAX)]
    fn precision_past_f64_keeps_coordinates(mut facts: DatasetFacts, #[case] precision: u32) {
        facts.transform = GeoTransform::new(0.123456789, 0., 3.987654321, 0., -0.111111111, 45.555555555);
        let unrounded = Footprint::wgs84(&facts, 1, None, &IdentityReprojector).unwrap();
        let rounded = Footprint::wgs84(&facts, 1, Some(precision), &IdentityReprojector).unwrap();
        assert_eq!(rounded, unrounded);
        assert!(rounded.rings()[0].coords().all(|coord| coord.x.is_finite() && coord.y.is_finite()));
    }

    #[rstest]
    fn antimeridian_crossing_becomes_multipolygon(mut facts: DatasetFacts) {
        facts.crs = Some(Crs::from_code("EPSG:4326"));
        facts.transform = GeoTransform::new(0.5, 0., 179., 0., -0.5, 10.);
        facts.size = (4, 20);
        let footprint = Footprint::wgs84(&facts, 0, Some(6), &IdentityReprojector).unwrap();
        assert_eq!(footprint.rings().len(), 2);
        assert_eq!(footprint.bbox().to_array(), [179., 0., -179., 10.]);
        let value = serde_json::to_value(footprint.geometry()).unwrap();
        assert_eq!(value["type"], "MultiPolygon");
        assert_eq!(value["coordinates"].as_array().unwrap().len(), 2);
    }

    #[rstest]
    fn missing_crs_is_fatal(mut facts: DatasetFacts) {
        facts.crs = None;
        let err = Footprint::wgs84(&facts, 0, None, &IdentityReprojector).unwrap_err();
        assert!(matches!(err, RioStacError::UndefinedCrs { .. }));
        assert!(require_georeference(&facts).is_err());
    }

    #[rstest]
    fn geometry_serializes_as_geojson(facts: DatasetFacts) {
        let footprint = Footprint::native(&facts);
        let value = serde_json::to_value(footprint.geometry()).unwrap();
        assert_eq!(value["type"], "Polygon");
        assert_eq!(value["coordinates"][0][2], serde_json::json!([20.0, 80.0]));
        assert_eq!(
            serde_json::to_value(footprint.bbox()).unwrap(),
            serde_json::json!([0.0, 80.0, 20.0, 100.0])
        );
    }
}
