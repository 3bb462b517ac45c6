use geo::{BooleanOps, Coord, LineString, Polygon, Rect, Translate};

use crate::components::BoundingBox;

/// A WGS84 outline cut at the antimeridian.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Exterior rings, each within `[-180, 180]` longitude.
    pub rings: Vec<LineString>,
    /// West edge greater than the east edge when the outline crosses.
    pub bbox: BoundingBox,
}

/// Ring with every longitude step brought within 180°.
fn unwrap_longitudes(ring: &LineString) -> LineString {
    let mut coords: Vec<Coord> = Vec::with_capacity(ring.0.len());
    for coord in ring.coords() {
        let mut next = *coord;
        if let Some(previous) = coords.last() {
            next.x += ((previous.x - next.x) / 360.).round() * 360.;
        }
        coords.push(next);
    }
    LineString::new(coords)
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.).rem_euclid(360.) - 180.
    }
}

/// Cut a ring that jumps across the antimeridian into pieces on either side.
///
/// Rings that stay on one side, or that wrap around a pole, come back as
/// they are.
pub fn split(ring: &LineString) -> Split {
    let whole = || Split {
        rings: vec![ring.clone()],
        bbox: BoundingBox::from_coords(ring.coords()).unwrap_or_default(),
    };
    let unwrapped = unwrap_longitudes(ring);
    let Some(envelope) = BoundingBox::from_coords(unwrapped.coords()) else {
        return whole();
    };
    let closed = match (unwrapped.0.first(), unwrapped.0.last()) {
        (Some(first), Some(last)) => (first.x - last.x).abs() < 180.,
        _ => false,
    };
    if !closed || (envelope.min.x >= -180. && envelope.max.x <= 180.) {
        return whole();
    }

    let polygon = Polygon::new(unwrapped, vec![]);
    let rings: Vec<LineString> = [-360., 0., 360.]
        .into_iter()
        .flat_map(|offset| {
            let west = (envelope.min.x - 1.).max(offset - 180.);
            let east = (envelope.max.x + 1.).min(offset + 180.);
            if west >= east {
                return Vec::new();
            }
            let window = Rect::new(
                Coord {
                    x: west,
                    y: envelope.min.y - 1.,
                },
                Coord {
                    x: east,
                    y: envelope.max.y + 1.,
                },
            );
            polygon
                .intersection(&window.to_polygon())
                .translate(-offset, 0.)
                .into_iter()
                .map(|piece| piece.into_inner().0)
                .collect()
        })
        .collect();
    if rings.is_empty() {
        return whole();
    }

    let span = envelope.max.x - envelope.min.x;
    let (west, east) = if span >= 360. {
        (-180., 180.)
    } else {
        (wrap_longitude(envelope.min.x), wrap_longitude(envelope.max.x))
    };
    Split {
        rings,
        bbox: BoundingBox {
            min: Coord {
                x: west,
                y: envelope.min.y,
            },
            max: Coord {
                x: east,
                y: envelope.max.y,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn crossing_ring() -> LineString {
        LineString::from(vec![
            (179., 10.),
            (-179., 10.),
            (-179., 0.),
            (179., 0.),
            (179., 10.),
        ])
    }

    #[rstest]
    fn ring_within_range_is_untouched() {
        let ring = LineString::from(vec![(10., 45.), (11., 45.), (11., 44.), (10., 44.), (10., 45.)]);
        let split = split(&ring);
        assert_eq!(split.rings, vec![ring]);
        assert_eq!(split.bbox.to_array(), [10., 44., 11., 45.]);
    }

    #[rstest]
    fn crossing_ring_is_cut_in_two() {
        let split = split(&crossing_ring());
        assert_eq!(split.rings.len(), 2);
        for ring in &split.rings {
            assert_eq!(ring.0.first(), ring.0.last());
            for coord in ring.coords() {
                assert!((-180. - 1e-6..=180. + 1e-6).contains(&coord.x), "{coord:?}");
            }
        }
        let wests: Vec<f64> = split
            .rings
            .iter()
            .map(|ring| ring.coords().map(|c| c.x).fold(f64::INFINITY, f64::min))
            .collect();
        assert!(wests.iter().any(|west| (west - 179.).abs() < 1e-6));
        assert!(wests.iter().any(|west| (west + 180.).abs() < 1e-6));
    }

    #[rstest]
    fn crossing_bbox_runs_west_to_east() {
        assert_eq!(split(&crossing_ring()).bbox.to_array(), [179., 0., -179., 10.]);
    }

    #[rstest]
    #[case(181., -179.)]
    #[case(-181., 179.)]
    #[case(540., -180.)]
    #[case(12., 12.)]
    fn wraps_longitudes(#[case] lon: f64, #[case] expected: f64) {
        assert_eq!(wrap_longitude(lon), expected);
    }

    #[rstest]
    fn polar_ring_is_left_alone() {
        let ring = LineString::from(vec![
            (0., 80.),
            (120., 80.),
            (-120., 80.),
            (0., 80.),
        ]);
        assert_eq!(split(&ring).rings, vec![ring]);
    }
}
