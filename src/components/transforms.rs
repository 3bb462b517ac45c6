use geo::{AffineTransform, Coord};
use shrinkwraprs::Shrinkwrap;

/// Pixel to native CRS affine transform.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(AffineTransform);

impl GeoTransform {
    /// Coefficients in `(a, b, c, d, e, f)` order, `c`/`f` being the offsets.
    pub fn new(a: f64, b: f64, xoff: f64, d: f64, e: f64, yoff: f64) -> Self {
        Self(AffineTransform::new(a, b, xoff, d, e, yoff))
    }

    pub fn from_gdal(gdal_transform: [f64; 6]) -> Self {
        Self::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        )
    }

    pub fn coefficients(&self) -> [f64; 6] {
        [
            self.a(),
            self.b(),
            self.xoff(),
            self.d(),
            self.e(),
            self.yoff(),
        ]
    }

    /// Coefficients padded with the `[0, 0, 1]` perspective row.
    pub fn to_matrix(&self) -> [f64; 9] {
        let [a, b, c, d, e, f] = self.coefficients();
        [a, b, c, d, e, f, 0., 0., 1.]
    }

    /// Least squares fit through ground control points.
    ///
    /// Each point is `(pixel, line, x, y)`. `None` when the points do not
    /// span an area.
    pub fn from_gcps(points: &[(f64, f64, f64, f64)]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let n = points.len() as f64;
        let mean = |value: fn(&(f64, f64, f64, f64)) -> f64| points.iter().map(value).sum::<f64>() / n;
        let (mp, ml) = (mean(|point| point.0), mean(|point| point.1));
        let (mx, my) = (mean(|point| point.2), mean(|point| point.3));

        let (mut spp, mut sll, mut spl) = (0., 0., 0.);
        let (mut spx, mut slx, mut spy, mut sly) = (0., 0., 0., 0.);
        for &(p, l, x, y) in points {
            let (p, l, x, y) = (p - mp, l - ml, x - mx, y - my);
            spp += p * p;
            sll += l * l;
            spl += p * l;
            spx += p * x;
            slx += l * x;
            spy += p * y;
            sly += l * y;
        }
        let det = spp * sll - spl * spl;
        if det <= f64::EPSILON * spp * sll {
            return None;
        }
        let a = (spx * sll - slx * spl) / det;
        let b = (slx * spp - spx * spl) / det;
        let d = (spy * sll - sly * spl) / det;
        let e = (sly * spp - spy * spl) / det;
        let c = mx - a * mp - b * ml;
        let f = my - d * mp - e * ml;
        Some(Self::new(a, b, c, d, e, f))
    }

    /// Native coordinates of pixel corner `(col, row)`.
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> Coord {
        self.0.apply(Coord { x: col, y: row })
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(1., 0., 0., 0., 1., 0.)
    }
}
