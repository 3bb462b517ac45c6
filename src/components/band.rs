use crate::components::Metadata;

/// Per band tags as reported by the raster access layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandFacts {
    pub description: Option<String>,
    /// Colour interpretation name, e.g. `Red` or `Gray`.
    pub color: Option<String>,
    pub data_type: String,
    pub nodata: Option<f64>,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
    pub unit: Option<String>,
    /// `IMAGERY` domain tags of the band.
    pub imagery: Metadata,
}

impl BandFacts {
    pub fn new(data_type: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Statistics {
    pub mean: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub stddev: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Histogram {
    /// Number of bucket edges.
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub buckets: Vec<u64>,
}

/// Statistics of one band, either part may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandStatistics {
    pub statistics: Option<Statistics>,
    pub histogram: Option<Histogram>,
}
