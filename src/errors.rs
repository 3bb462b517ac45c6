use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RioStacError>;

#[derive(thiserror::Error, Debug)]
pub enum RioStacError {
    #[error("could not open {source_path:?} as a raster dataset")]
    UnreadableSource {
        source_path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },
    #[error("{source_path:?} has no usable coordinate reference system")]
    UndefinedCrs {
        source_path: PathBuf,
        #[source]
        source: Option<proj::ProjCreateError>,
    },
    #[error(transparent)]
    ProjError(#[from] proj::ProjError),
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RioStacError {
    pub fn undefined_crs(source_path: impl Into<PathBuf>) -> Self {
        Self::UndefinedCrs {
            source_path: source_path.into(),
            source: None,
        }
    }
}

/// Invalid caller input, always reported before anything is written.
#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("invalid syntax for KEY=VALUE argument: {0:?}")]
    MalformedKeyValue(String),
    #[error("private property {key:?} supplied without enabling private data")]
    PrivateDataDisabled { key: String },
    #[error("when provided, '_private' must be a JSON object")]
    PrivateNotObject,
    #[error("{source_path:?} has {bands} bands but {statistics} band statistics")]
    BandCountMismatch {
        source_path: PathBuf,
        bands: usize,
        statistics: usize,
    },
    #[error("could not parse datetime {input:?}")]
    InvalidDatetime { input: String },
    #[error("item needs either `datetime` or both `start_datetime` and `end_datetime`")]
    MissingTemporal,
    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),
    #[error("input {0:?} is a directory, did you mean to use `--recursive`?")]
    DirectoryInput(PathBuf),
    #[error("no files in {0:?} match the requested patterns")]
    NoMatchingFiles(PathBuf),
    #[error("no georeferenced raster found in {0:?} to derive the item geometry")]
    NoPrimaryDataset(PathBuf),
    #[error("invalid file pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("unknown media type {0:?}")]
    UnknownMediaType(String),
}
