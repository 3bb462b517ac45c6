use log::warn;
use std::{fmt, path::Path, str::FromStr};

use crate::{
    components::DatasetFacts,
    errors::{ConfigurationError, RioStacError},
};

/// Media types an asset can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Cog,
    GeoTiff,
    Tiff,
    Jpeg2000,
    Jpeg,
    Png,
    Hdf,
    Hdf5,
    NetCdf,
    Json,
    GeoJson,
    GeoPackage,
    Xml,
    Text,
    Html,
}

const TOKENS: [(&str, MediaType); 15] = [
    ("COG", MediaType::Cog),
    ("GEOTIFF", MediaType::GeoTiff),
    ("TIFF", MediaType::Tiff),
    ("JPEG2000", MediaType::Jpeg2000),
    ("JPEG", MediaType::Jpeg),
    ("PNG", MediaType::Png),
    ("HDF", MediaType::Hdf),
    ("HDF5", MediaType::Hdf5),
    ("NETCDF", MediaType::NetCdf),
    ("JSON", MediaType::Json),
    ("GEOJSON", MediaType::GeoJson),
    ("GEOPACKAGE", MediaType::GeoPackage),
    ("XML", MediaType::Xml),
    ("TEXT", MediaType::Text),
    ("HTML", MediaType::Html),
];

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cog => "image/tiff; application=geotiff; profile=cloud-optimized",
            Self::GeoTiff => "image/tiff; application=geotiff",
            Self::Tiff => "image/tiff",
            Self::Jpeg2000 => "image/jp2",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Hdf => "application/x-hdf",
            Self::Hdf5 => "application/x-hdf5",
            Self::NetCdf => "application/netcdf",
            Self::Json => "application/json",
            Self::GeoJson => "application/geo+json",
            Self::GeoPackage => "application/geopackage+sqlite3",
            Self::Xml => "application/xml",
            Self::Text => "text/plain",
            Self::Html => "text/html",
        }
    }

    /// Known token names, as accepted on the command line.
    pub fn tokens() -> impl Iterator<Item = &'static str> {
        TOKENS.iter().map(|(token, _)| *token)
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        let media_type = match extension.as_str() {
            "tif" | "tiff" => Self::Tiff,
            "jp2" | "j2k" => Self::Jpeg2000,
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "hdf" | "hdf4" | "h4" => Self::Hdf,
            "h5" | "hdf5" | "he5" => Self::Hdf5,
            "nc" => Self::NetCdf,
            "json" => Self::Json,
            "geojson" => Self::GeoJson,
            "gpkg" => Self::GeoPackage,
            "xml" => Self::Xml,
            "txt" => Self::Text,
            "html" | "htm" => Self::Html,
            _ => return None,
        };
        Some(media_type)
    }

    fn from_driver(driver: &str, georeferenced: bool) -> Option<Self> {
        let media_type = match driver {
            "GTiff" | "COG" if georeferenced => Self::GeoTiff,
            "GTiff" | "COG" => Self::Tiff,
            "JP2ECW" | "JP2KAK" | "JP2LURA" | "JP2MrSID" | "JP2OpenJPEG" | "JPEG2000" => {
                Self::Jpeg2000
            }
            "HDF4" | "HDF4Image" => Self::Hdf,
            "HDF5" | "HDF5Image" => Self::Hdf5,
            "netCDF" => Self::NetCdf,
            "JPEG" => Self::Jpeg,
            "PNG" => Self::Png,
            _ => return None,
        };
        Some(media_type)
    }

    /// Detect the media type of an opened raster.
    ///
    /// Cloud optimized signature, then TIFF and the other raster drivers,
    /// then the file extension.
    pub fn detect(facts: &DatasetFacts) -> Option<Self> {
        let is_cog = facts
            .layout
            .as_deref()
            .is_some_and(|layout| layout.eq_ignore_ascii_case("COG"));
        let detected = if is_cog {
            Some(Self::Cog)
        } else {
            Self::from_driver(&facts.driver, facts.is_georeferenced())
                .or_else(|| Self::from_extension(&facts.source_path))
        };
        if detected.is_none() {
            warn!(
                "could not determine the media type of {:?} ({} driver)",
                facts.source_path, facts.driver
            );
        }
        detected
    }

    /// Non raster companions such as metadata documents.
    pub fn is_sidecar(&self) -> bool {
        matches!(
            self,
            Self::Json | Self::GeoJson | Self::Xml | Self::Text | Self::Html
        )
    }
}

impl FromStr for MediaType {
    type Err = RioStacError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        TOKENS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token.trim()))
            .map(|(_, media_type)| *media_type)
            .ok_or_else(|| ConfigurationError::UnknownMediaType(token.to_string()).into())
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for MediaType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// How asset media types are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaTypeChoice {
    #[default]
    Auto,
    Fixed(MediaType),
}

impl MediaTypeChoice {
    pub fn resolve(&self, facts: &DatasetFacts) -> Option<MediaType> {
        match self {
            Self::Auto => MediaType::detect(facts),
            Self::Fixed(media_type) => Some(*media_type),
        }
    }
}

impl FromStr for MediaTypeChoice {
    type Err = RioStacError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            token.parse().map(Self::Fixed)
        }
    }
}
