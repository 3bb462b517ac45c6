use std::path::{Component, Path, PathBuf};

use itertools::Itertools;
use log::{debug, info};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::{
    assembler::ItemAssembler,
    components::{DatasetFacts, RasterAccess},
    config::DirectoryOptions,
    crs_geo::Reprojector,
    errors::{ConfigurationError, Result},
    extensions::{self, ExtensionOutput},
    item::{Asset, Assets, Item, MediaType},
};

/// How a directory entry is turned into an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    /// Companion document, never opened.
    Sidecar(MediaType),
    /// Quicklook picture, never opened.
    Quicklook,
    Raster,
}

impl FileKind {
    fn of(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.ends_with("ql.jpg") || name.ends_with("ql.jpeg") {
            return Self::Quicklook;
        }
        if name.ends_with(".safe") {
            return Self::Sidecar(MediaType::Xml);
        }
        match MediaType::from_extension(path) {
            Some(media_type) if media_type.is_sidecar() => Self::Sidecar(media_type),
            _ => Self::Raster,
        }
    }
}

/// Outcome of the per file stage.
#[derive(Debug)]
struct ProcessedFile {
    relative: String,
    asset: Asset,
    /// Set for `data` rasters, the candidates for the item geometry.
    primary: Option<(DatasetFacts, ExtensionOutput)>,
    schemas: Vec<&'static str>,
}

/// Selected files, relative to `directory`, in lexicographic order.
fn enumerate(directory: &Path, options: &DirectoryOptions) -> Result<Vec<String>> {
    let mut selected = Vec::new();
    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() || entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let relative = relative_path(directory, entry.path());
        if options.selects(&relative) {
            selected.push(relative);
        } else {
            debug!("{relative} matches no pattern");
        }
    }
    selected.sort();
    Ok(selected)
}

/// `/` separated path below `directory`.
fn relative_path(directory: &Path, path: &Path) -> String {
    path.strip_prefix(directory)
        .unwrap_or(path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .join("/")
}

/// Asset key: file stem, then file name, then the relative path.
fn asset_key(assets: &Assets, relative: &str) -> String {
    let path = Path::new(relative);
    let stem = path.file_stem().map(|stem| stem.to_string_lossy().into_owned());
    let name = path.file_name().map(|name| name.to_string_lossy().into_owned());
    [stem, name]
        .into_iter()
        .flatten()
        .find(|candidate| !assets.contains_key(candidate))
        .unwrap_or_else(|| relative.to_string())
}

impl<A: RasterAccess, R: Reprojector> ItemAssembler<A, R> {
    /// Item with one asset per selected file of `directory`.
    ///
    /// Geometry and item properties come from the first data raster; any
    /// unreadable raster aborts the whole item.
    pub fn create_directory_item(&self, directory: &Path) -> Result<Item> {
        if !directory.is_dir() {
            Err(ConfigurationError::NotADirectory(directory.to_path_buf()))?
        }
        let options = self.config.directory.clone().unwrap_or_default();
        let files = enumerate(directory, &options)?;
        if files.is_empty() {
            Err(ConfigurationError::NoMatchingFiles(directory.to_path_buf()))?
        }
        info!("processing {} files of {directory:?}", files.len());

        let processed = files
            .par_iter()
            .map(|relative| self.process_file(directory, relative))
            .collect::<Result<Vec<_>>>()?;

        let mut assets = Assets::default();
        let mut schemas = Vec::new();
        let mut primary = None;
        for file in processed {
            let key = asset_key(&assets, &file.relative);
            debug!("{} becomes asset {key:?} with roles {:?}", file.relative, file.asset.roles);
            assets.insert(key, file.asset);
            schemas.extend(file.schemas);
            if primary.is_none() {
                primary = file.primary;
            }
        }
        let (facts, extensions) =
            primary.ok_or_else(|| ConfigurationError::NoPrimaryDataset(directory.to_path_buf()))?;
        info!("item geometry taken from {:?}", facts.source_path);

        let id = self.config.id.clone().unwrap_or_else(|| directory_name(directory));
        self.compose(&facts, extensions, id, assets, schemas)
    }

    fn process_file(&self, directory: &Path, relative: &str) -> Result<ProcessedFile> {
        let path = directory.join(relative);
        let asset = Asset::new(relative);
        let kind = FileKind::of(&path);
        let processed = match kind {
            FileKind::Sidecar(media_type) => ProcessedFile {
                relative: relative.to_string(),
                asset: asset.with_media_type(Some(media_type)).with_roles(["metadata"]),
                primary: None,
                schemas: Vec::new(),
            },
            FileKind::Quicklook => ProcessedFile {
                relative: relative.to_string(),
                asset: thumbnail(asset.with_media_type(Some(MediaType::Jpeg))),
                primary: None,
                schemas: Vec::new(),
            },
            FileKind::Raster => self.process_raster(&path, relative, asset)?,
        };
        debug!("{relative} classified as {kind:?}");
        Ok(processed)
    }

    fn process_raster(&self, path: &Path, relative: &str, asset: Asset) -> Result<ProcessedFile> {
        let facts = self.access.facts(path)?;
        let mut asset = asset.with_media_type(self.config.asset.media_type.resolve(&facts));

        if !facts.is_georeferenced() && facts.band_count() <= 3 {
            return Ok(ProcessedFile {
                relative: relative.to_string(),
                asset: thumbnail(asset),
                primary: None,
                schemas: Vec::new(),
            });
        }

        let extensions = extensions::assemble(&facts, &self.config.flags)?;
        asset.roles = vec!["data".into()];
        asset.fields = extensions.asset_fields.clone();
        asset.bands = extensions.bands.clone();
        Ok(ProcessedFile {
            relative: relative.to_string(),
            asset,
            schemas: extensions.schemas.clone(),
            primary: Some((facts, extensions)),
        })
    }
}

fn thumbnail(asset: Asset) -> Asset {
    let mut asset = asset.with_roles(["thumbnail", "overview"]);
    asset.title = Some("thumbnail".into());
    asset
}

fn directory_name(directory: &Path) -> String {
    directory
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .or_else(|| {
            directory
                .canonicalize()
                .ok()
                .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| PathBuf::from(directory).to_string_lossy().into_owned())
}
