mod directory;

use std::path::Path;

use chrono::Utc;
use log::{debug, info, warn};

use crate::{
    components::{bounds::require_georeference, DatasetFacts, Footprint, RasterAccess},
    config::ItemConfig,
    crs_geo::Reprojector,
    errors::{ConfigurationError, Result},
    extensions::{self, ExtensionOutput},
    item::{Asset, Assets, Item},
    properties::{has_manual_range, parse_datetime, PropertyLayers, Temporal},
};

/// Turns dataset facts into items.
///
/// Raster access and reprojection are injected so the same assembly runs
/// against GDAL/proj or in-memory stand-ins.
#[derive(Debug)]
pub struct ItemAssembler<A: RasterAccess, R: Reprojector> {
    config: ItemConfig,
    access: A,
    reprojector: R,
}

impl<A: RasterAccess, R: Reprojector> ItemAssembler<A, R> {
    pub fn new(config: ItemConfig, access: A, reprojector: R) -> Self {
        Self {
            config,
            access,
            reprojector,
        }
    }

    pub fn config(&self) -> &ItemConfig {
        &self.config
    }

    /// Single file or directory item, depending on the configuration.
    pub fn run(&self, input: &Path) -> Result<Item> {
        match &self.config.directory {
            Some(_) => self.create_directory_item(input),
            None if input.is_dir() => Err(ConfigurationError::DirectoryInput(input.to_path_buf()))?,
            None => self.create_item(input),
        }
    }

    /// Item with one asset describing `source`.
    pub fn create_item(&self, source: &Path) -> Result<Item> {
        let facts = self.access.facts(source)?;
        let extensions = extensions::assemble(&facts, &self.config.flags)?;

        let asset_options = &self.config.asset;
        let mut asset = Asset::new(
            asset_options
                .href
                .clone()
                .unwrap_or_else(|| source.to_string_lossy().into_owned()),
        )
        .with_media_type(asset_options.media_type.resolve(&facts))
        .with_roles(asset_options.roles.iter().cloned());
        asset.bands = extensions.bands.clone();

        let id = self.config.id.clone().unwrap_or_else(|| {
            source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.to_string_lossy().into_owned())
        });
        let mut assets = Assets::default();
        assets.insert(asset_options.name.clone(), asset);

        let schemas = extensions.schemas.clone();
        self.compose(&facts, extensions, id, assets, schemas)
    }

    /// Final record around the `primary` dataset.
    fn compose(
        &self,
        primary: &DatasetFacts,
        extensions: ExtensionOutput,
        id: String,
        assets: Assets,
        schemas: Vec<&'static str>,
    ) -> Result<Item> {
        require_georeference(primary)?;
        let footprint = Footprint::wgs84(
            primary,
            self.config.densify,
            self.config.precision,
            &self.reprojector,
        )?;

        let mut computed = extensions.properties;
        if let Some(platform) = primary.satellite_id() {
            computed.insert("platform".into(), platform.into());
        }
        let properties = PropertyLayers {
            computed,
            temporal: self.temporal(primary),
            manual: self.config.properties.clone(),
            private: self.config.private.clone(),
        }
        .merge()?;

        let mut item = Item::new(id, &footprint, properties);
        item.extend_extensions(&self.config.extensions);
        item.extend_extensions(schemas);
        item.links.extend(self.config.links.iter().cloned());
        if let Some(collection) = &self.config.collection {
            item.set_collection(&collection.id, collection.url.as_deref());
        }
        item.assets = assets;
        info!(
            "assembled item {:?} with {} assets from {:?}",
            item.id,
            item.assets.len(),
            primary.source_path
        );
        Ok(item)
    }

    /// Configured datetime, else the acquisition tag, else now.
    ///
    /// `None` when the manual properties already carry a full range.
    fn temporal(&self, facts: &DatasetFacts) -> Option<Temporal> {
        if let Some(temporal) = self.config.temporal {
            return Some(temporal);
        }
        if has_manual_range(&self.config.properties) {
            return None;
        }
        let acquired = facts.acquisition_time().and_then(|tag| {
            parse_datetime(tag)
                .map_err(|err| warn!("ignoring acquisition time of {:?}: {err}", facts.source_path))
                .ok()
        });
        Some(Temporal::Instant(acquired.unwrap_or_else(|| {
            debug!("no acquisition time for {:?}, using now", facts.source_path);
            Utc::now()
        })))
    }
}
