use std::{fs, io::Write, path::PathBuf};

use clap::Parser;
use log::info;

use rio_stac::{create_stac_item, ItemOptions, Result};

/// Create a STAC Item for a raster dataset.
#[derive(Parser, Debug)]
#[command(name = "rio-stac", version, about, long_about = None)]
struct Cli {
    /// Raster file, or directory with `--recursive`.
    input: PathBuf,

    /// Date and time of the assets in UTC, or a `start/end` range.
    #[arg(short, long)]
    datetime: Option<String>,

    /// STAC extension URL the item implements.
    #[arg(short, long = "extension")]
    extensions: Vec<String>,

    /// Collection id the item belongs to.
    #[arg(short, long)]
    collection: Option<String>,

    /// Link to the STAC collection.
    #[arg(long)]
    collection_url: Option<String>,

    /// Additional property, JSON values allowed for nested data.
    #[arg(short, long = "property", value_name = "NAME=VALUE")]
    properties: Vec<String>,

    /// Property nested under `_private`.
    #[arg(short = 'P', long = "private-property", value_name = "NAME=VALUE")]
    private_properties: Vec<String>,

    /// Allow the `_private` entry in the item.
    #[arg(long)]
    with_private_data: bool,

    /// Item id, defaults to the input name.
    #[arg(long)]
    id: Option<String>,

    #[arg(short = 'n', long, default_value = "asset")]
    asset_name: String,

    /// Overwrite the asset href.
    #[arg(long)]
    asset_href: Option<String>,

    /// Asset media type token (e.g. COG, GEOTIFF) or `auto`.
    #[arg(long)]
    asset_mediatype: Option<String>,

    /// Skip the projection extension.
    #[arg(long)]
    without_proj: bool,

    /// Skip the raster extension and band statistics.
    #[arg(long)]
    without_raster: bool,

    /// Skip the eo extension.
    #[arg(long)]
    without_eo: bool,

    /// Larger rasters get approximate statistics.
    #[arg(long, default_value_t = 1024)]
    max_raster_size: usize,

    /// Points added on each edge of the footprint before reprojection.
    #[arg(long, default_value_t = 0)]
    densify_geom: usize,

    /// Round footprint coordinates to this number of decimals.
    #[arg(long)]
    geom_precision: Option<u32>,

    /// Extra link.
    #[arg(long = "link", value_name = "REL=HREF")]
    links: Vec<String>,

    /// Build one item from every matching file of the input directory.
    #[arg(short, long)]
    recursive: bool,

    /// Shell pattern selecting files in directory mode.
    #[arg(long = "pattern")]
    patterns: Vec<String>,

    /// GDAL configuration option.
    #[arg(long = "config", value_name = "NAME=VALUE")]
    gdal_config: Vec<String>,

    /// Output file, stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> ItemOptions {
        ItemOptions {
            datetime: self.datetime.clone(),
            extensions: self.extensions.clone(),
            collection: self.collection.clone(),
            collection_url: self.collection_url.clone(),
            properties: self.properties.clone(),
            private_properties: self.private_properties.clone(),
            with_private_data: self.with_private_data,
            id: self.id.clone(),
            asset_name: self.asset_name.clone(),
            asset_href: self.asset_href.clone(),
            asset_mediatype: self.asset_mediatype.clone(),
            with_proj: !self.without_proj,
            with_raster: !self.without_raster,
            with_eo: !self.without_eo,
            max_raster_size: self.max_raster_size,
            densify_geom: self.densify_geom,
            geom_precision: self.geom_precision,
            links: self.links.clone(),
            recursive: self.recursive,
            patterns: self.patterns.clone(),
            gdal_config: self.gdal_config.clone(),
            ..Default::default()
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let item = create_stac_item(&cli.input, &cli.options())?;
    let json = item.to_json()?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json)?;
            info!("wrote item {:?} to {path:?}", item.id);
        }
        None => writeln!(std::io::stdout().lock(), "{json}")?,
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err}");
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}
