use serde_json::{json, Value};

use crate::{
    components::{BandFacts, DatasetFacts},
    errors::Result,
    extensions::ExtensionOutput,
};

/// Controlled vocabulary of `eo:common_name`.
pub const EO_COMMON_NAMES: [&str; 20] = [
    "pan",
    "coastal",
    "blue",
    "green",
    "green05",
    "yellow",
    "red",
    "rededge",
    "rededge071",
    "rededge075",
    "rededge078",
    "nir",
    "nir08",
    "nir09",
    "cirrus",
    "swir16",
    "swir22",
    "lwir",
    "lwir11",
    "lwir12",
];

/// Map a band label onto the vocabulary, `None` rather than a guess.
pub fn common_name(label: &str) -> Option<&'static str> {
    let normalised: String = label
        .trim()
        .to_lowercase()
        .chars()
        .filter(|ch| *ch != ' ')
        .collect();
    let normalised = match normalised.as_str() {
        "gray" | "grey" => "pan",
        other => other,
    };
    EO_COMMON_NAMES
        .iter()
        .find(|name| **name == normalised)
        .copied()
}

fn imagery_number(band: &BandFacts, facts: &DatasetFacts, key: &str) -> Option<f64> {
    // Band tags first, then the dataset wide imagery domain.
    let tags = if band.imagery.is_empty() {
        &facts.imagery
    } else {
        &band.imagery
    };
    tags.get(key)?.trim().parse().ok()
}

/// Integral values are written as integers.
fn cloud_cover_value(cloud_cover: f64) -> Value {
    if cloud_cover.fract() == 0. && cloud_cover.abs() < i64::MAX as f64 {
        json!(cloud_cover as i64)
    } else {
        json!(cloud_cover)
    }
}

/// Cloud cover and band naming.
pub(super) fn build(facts: &DatasetFacts, output: &mut ExtensionOutput) -> Result<bool> {
    let mut relevant = false;
    if let Some(cloud_cover) = facts.cloud_cover() {
        output
            .properties
            .insert("eo:cloud_cover".into(), cloud_cover_value(cloud_cover));
        relevant = true;
    }
    if facts.band_count() == 0 {
        return Ok(relevant);
    }

    let bands = output.bands_mut(facts.band_count());
    for (descriptor, band) in bands.iter_mut().zip(&facts.bands) {
        let description = band.description.as_deref();
        let color = band.color.as_deref();
        descriptor.description = description.or(color).map(str::to_string);
        descriptor.common_name = [description, color]
            .into_iter()
            .flatten()
            .find_map(common_name)
            .map(str::to_string);
        descriptor.center_wavelength = imagery_number(band, facts, "CENTRAL_WAVELENGTH_UM");
        descriptor.full_width_half_max = imagery_number(band, facts, "FWHM_UM");
        relevant |= descriptor.description.is_some()
            || descriptor.center_wavelength.is_some()
            || descriptor.full_width_half_max.is_some();
    }
    Ok(relevant)
}
