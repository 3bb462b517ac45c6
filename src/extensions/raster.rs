use crate::{
    components::DatasetFacts,
    errors::Result,
    extensions::ExtensionOutput,
    item::NoData,
};

const DEFAULT_SAMPLING: &str = "point";

/// Per band data type, scaling, sampling and statistics.
///
/// Statistics are copied as reported; a band without them simply has none.
pub(super) fn build(facts: &DatasetFacts, output: &mut ExtensionOutput) -> Result<bool> {
    if facts.band_count() == 0 {
        return Ok(false);
    }
    let sampling = facts
        .area_or_point()
        .unwrap_or_else(|| DEFAULT_SAMPLING.to_string());
    let pairs = facts.band_pairs()?;
    let bands = output.bands_mut(facts.band_count());
    for (descriptor, (band, statistics)) in bands.iter_mut().zip(pairs) {
        descriptor.data_type = Some(band.data_type.clone());
        descriptor.nodata = band.nodata.map(NoData);
        descriptor.scale = Some(band.scale.unwrap_or(1.));
        descriptor.offset = Some(band.offset.unwrap_or(0.));
        descriptor.sampling = Some(sampling.clone());
        descriptor.unit = band.unit.clone();
        descriptor.statistics = statistics.statistics;
        descriptor.histogram = statistics.histogram.clone();
    }
    Ok(true)
}
