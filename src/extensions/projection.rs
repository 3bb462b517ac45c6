use serde_json::{json, Value};

use crate::{
    components::{DatasetFacts, Footprint},
    errors::Result,
    extensions::ExtensionOutput,
};

/// `proj:*` fields in the dataset's own CRS.
pub(super) fn build(facts: &DatasetFacts, output: &mut ExtensionOutput) -> Result<bool> {
    let Some(crs) = facts.crs.as_ref().filter(|_| facts.is_georeferenced()) else {
        return Ok(false);
    };
    let footprint = Footprint::native(facts);

    let mut fields = vec![("proj:code", json!(crs.code))];
    if crs.code.is_none() {
        fields.push(("proj:wkt2", json!(crs.wkt)));
    }
    fields.extend([
        ("proj:bbox", json!(footprint.bbox())),
        ("proj:shape", json!([facts.height(), facts.width()])),
        ("proj:transform", json!(facts.transform.to_matrix())),
    ]);

    for (key, value) in fields {
        output.asset_fields.insert(key.into(), value.clone());
        output.properties.insert(key.into(), value);
    }
    output
        .properties
        .insert("proj:geometry".into(), json!(footprint.geometry()));
    Ok(true)
}
