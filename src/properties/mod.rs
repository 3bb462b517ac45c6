mod datetime;
mod value;

pub use datetime::{format_datetime, parse_datetime, Temporal};
pub use value::{parse_key_values, parse_value, split_key_value};

use serde_json::{Map, Value};

use crate::errors::{ConfigurationError, Result};

pub const PRIVATE_KEY: &str = "_private";

const TEMPORAL_KEYS: [&str; 3] = ["datetime", "start_datetime", "end_datetime"];

/// Item properties keyed by (possibly namespaced) name.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct PropertySet(Map<String, Value>);

impl PropertySet {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    fn has_value(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|value| !value.is_null())
    }

    fn layer(&mut self, layer: Map<String, Value>) {
        self.0.extend(layer);
    }
}

impl From<PropertySet> for Map<String, Value> {
    fn from(value: PropertySet) -> Self {
        value.0
    }
}

/// Property sources of one item, in increasing precedence.
#[derive(Debug, Clone, Default)]
pub struct PropertyLayers {
    /// Extension derived and other computed properties.
    pub computed: Map<String, Value>,
    pub temporal: Option<Temporal>,
    pub manual: Map<String, Value>,
    /// `Some` only when private data is enabled.
    pub private: Option<Map<String, Value>>,
}

impl PropertyLayers {
    /// Fold the layers into the final property set.
    ///
    /// Manual properties override computed ones, including the temporal keys.
    /// The result always resolves to `datetime` or a full range.
    pub fn merge(self) -> Result<PropertySet> {
        let mut properties = PropertySet::default();
        properties.layer(self.computed);
        if let Some(temporal) = self.temporal {
            properties.layer(temporal.to_properties());
        }

        let manual_datetime = self.manual.contains_key("datetime");
        let manual_range =
            self.manual.contains_key("start_datetime") || self.manual.contains_key("end_datetime");
        if manual_datetime && !manual_range {
            properties.0.remove("start_datetime");
            properties.0.remove("end_datetime");
        } else if manual_range && !manual_datetime {
            properties.0.remove("datetime");
        }
        properties.layer(self.manual);

        if let Some(private) = self.private {
            let mut nested = match properties.0.remove(PRIVATE_KEY) {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(existing)) => existing,
                Some(_) => Err(ConfigurationError::PrivateNotObject)?,
            };
            nested.extend(private);
            nested.entry("hidden").or_insert(Value::Bool(true));
            properties.0.insert(PRIVATE_KEY.into(), Value::Object(nested));
        } else if properties.contains_key(PRIVATE_KEY) {
            Err(ConfigurationError::PrivateDataDisabled {
                key: PRIVATE_KEY.into(),
            })?
        }

        let has_instant = properties.has_value(TEMPORAL_KEYS[0]);
        let has_range = properties.has_value(TEMPORAL_KEYS[1]) && properties.has_value(TEMPORAL_KEYS[2]);
        if !has_instant && !has_range {
            Err(ConfigurationError::MissingTemporal)?
        }
        Ok(properties)
    }
}

/// Whether the caller supplied a full range through manual properties.
pub fn has_manual_range(manual: &Map<String, Value>) -> bool {
    manual.contains_key("start_datetime") && manual.contains_key("end_datetime")
}
