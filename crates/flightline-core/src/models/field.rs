use serde::{Deserialize, Deserializer, Serialize};

/// Input type of a custom roster field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Date,
    Number,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::Number => "number",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            FieldType::Text => FieldType::Date,
            FieldType::Date => FieldType::Number,
            FieldType::Number => FieldType::Text,
        }
    }
}

// Browsers accept more input types than we render; anything else is text.
impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(match value.as_str() {
            "date" => FieldType::Date,
            "number" => FieldType::Number,
            _ => FieldType::Text,
        })
    }
}

/// Administrator-defined extra field. Values live in each member's `customData`
/// keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CustomField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(rename = "showOnCard", default)]
    pub show_on_card: bool,
}

impl CustomField {
    /// Normalize whatever the database holds at the fields path into a list.
    ///
    /// The Realtime Database returns arrays with holes as index-keyed objects
    /// and a missing path as `null`; all of those collapse to a plain list.
    pub fn list_from_value(value: serde_json::Value) -> Vec<CustomField> {
        let entries: Vec<serde_json::Value> = match value {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            _ => Vec::new(),
        };

        entries
            .into_iter()
            .filter(|v| !v.is_null())
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()
    }
}
