use serde::Deserialize;
use serde_json::Value;

use super::{attach_nested, nullable_vec, Entity, Property};

/// Organização (pessoa jurídica) do CRM
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Organization {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// INN (identificação fiscal)
    #[serde(default)]
    pub inn: Option<String>,
    #[serde(rename = "custom_properties", default, deserialize_with = "nullable_vec")]
    pub properties: Vec<Property>,
    #[serde(skip)]
    raw: Value,
}

impl Entity for Organization {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn attach_raw(&mut self, raw: Value) {
        attach_nested(&mut self.properties, &raw, "custom_properties");
        self.raw = raw;
    }
}
