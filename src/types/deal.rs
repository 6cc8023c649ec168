use serde::Deserialize;
use serde_json::Value;

use super::{attach_nested, nullable_vec, optional_id_ref, parse_timestamp, Entity, Property};

/// Negócio (deal) em uma etapa de funil
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Deal {
    pub id: i64,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "optional_id_ref")]
    pub client_id: Option<i64>,
    /// Chave antiga `client` (id ou objeto); vale só quando falta `client_id`
    #[serde(rename = "client", default, deserialize_with = "optional_id_ref")]
    legacy_client: Option<i64>,
    pub stage_id: i64,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "custom_properties", default, deserialize_with = "nullable_vec")]
    pub properties: Vec<Property>,
    #[serde(skip)]
    raw: Value,
}

impl Deal {
    pub fn created_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

impl Entity for Deal {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn attach_raw(&mut self, raw: Value) {
        attach_nested(&mut self.properties, &raw, "custom_properties");
        if self.client_id.is_none() {
            self.client_id = self.legacy_client;
        }
        self.raw = raw;
    }
}
