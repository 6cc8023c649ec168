//! Modelos tipados da API Pachca
//!
//! Cada modelo é um snapshot imutável do recurso no momento da requisição e
//! guarda o payload bruto do servidor junto dos campos tipados (`raw()`), para
//! campos que ainda não foram modelados.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{PachcaError, PachcaResult};

pub mod client;
pub mod deal;
pub mod entity_type;
pub mod funnel;
pub mod message;
pub mod organization;
pub mod property;
pub mod task;
pub mod user;

pub use client::Client;
pub use deal::Deal;
pub use entity_type::EntityType;
pub use funnel::{Funnel, Stage};
pub use message::Message;
pub use organization::Organization;
pub use property::{Property, PropertyDataType, PropertyValues};
pub use task::{Task, TaskKind};
pub use user::User;

/// Modelo construído a partir de um objeto JSON da API
pub trait Entity: DeserializeOwned + Sized {
    /// Payload original, sem modificações
    fn raw(&self) -> &Value;

    /// Anexa o payload bruto (e o dos filhos aninhados) depois da desserialização
    #[doc(hidden)]
    fn attach_raw(&mut self, raw: Value);

    /// Constrói o modelo a partir do JSON bruto
    fn from_raw(raw: Value) -> PachcaResult<Self> {
        let mut entity = Self::deserialize(&raw)?;
        entity.attach_raw(raw);
        Ok(entity)
    }

    /// Constrói uma lista de modelos a partir de um array JSON
    fn from_raw_list(raw: Value) -> PachcaResult<Vec<Self>> {
        match raw {
            Value::Array(items) => items.into_iter().map(Self::from_raw).collect(),
            other => Err(PachcaError::unexpected(format!(
                "expected a JSON array, got: {}",
                other
            ))),
        }
    }
}

/// Distribui os sub-objetos de `raw[key]` para os filhos já desserializados
pub(crate) fn attach_nested<T: Entity>(items: &mut [T], raw: &Value, key: &str) {
    if let Some(raw_items) = raw.get(key).and_then(Value::as_array) {
        for (item, raw_item) in items.iter_mut().zip(raw_items) {
            item.attach_raw(raw_item.clone());
        }
    }
}

/// Aceita inteiro ou string numérica (`"sort": "2"`)
pub(crate) fn int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
    }

    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(value) => Ok(value),
        IntOrString::Str(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Referência a outro recurso: `44`, `"44"`, `{"id": 44}` ou `null`
pub(crate) fn optional_id_ref<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRef {
        Int(i64),
        Str(String),
        Object { id: i64 },
    }

    match Option::<IdRef>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdRef::Int(id)) | Some(IdRef::Object { id }) => Ok(Some(id)),
        Some(IdRef::Str(text)) => text.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// `null` vira lista vazia
pub(crate) fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse de timestamps ISO-8601 devolvidos pela API
pub(crate) fn parse_timestamp(text: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}
