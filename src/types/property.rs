//! Campos personalizados (custom properties) de Organization/Client/Deal

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;
use serde_json::Value;

use super::Entity;
use crate::error::{PachcaError, PachcaResult};

/// Campo personalizado definido pelo workspace
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Property {
    pub id: i64,
    pub name: String,
    /// Tag do tipo de dado, exatamente como veio da API
    pub data_type: String,
    /// Presente apenas quando o campo vem no contexto de uma entidade
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(skip)]
    raw: Value,
}

impl Property {
    pub fn kind(&self) -> PropertyDataType {
        PropertyDataType::parse(&self.data_type)
    }
}

impl Entity for Property {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn attach_raw(&mut self, raw: Value) {
        self.raw = raw;
    }
}

/// Tipos de dado conhecidos para campos personalizados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyDataType {
    String,
    Number,
    Date,
    Link,
    Email,
    Phone,
    /// Tipo que o cliente ainda não conhece; não é validado
    Other,
}

impl PropertyDataType {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Self::String,
            "number" | "integer" | "float" => Self::Number,
            "date" | "datetime" => Self::Date,
            "link" | "url" => Self::Link,
            "email" => Self::Email,
            "phone" => Self::Phone,
            _ => Self::Other,
        }
    }

    /// Verifica se o valor JSON é compatível com o tipo declarado (`null` limpa o campo)
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            Self::Number => value.is_number(),
            Self::String | Self::Date | Self::Link | Self::Email | Self::Phone => value.is_string(),
            Self::Other => true,
        }
    }
}

/// Mapeamento ordenado `id do campo → valor`, enviado como
/// `custom_properties: [{"id": .., "value": ..}, ...]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyValues {
    entries: Vec<(i64, Value)>,
}

impl PropertyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrói a partir de pares com IDs em texto, convertendo-os para inteiro
    ///
    /// ```
    /// use pachca::types::PropertyValues;
    ///
    /// let props = PropertyValues::from_pairs([("12", "Moscow"), ("15", "B2B")]).unwrap();
    /// assert_eq!(props.len(), 2);
    /// assert!(PropertyValues::from_pairs([("abc", "x")]).is_err());
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> PachcaResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut values = Self::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            let id = key.trim().parse::<i64>().map_err(|_| {
                PachcaError::validation(format!(
                    "custom property id must be an integer, got '{}'",
                    key
                ))
            })?;
            values.insert(id, value);
        }
        Ok(values)
    }

    /// Insere ou substitui o valor de um campo, mantendo a posição original
    pub fn insert(&mut self, id: i64, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((id, value)),
        }
    }

    /// Versão builder de [`insert`](Self::insert)
    pub fn with(mut self, id: i64, value: impl Into<Value>) -> Self {
        self.insert(id, value);
        self
    }

    pub fn get(&self, id: i64) -> Option<&Value> {
        self.entries.iter().find(|(existing, _)| *existing == id).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &Value)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    /// Valida IDs e tipos contra os campos declarados do workspace
    ///
    /// Não faz requisição; com um cliente em mãos use
    /// `PachcaClient::validate_properties`, que busca os campos antes.
    pub fn validate_against(&self, known: &[Property]) -> PachcaResult<()> {
        for (id, value) in self.iter() {
            let property = known.iter().find(|p| p.id == id).ok_or_else(|| {
                PachcaError::validation(format!("unknown custom property id {}", id))
            })?;

            if !property.kind().accepts(value) {
                return Err(PachcaError::validation(format!(
                    "custom property '{}' (#{}) expects {}, got {}",
                    property.name, id, property.data_type, value
                )));
            }
        }
        Ok(())
    }
}

impl Serialize for PropertyValues {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct Entry<'a>(i64, &'a Value);

        impl Serialize for Entry<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut state = serializer.serialize_struct("CustomProperty", 2)?;
                state.serialize_field("id", &self.0)?;
                state.serialize_field("value", self.1)?;
                state.end()
            }
        }

        serializer.collect_seq(self.entries.iter().map(|(id, value)| Entry(*id, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn known() -> Vec<Property> {
        Property::from_raw_list(json!([
            {"id": 1, "name": "Город", "data_type": "string"},
            {"id": 2, "name": "Бюджет", "data_type": "number"},
            {"id": 3, "name": "Extra", "data_type": "mystery"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_property_from_raw_with_and_without_value() {
        let raw = json!({"id": 5, "name": "Город", "data_type": "string", "value": "Казань"});
        let prop = Property::from_raw(raw.clone()).unwrap();
        assert_eq!(prop.value, Some(json!("Казань")));
        assert_eq!(prop.raw(), &raw);

        let prop = Property::from_raw(json!({"id": 5, "name": "Город", "data_type": "string"})).unwrap();
        assert!(prop.value.is_none());
        assert_eq!(prop.kind(), PropertyDataType::String);
    }

    #[test]
    fn test_serialize_keeps_order() {
        let values = PropertyValues::new().with(9, "b").with(3, 10).with(9, "c");
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            json!([{"id": 9, "value": "c"}, {"id": 3, "value": 10}])
        );
    }

    #[test]
    fn test_from_pairs_coerces_ids() {
        let values = PropertyValues::from_pairs([(" 42", json!(true))]).unwrap();
        assert_eq!(values.get(42), Some(&json!(true)));

        let err = PropertyValues::from_pairs([("4x2", "v")]).unwrap_err();
        assert!(err.to_string().contains("must be an integer"));
    }

    #[test]
    fn test_validate_against() {
        let props = known();
        assert!(PropertyValues::new().with(1, "Москва").with(2, 100).validate_against(&props).is_ok());
        assert!(PropertyValues::new().with(3, json!({"any": 1})).validate_against(&props).is_ok());
        assert!(PropertyValues::new().with(2, json!(null)).validate_against(&props).is_ok());
        assert!(PropertyValues::new().with(2, "cem").validate_against(&props).is_err());
        assert!(PropertyValues::new().with(99, "x").validate_against(&props).is_err());
    }
}
