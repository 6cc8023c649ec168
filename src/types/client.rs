use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use super::{attach_nested, nullable_vec, parse_timestamp, Entity, Property};

/// Cliente (contato) do CRM
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Client {
    pub id: i64,
    #[serde(default)]
    pub client_number: Option<i64>,
    pub full_name: String,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub phones: Vec<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub emails: Vec<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub organization_id: Option<i64>,
    /// Nota livre
    #[serde(default)]
    pub additional: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub list_tags: Vec<String>,
    #[serde(rename = "custom_properties", default, deserialize_with = "nullable_vec")]
    pub properties: Vec<Property>,
    #[serde(skip)]
    raw: Value,
}

impl Client {
    pub fn created_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

impl Entity for Client {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn attach_raw(&mut self, raw: Value) {
        attach_nested(&mut self.properties, &raw, "custom_properties");
        self.raw = raw;
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.client_number {
            Some(number) => write!(f, "<{} @{} #{}>", self.full_name, number, self.id),
            None => write!(f, "<{} #{}>", self.full_name, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": 101,
            "client_number": 17,
            "full_name": "Bob Smith",
            "owner_id": 12,
            "created_at": "2023-02-01T09:00:00.000Z",
            "phones": ["+79990001122"],
            "emails": ["bob@example.com"],
            "address": "Lenina 1",
            "organization_id": 3,
            "additional": "VIP",
            "list_tags": ["lead", "b2b"],
            "custom_properties": [{"id": 1, "name": "Город", "data_type": "string", "value": "Омск"}]
        })
    }

    #[test]
    fn test_client_round_trip() {
        let raw = sample();
        let client = Client::from_raw(raw.clone()).unwrap();

        assert_eq!(client.id, raw["id"].as_i64().unwrap());
        assert_eq!(client.client_number, raw["client_number"].as_i64());
        assert_eq!(client.full_name, raw["full_name"].as_str().unwrap());
        assert_eq!(client.owner_id, raw["owner_id"].as_i64());
        assert_eq!(client.created_at.as_deref(), raw["created_at"].as_str());
        assert_eq!(client.phones, vec!["+79990001122".to_string()]);
        assert_eq!(client.emails, vec!["bob@example.com".to_string()]);
        assert_eq!(client.address.as_deref(), Some("Lenina 1"));
        assert_eq!(client.organization_id, Some(3));
        assert_eq!(client.additional.as_deref(), Some("VIP"));
        assert_eq!(client.list_tags, vec!["lead".to_string(), "b2b".to_string()]);
        assert_eq!(client.properties[0].value, Some(json!("Омск")));
        assert_eq!(client.raw(), &raw);
    }

    #[test]
    fn test_created_at_utc_and_display() {
        let client = Client::from_raw(sample()).unwrap();
        assert_eq!(
            client.created_at_utc().unwrap().to_rfc3339(),
            "2023-02-01T09:00:00+00:00"
        );
        assert_eq!(client.to_string(), "<Bob Smith @17 #101>");
    }
}
