use serde::Deserialize;
use serde_json::Value;

use super::{parse_timestamp, Entity, EntityType};

/// Mensagem (nota) anexada a um Deal/Client/Organization
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub id: i64,
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub content: String,
    /// Autor
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(skip)]
    raw: Value,
}

impl Message {
    pub fn created_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

impl Entity for Message {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn attach_raw(&mut self, raw: Value) {
        self.raw = raw;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_from_raw() {
        let raw = json!({
            "id": 3001,
            "entity_type": "Deal",
            "entity_id": 900,
            "content": "Cliente pediu desconto",
            "user_id": 12,
            "created_at": "2024-03-02T11:00:00.000Z"
        });
        let message = Message::from_raw(raw.clone()).unwrap();

        assert_eq!(message.entity_type, EntityType::Deal);
        assert_eq!(message.entity_id, 900);
        assert_eq!(message.content, "Cliente pediu desconto");
        assert_eq!(message.user_id, Some(12));
        assert!(message.created_at_utc().is_some());
        assert_eq!(message.raw(), &raw);
    }

    #[test]
    fn test_message_rejects_unsupported_entity_type() {
        let raw = json!({"id": 1, "entity_type": "Thread", "entity_id": 1, "content": "x"});
        assert!(Message::from_raw(raw).is_err());
    }
}
