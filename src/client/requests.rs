//! Corpos das operações de escrita
//!
//! Cada struct serializa só os campos preenchidos; o envelope
//! (`{"deal": {...}}` etc.) é colocado pelo [`PachcaClient`](super::PachcaClient).

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{PachcaError, PachcaResult};
use crate::types::{EntityType, PropertyValues, TaskKind};

/// Envolve `body` em `{key: body}`
pub(crate) fn envelope<T: Serialize>(key: &str, body: &T) -> PachcaResult<Value> {
    let mut map = Map::new();
    map.insert(key.to_string(), serde_json::to_value(body)?);
    Ok(Value::Object(map))
}

/// `POST organizations`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewOrganization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inn: Option<String>,
    #[serde(rename = "custom_properties", skip_serializing_if = "PropertyValues::is_empty")]
    pub properties: PropertyValues,
}

impl NewOrganization {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_inn(mut self, inn: impl Into<String>) -> Self {
        self.inn = Some(inn.into());
        self
    }

    pub fn with_properties(mut self, properties: PropertyValues) -> Self {
        self.properties = properties;
        self
    }

    pub fn validate(&self) -> PachcaResult<()> {
        let filled = |v: &Option<String>| v.as_deref().map_or(false, |s| !s.trim().is_empty());
        if filled(&self.name) || filled(&self.inn) {
            Ok(())
        } else {
            Err(PachcaError::validation("organization needs a name or an INN"))
        }
    }
}

/// `POST clients`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewClient {
    pub full_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub list_tags: Vec<String>,
    #[serde(rename = "custom_properties", skip_serializing_if = "PropertyValues::is_empty")]
    pub properties: PropertyValues,
}

impl NewClient {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phones.push(phone.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.emails.push(email.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn organization(mut self, organization_id: i64) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn additional(mut self, additional: impl Into<String>) -> Self {
        self.additional = Some(additional.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.list_tags.push(tag.into());
        self
    }

    pub fn with_properties(mut self, properties: PropertyValues) -> Self {
        self.properties = properties;
        self
    }

    pub fn validate(&self) -> PachcaResult<()> {
        if self.full_name.trim().is_empty() {
            return Err(PachcaError::validation("client full_name is required"));
        }
        Ok(())
    }
}

pub const DEFAULT_TASK_PRIORITY: u8 = 1;

/// `POST tasks`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub kind: TaskKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// ISO-8601 (`2024-03-01T10:00:00.000Z`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
    pub priority: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub performer_ids: Vec<i64>,
}

impl NewTask {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            content: None,
            due_at: None,
            priority: DEFAULT_TASK_PRIORITY,
            performer_ids: Vec::new(),
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn due_at(mut self, due_at: impl Into<String>) -> Self {
        self.due_at = Some(due_at.into());
        self
    }

    pub fn due(self, due_at: chrono::DateTime<chrono::Utc>) -> Self {
        self.due_at(due_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn performer(mut self, user_id: i64) -> Self {
        self.performer_ids.push(user_id);
        self
    }
}

/// Etapa de funil por ID ou por nome (resolvido via fuzzy matching)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageRef {
    Id(i64),
    Name(String),
}

impl From<i64> for StageRef {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for StageRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for StageRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Texto numérico vira `Id`, qualquer outro vira `Name`
impl FromStr for StageRef {
    type Err = PachcaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PachcaError::validation("stage reference is empty"));
        }
        Ok(s.parse::<i64>().map_or_else(|_| Self::Name(s.to_string()), Self::Id))
    }
}

impl fmt::Display for StageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{}", id),
            Self::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Serialize)]
struct Note<'a> {
    content: &'a str,
}

/// `POST deals`
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeal {
    pub name: String,
    pub client_id: i64,
    /// `None`: primeira etapa do único funil do workspace
    pub stage: Option<StageRef>,
    pub cost: i64,
    pub properties: PropertyValues,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
struct DealBody<'a> {
    name: &'a str,
    client_id: i64,
    stage_id: i64,
    cost: i64,
    #[serde(rename = "custom_properties", skip_serializing_if = "PropertyValues::is_empty")]
    properties: &'a PropertyValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<Note<'a>>,
}

impl NewDeal {
    pub fn new(name: impl Into<String>, client_id: i64) -> Self {
        Self {
            name: name.into(),
            client_id,
            stage: None,
            cost: 0,
            properties: PropertyValues::new(),
            note: None,
        }
    }

    pub fn stage(mut self, stage: impl Into<StageRef>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn cost(mut self, cost: i64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_properties(mut self, properties: PropertyValues) -> Self {
        self.properties = properties;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Corpo com a etapa já resolvida
    pub(crate) fn to_body(&self, stage_id: i64) -> PachcaResult<Value> {
        envelope(
            "deal",
            &DealBody {
                name: &self.name,
                client_id: self.client_id,
                stage_id,
                cost: self.cost,
                properties: &self.properties,
                note: self.note.as_deref().map(|content| Note { content }),
            },
        )
    }
}

/// `PUT deals/{id}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealUpdate {
    pub name: Option<String>,
    pub stage: Option<StageRef>,
    pub cost: Option<i64>,
    pub state: Option<String>,
    pub properties: PropertyValues,
}

#[derive(Debug, Serialize)]
struct DealUpdateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
    #[serde(rename = "custom_properties", skip_serializing_if = "PropertyValues::is_empty")]
    properties: &'a PropertyValues,
}

impl DealUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn stage(mut self, stage: impl Into<StageRef>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn cost(mut self, cost: i64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_properties(mut self, properties: PropertyValues) -> Self {
        self.properties = properties;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.stage.is_none()
            && self.cost.is_none()
            && self.state.is_none()
            && self.properties.is_empty()
    }

    pub(crate) fn to_body(&self, stage_id: Option<i64>) -> PachcaResult<Value> {
        envelope(
            "deal",
            &DealUpdateBody {
                name: self.name.as_deref(),
                stage_id,
                cost: self.cost,
                state: self.state.as_deref(),
                properties: &self.properties,
            },
        )
    }
}

/// `POST messages`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_organization_body() {
        let org = NewOrganization::named("ООО Ромашка")
            .with_inn("7700000000")
            .with_properties(PropertyValues::new().with(3, "B2B"));

        assert!(org.validate().is_ok());
        assert_eq!(
            envelope("organization", &org).unwrap(),
            json!({"organization": {
                "name": "ООО Ромашка",
                "inn": "7700000000",
                "custom_properties": [{"id": 3, "value": "B2B"}]
            }})
        );
    }

    #[test]
    fn test_organization_needs_name_or_inn() {
        assert!(NewOrganization::default().validate().is_err());
        assert!(NewOrganization::named("  ").validate().is_err());
        assert!(NewOrganization::default().with_inn("123").validate().is_ok());
    }

    #[test]
    fn test_client_body_skips_empty_fields() {
        let client = NewClient::new("Bob").phone("+79990000000").tag("vip");
        assert_eq!(
            serde_json::to_value(&client).unwrap(),
            json!({"full_name": "Bob", "phones": ["+79990000000"], "list_tags": ["vip"]})
        );
        assert!(NewClient::new("").validate().is_err());
    }

    #[test]
    fn test_task_defaults() {
        let task = NewTask::new(TaskKind::Call).performer(7);
        assert_eq!(
            serde_json::to_value(&task).unwrap(),
            json!({"kind": "call", "priority": 1, "performer_ids": [7]})
        );
    }

    #[test]
    fn test_task_due_from_datetime() {
        let due = chrono::DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let task = NewTask::new(TaskKind::Meeting).due(due);
        assert_eq!(task.due_at.as_deref(), Some("2024-03-01T10:00:00.000Z"));
    }

    #[test]
    fn test_stage_ref_from_str() {
        assert_eq!("12".parse::<StageRef>().unwrap(), StageRef::Id(12));
        assert_eq!(" Won ".parse::<StageRef>().unwrap(), StageRef::Name("Won".into()));
        assert!("".parse::<StageRef>().is_err());
    }

    #[test]
    fn test_deal_body() {
        let deal = NewDeal::new("X", 1).stage("Won").note("first contact");
        assert_eq!(
            deal.to_body(12).unwrap(),
            json!({"deal": {
                "name": "X",
                "client_id": 1,
                "stage_id": 12,
                "cost": 0,
                "note": {"content": "first contact"}
            }})
        );
    }

    #[test]
    fn test_deal_update() {
        assert!(DealUpdate::new().is_empty());

        let update = DealUpdate::new().cost(500).state("won");
        assert!(!update.is_empty());
        assert_eq!(
            update.to_body(None).unwrap(),
            json!({"deal": {"cost": 500, "state": "won"}})
        );
    }

    #[test]
    fn test_message_body() {
        let message = NewMessage {
            entity_type: EntityType::Client,
            entity_id: 5,
            content: "hi".into(),
        };
        assert_eq!(
            envelope("message", &message).unwrap(),
            json!({"message": {"entity_type": "Client", "entity_id": 5, "content": "hi"}})
        );
    }
}
