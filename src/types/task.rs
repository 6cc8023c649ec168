//! Tarefas (lembretes, ligações, reuniões...)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::{nullable_vec, parse_timestamp, Entity};
use crate::error::PachcaError;

/// Tipo da tarefa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Call,
    Meeting,
    Reminder,
    Event,
    Email,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Meeting => "meeting",
            Self::Reminder => "reminder",
            Self::Event => "event",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = PachcaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(Self::Call),
            "meeting" => Ok(Self::Meeting),
            "reminder" => Ok(Self::Reminder),
            "event" => Ok(Self::Event),
            "email" => Ok(Self::Email),
            other => Err(PachcaError::validation(format!(
                "task kind must be one of call, meeting, reminder, event, email; got '{}'",
                other
            ))),
        }
    }
}

/// Tarefa criada no Pachca
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    pub id: i64,
    pub kind: TaskKind,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    /// Autor da tarefa
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Responsáveis
    #[serde(default, deserialize_with = "nullable_vec")]
    pub performer_ids: Vec<i64>,
    #[serde(skip)]
    raw: Value,
}

impl Task {
    pub fn due_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.due_at.as_deref().and_then(parse_timestamp)
    }

    pub fn created_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

impl Entity for Task {
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
    fn test_task_kind_parsing() {
        assert_eq!("Meeting".parse::<TaskKind>().unwrap(), TaskKind::Meeting);
        assert_eq!(TaskKind::Email.to_string(), "email");
        assert!("lunch".parse::<TaskKind>().is_err());
        assert_eq!(serde_json::to_value(TaskKind::Call).unwrap(), json!("call"));
    }

    #[test]
    fn test_task_from_raw() {
        let raw = json!({
            "id": 55,
            "kind": "reminder",
            "content": "Ligar para o cliente",
            "due_at": "2024-01-10T12:00:00.000+03:00",
            "priority": 2,
            "user_id": 12,
            "status": "undone",
            "created_at": "2024-01-09T08:00:00.000Z",
            "performer_ids": [12, 13]
        });
        let task = Task::from_raw(raw.clone()).unwrap();

        assert_eq!(task.kind, TaskKind::Reminder);
        assert_eq!(task.priority, Some(2));
        assert_eq!(task.performer_ids, vec![12, 13]);
        assert_eq!(task.due_at_utc().unwrap().to_rfc3339(), "2024-01-10T09:00:00+00:00");
        assert_eq!(task.raw(), &raw);
    }

    #[test]
    fn test_task_with_unknown_kind_fails() {
        assert!(Task::from_raw(json!({"id": 1, "kind": "party"})).is_err());
    }
}
