//! Usuários do workspace Pachca

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use super::Entity;

/// Representa um usuário do Pachca
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub suspended: bool,
    #[serde(skip)]
    raw: Value,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

impl Entity for User {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn attach_raw(&mut self, raw: Value) {
        self.raw = raw;
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} @{} #{}>",
            self.full_name(),
            self.nickname.as_deref().unwrap_or(""),
            self.id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_from_raw() {
        let raw = json!({
            "id": 12,
            "first_name": "Olga",
            "last_name": "Petrova",
            "nickname": "olga",
            "email": "olga@example.com",
            "phone_number": null,
            "department": "Sales",
            "role": "admin",
            "suspended": false,
            "time_zone": "Europe/Moscow"
        });
        let user = User::from_raw(raw.clone()).unwrap();

        assert_eq!(user.id, 12);
        assert_eq!(user.full_name(), "Olga Petrova");
        assert_eq!(user.email.as_deref(), Some("olga@example.com"));
        assert!(user.phone_number.is_none());
        assert_eq!(user.role.as_deref(), Some("admin"));
        assert!(!user.suspended);
        assert_eq!(user.raw()["time_zone"], "Europe/Moscow");
        assert_eq!(user.to_string(), "<Olga Petrova @olga #12>");
    }
}
