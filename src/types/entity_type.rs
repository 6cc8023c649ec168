//! Tipos de entidade do CRM que aceitam campos personalizados e mensagens

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PachcaError, PachcaResult};
use crate::matching;

/// Confiança mínima (exclusiva) para aceitar o nome digitado de uma entidade
pub const ENTITY_MATCH_THRESHOLD: u8 = 70;

/// Nomes aceitos para cada tipo, incluindo os nomes em russo da interface
const ALIASES: [(&str, EntityType); 6] = [
    ("Organization", EntityType::Organization),
    ("Client", EntityType::Client),
    ("Deal", EntityType::Deal),
    ("Организация", EntityType::Organization),
    ("Клиент", EntityType::Client),
    ("Сделка", EntityType::Deal),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityType {
    Organization,
    Client,
    #[default]
    Deal,
}

impl EntityType {
    /// Valor usado pela API (`entity_type=...`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "Organization",
            Self::Client => "Client",
            Self::Deal => "Deal",
        }
    }

    /// Resolve texto livre ("client", "Клиент", "Deals"...) via fuzzy matching
    ///
    /// Falha com `Validation` quando o melhor candidato não passa de
    /// [`ENTITY_MATCH_THRESHOLD`].
    pub fn resolve(text: &str) -> PachcaResult<Self> {
        let names: Vec<&str> = ALIASES.iter().map(|(name, _)| *name).collect();

        match matching::best_match(text, &names) {
            Some(m) if m.score > ENTITY_MATCH_THRESHOLD => {
                let resolved = ALIASES[m.index].1;
                tracing::debug!("Entity kind '{}' resolved to {} (score {})", text, resolved, m.score);
                Ok(resolved)
            }
            best => Err(PachcaError::validation(format!(
                "entity must be 'Organization', 'Client' or 'Deal'; '{}' is not close enough (best score {})",
                text,
                best.map_or(0, |m| m.score)
            ))),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = PachcaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}
