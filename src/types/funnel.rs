//! Funis de vendas e suas etapas

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use super::{attach_nested, int_or_string, Entity};

/// Etapa de um funil
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stage {
    pub id: i64,
    pub name: String,
    /// Ordem de exibição dentro do funil
    #[serde(deserialize_with = "int_or_string")]
    pub sort: i64,
    #[serde(skip)]
    raw: Value,
}

impl Stage {
    /// Candidato usado no fuzzy matching de etapas: `"{name}#{id}"`
    pub fn match_label(&self) -> String {
        format!("{}#{}", self.name, self.id)
    }
}

impl Entity for Stage {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn attach_raw(&mut self, raw: Value) {
        self.raw = raw;
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} #{} sort: {}>", self.name, self.id, self.sort)
    }
}

/// Funil: pipeline nomeado de etapas ordenadas
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Funnel {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(skip)]
    raw: Value,
}

impl Funnel {
    /// Etapas na ordem de exibição (`sort` crescente)
    pub fn ordered_stages(&self) -> Vec<&Stage> {
        let mut stages: Vec<&Stage> = self.stages.iter().collect();
        stages.sort_by_key(|s| s.sort);
        stages
    }

    /// Primeira etapa do funil (menor `sort`)
    pub fn first_stage(&self) -> Option<&Stage> {
        self.stages.iter().min_by_key(|s| s.sort)
    }
}

impl Entity for Funnel {
    fn raw(&self) -> &Value {
        &self.raw
    }

    fn attach_raw(&mut self, raw: Value) {
        attach_nested(&mut self.stages, &raw, "stages");
        self.raw = raw;
    }
}

impl fmt::Display for Funnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} #{} [", self.name, self.id)?;
        for (i, stage) in self.ordered_stages().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", stage)?;
        }
        write!(f, "]>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": 7,
            "name": "Vendas",
            "stages": [
                {"id": 12, "name": "Won", "sort": 3},
                {"id": 10, "name": "New", "sort": "1"},
                {"id": 11, "name": "In progress", "sort": 2}
            ]
        })
    }

    #[test]
    fn test_funnel_from_raw() {
        let funnel = Funnel::from_raw(sample()).unwrap();
        assert_eq!(funnel.id, 7);
        assert_eq!(funnel.name, "Vendas");
        assert_eq!(funnel.stages.len(), 3);
        assert_eq!(funnel.raw(), &sample());
        assert_eq!(funnel.stages[0].raw(), &sample()["stages"][0]);
    }

    #[test]
    fn test_ordered_and_first_stage() {
        let funnel = Funnel::from_raw(sample()).unwrap();
        let names: Vec<&str> = funnel.ordered_stages().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["New", "In progress", "Won"]);
        assert_eq!(funnel.first_stage().unwrap().id, 10);
    }

    #[test]
    fn test_stage_match_label_and_display() {
        let funnel = Funnel::from_raw(sample()).unwrap();
        assert_eq!(funnel.stages[0].match_label(), "Won#12");
        assert_eq!(funnel.stages[1].to_string(), "<New #10 sort: 1>");
    }
}
