//! Query string de `GET /clients`
//!
//! Filtros viram `filter[campo][operador]=valor`, seguidos de `union`, `sort`
//! e sempre `per`/`page` no final.

use std::str::FromStr;

use crate::error::PachcaError;

pub const DEFAULT_PER_PAGE: u32 = 25;
pub const DEFAULT_PAGE: u32 = 1;

/// Um filtro `(campo, operador, valor)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFilter {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl ClientFilter {
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    fn to_fragment(&self) -> String {
        format!(
            "filter[{}][{}]={}",
            urlencoding::encode(&self.field),
            urlencoding::encode(&self.operator),
            urlencoding::encode(&self.value)
        )
    }
}

impl<F, O, V> From<(F, O, V)> for ClientFilter
where
    F: Into<String>,
    O: Into<String>,
    V: Into<String>,
{
    fn from((field, operator, value): (F, O, V)) -> Self {
        Self::new(field, operator, value)
    }
}

/// Formato `campo:operador:valor` (o valor pode conter `:`)
impl FromStr for ClientFilter {
    type Err = PachcaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(field), Some(operator), Some(value)) if !field.is_empty() && !operator.is_empty() => {
                Ok(Self::new(field, operator, value))
            }
            _ => Err(PachcaError::validation(format!(
                "filter must look like field:operator:value, got '{}'",
                s
            ))),
        }
    }
}

/// Parâmetros de listagem de clientes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientQuery {
    pub filters: Vec<ClientFilter>,
    pub union: Option<String>,
    /// `(campo, direção)`
    pub sort: Option<(String, String)>,
    pub per: u32,
    pub page: u32,
}

impl Default for ClientQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            union: None,
            sort: None,
            per: DEFAULT_PER_PAGE,
            page: DEFAULT_PAGE,
        }
    }
}

impl ClientQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<ClientFilter>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn union(mut self, mode: impl Into<String>) -> Self {
        self.union = Some(mode.into());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sort = Some((field.into(), direction.into()));
        self
    }

    pub fn per(mut self, per: u32) -> Self {
        self.per = per;
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = self.filters.iter().map(ClientFilter::to_fragment).collect();

        if let Some(union) = &self.union {
            parts.push(format!("union={}", urlencoding::encode(union)));
        }
        if let Some((field, direction)) = &self.sort {
            parts.push(format!(
                "sort[{}]={}",
                urlencoding::encode(field),
                urlencoding::encode(direction)
            ));
        }
        parts.push(format!("per={}&page={}", self.per, self.page));

        parts.join("&")
    }
}
