//! Tipos de erro para o crate pachca

use thiserror::Error;

/// Discriminante do tipo de erro, útil para quem só precisa decidir o que fazer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Api,
    Transport,
    Http,
    Io,
    Json,
    Config,
    UnexpectedResponse,
}

/// Erros do cliente Pachca
#[derive(Debug, Error)]
pub enum PachcaError {
    /// Entrada inválida (código OAuth malformado, tipo de entidade desconhecido, update vazio...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resposta 4xx do endpoint de token
    #[error("Authorization failed: {code} - {description}")]
    Auth { code: String, description: String },

    /// Resposta não-2xx de um endpoint de recurso (corpo bruto em `message`)
    #[error("Pachca API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Status inesperado ou corpo não-JSON do endpoint de token
    #[error("Token endpoint returned an unexpected response: {0}")]
    Transport(String),

    /// Erro de requisição HTTP
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Erro de IO (arquivo do refresh token, prompt)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resposta 2xx sem o envelope `data`
    #[error("Unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

impl PachcaError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn auth(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Auth {
            code: code.into(),
            description: description.into(),
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn transport(body: impl Into<String>) -> Self {
        Self::Transport(body.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::UnexpectedResponse(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Api { .. } => ErrorKind::Api,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Http(_) => ErrorKind::Http,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Json,
            Self::Config(_) => ErrorKind::Config,
            Self::UnexpectedResponse(_) => ErrorKind::UnexpectedResponse,
        }
    }

    /// `true` para 401 vindo de um endpoint de recurso
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}

impl From<config::ConfigError> for PachcaError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Tipo Result padrão para o crate
pub type PachcaResult<T> = std::result::Result<T, PachcaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = PachcaError::auth("invalid_grant", "The provided authorization grant is invalid");
        assert_eq!(
            err.to_string(),
            "Authorization failed: invalid_grant - The provided authorization grant is invalid"
        );

        let err = PachcaError::api(422, r#"{"errors":[]}"#);
        assert_eq!(err.to_string(), r#"Pachca API error (status 422): {"errors":[]}"#);

        let err = PachcaError::validation("code must be 43 characters");
        assert_eq!(err.to_string(), "Validation error: code must be 43 characters");
    }

    #[test]
    fn test_kind_discriminant() {
        assert_eq!(PachcaError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(PachcaError::auth("a", "b").kind(), ErrorKind::Auth);
        assert_eq!(PachcaError::api(500, "boom").kind(), ErrorKind::Api);
        assert_eq!(PachcaError::transport("<html>").kind(), ErrorKind::Transport);
        assert_eq!(PachcaError::config("x").kind(), ErrorKind::Config);
    }

    #[test]
    fn test_io_error_from() {
        use std::io::{Error, ErrorKind as IoKind};
        let err = PachcaError::from(Error::new(IoKind::NotFound, "missing"));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(PachcaError::api(401, "").is_unauthorized());
        assert!(!PachcaError::api(403, "").is_unauthorized());
        assert!(!PachcaError::validation("").is_unauthorized());
    }
}
