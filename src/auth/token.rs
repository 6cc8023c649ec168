use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PachcaResult;

/// Arquivo padrão do refresh token
pub const DEFAULT_REFRESH_FILE: &str = ".refresh_token";

/// Resposta 2xx do endpoint `/oauth/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Resposta 4xx do endpoint `/oauth/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Persistência do refresh token em um único arquivo
///
/// Sem lock: duas instâncias usando o mesmo arquivo disputam a rotação do
/// token e podem invalidar uma à outra.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Lê o refresh token salvo; `None` se o arquivo não existe ou está vazio
    pub fn load(&self) -> PachcaResult<Option<String>> {
        if !self.exists() {
            return Ok(None);
        }

        let token = fs::read_to_string(&self.path)?;
        let token = token.trim();

        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    /// Sobrescreve o arquivo com o novo refresh token
    pub fn save(&self, token: &str) -> PachcaResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        tracing::debug!("Refresh token saved to {}", self.path.display());
        Ok(())
    }

    /// Remove o arquivo (força um novo authorization_code na próxima aquisição)
    pub fn clear(&self) -> PachcaResult<()> {
        if self.exists() {
            fs::remove_file(&self.path)?;
            tracing::info!("🗑️ Refresh token removed from {}", self.path.display());
        }
        Ok(())
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_FILE)
    }
}
