use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{PachcaOAuth, DEFAULT_API_BASE_URL, DEFAULT_REDIRECT_URI, DEFAULT_REFRESH_FILE};
use crate::client::ClientOptions;
use crate::error::{PachcaError, PachcaResult};
use crate::matching::StageMatchPolicy;

/// Prefixo das variáveis de ambiente (`PACHCA_CLIENT_ID`, ...)
pub const ENV_PREFIX: &str = "PACHCA";

/// Arquivo opcional de configuração (qualquer formato suportado pelo `config`)
pub const CONFIG_FILE: &str = "config/pachca";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_file: PathBuf,
    pub api_base_url: String,
    /// authorization_code para o primeiro uso sem prompt interativo
    #[serde(default)]
    pub auth_code: Option<String>,
    /// Score mínimo para resolver etapas por nome; ausente = melhor candidato
    #[serde(default)]
    pub stage_min_score: Option<u8>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Settings {
    /// Defaults → `config/pachca` → variáveis `PACHCA_*`
    pub fn load() -> PachcaResult<Self> {
        Self::from_builder(
            Self::defaults()?
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(ENV_PREFIX)),
        )
    }

    /// Builder com os valores padrão já aplicados
    pub fn defaults() -> PachcaResult<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("client_id", "")?
            .set_default("client_secret", "")?
            .set_default("redirect_uri", DEFAULT_REDIRECT_URI)?
            .set_default("refresh_file", DEFAULT_REFRESH_FILE)?
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("timeout_secs", 30)?
            .set_default("connect_timeout_secs", 5)?)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> PachcaResult<Self> {
        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> PachcaResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(PachcaError::config("client_id is not set (PACHCA_CLIENT_ID)"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(PachcaError::config("client_secret is not set (PACHCA_CLIENT_SECRET)"));
        }

        for (name, url) in [("api_base_url", &self.api_base_url), ("redirect_uri", &self.redirect_uri)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(PachcaError::config(format!("{} must be an http(s) URL, got '{}'", name, url)));
            }
        }

        if self.timeout_secs == 0 {
            return Err(PachcaError::config("timeout_secs must be greater than zero"));
        }

        Ok(())
    }

    /// Cliente OAuth com arquivo de refresh token, URL base e código (se houver)
    pub fn oauth(&self) -> PachcaOAuth {
        let oauth = PachcaOAuth::new(&self.client_id, &self.client_secret, &self.redirect_uri)
            .with_refresh_file(&self.refresh_file)
            .with_api_base_url(&self.api_base_url);

        match self.auth_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => oauth.with_code(code),
            None => oauth,
        }
    }

    pub fn stage_policy(&self) -> StageMatchPolicy {
        self.stage_min_score
            .map_or(StageMatchPolicy::BestMatch, StageMatchPolicy::MinScore)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.api_base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            stage_policy: self.stage_policy(),
        }
    }
}
