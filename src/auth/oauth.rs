use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::auth::prompt::CodePrompt;
use crate::auth::token::{TokenErrorResponse, TokenResponse, TokenStore};
use crate::error::{PachcaError, PachcaResult};

/// URL base da API compartilhada do Pachca
pub const DEFAULT_API_BASE_URL: &str = "https://api.pachca.com/api/shared/v1";

/// redirect_uri registrado por padrão nos apps do Pachca
pub const DEFAULT_REDIRECT_URI: &str = "https://app.pachca.com";

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{43}$").expect("authorization code pattern is valid"));

/// grant_type aceito pelo endpoint de token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }

    /// Campo do corpo que carrega o segredo desse grant
    fn secret_field(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "code",
            Self::RefreshToken => "refresh_token",
        }
    }
}

/// Valida o formato do authorization_code (43 caracteres `[A-Za-z0-9_-]`)
pub fn validate_code(code: &str) -> PachcaResult<()> {
    if CODE_PATTERN.is_match(code) {
        Ok(())
    } else {
        Err(PachcaError::validation(
            "authorization code must be 43 characters of latin letters, digits, '-' or '_'",
        ))
    }
}

/// Monta o header `Authorization: Bearer <token>`
pub fn bearer_headers(access_token: &str) -> PachcaResult<HeaderMap> {
    let value = HeaderValue::from_str(&format!("Bearer {}", access_token))
        .map_err(|e| PachcaError::unexpected(format!("access token is not a valid header value: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

fn preview(secret: &str) -> &str {
    let end = secret.char_indices().nth(6).map_or(secret.len(), |(i, _)| i);
    &secret[..end]
}

/// Cliente OAuth2 do Pachca
///
/// Com refresh token salvo usa o grant `refresh_token` e grava o token
/// rotacionado; sem ele usa o authorization_code recebido na construção ou
/// pedido ao [`CodePrompt`].
pub struct PachcaOAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    store: TokenStore,
    pending_code: Mutex<Option<String>>,
    prompt: Option<Box<dyn CodePrompt>>,
    http: reqwest::Client,
}

impl PachcaOAuth {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            token_url: token_url_for(DEFAULT_API_BASE_URL),
            store: TokenStore::default(),
            pending_code: Mutex::new(None),
            prompt: None,
            http: reqwest::Client::new(),
        }
    }

    /// authorization_code obtido fora do processo (sem prompt)
    pub fn with_code(self, code: impl Into<String>) -> Self {
        Self {
            pending_code: Mutex::new(Some(code.into())),
            ..self
        }
    }

    pub fn with_prompt(mut self, prompt: impl CodePrompt + 'static) -> Self {
        self.prompt = Some(Box::new(prompt));
        self
    }

    pub fn with_refresh_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.store = TokenStore::new(path);
        self
    }

    /// O endpoint de token fica em `{base}/oauth/token`
    pub fn with_api_base_url(mut self, base_url: &str) -> Self {
        self.token_url = token_url_for(base_url);
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    pub fn has_stored_token(&self) -> bool {
        self.store.exists()
    }

    /// Apaga o refresh token salvo
    pub fn forget_stored_token(&self) -> PachcaResult<()> {
        self.store.clear()
    }

    /// Obtém um access token novo (sem cache em memória)
    pub async fn acquire_access_token(&self) -> PachcaResult<String> {
        if let Some(refresh_token) = self.store.load()? {
            tracing::debug!("🔄 Refreshing access token with stored refresh token");
            return self.exchange(GrantType::RefreshToken, &refresh_token).await;
        }

        tracing::info!("🆕 No refresh token at {}, using authorization code", self.store.path().display());

        let code = self.authorization_code()?;
        validate_code(&code)?;

        let access_token = self.exchange(GrantType::AuthorizationCode, &code).await?;

        // O código é de uso único; depois da troca só vale o refresh token
        if let Ok(mut pending) = self.pending_code.lock() {
            *pending = None;
        }

        Ok(access_token)
    }

    /// Header map `Authorization: Bearer ...`; cada chamada faz uma nova aquisição
    pub async fn auth_headers(&self) -> PachcaResult<HeaderMap> {
        let access_token = self.acquire_access_token().await?;
        bearer_headers(&access_token)
    }

    fn authorization_code(&self) -> PachcaResult<String> {
        let pending = self.pending_code.lock().ok().and_then(|code| code.clone());

        match (pending, &self.prompt) {
            (Some(code), _) => Ok(code),
            (None, Some(prompt)) => prompt.request_code(),
            (None, None) => Err(PachcaError::validation(
                "no refresh token stored and no authorization code supplied",
            )),
        }
    }

    async fn exchange(&self, grant: GrantType, secret: &str) -> PachcaResult<String> {
        let mut body = json!({
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "grant_type": grant.as_str(),
            "redirect_uri": self.redirect_uri,
        });
        body[grant.secret_field()] = Value::String(secret.to_string());

        tracing::debug!(
            "POST {} grant_type={} {}={}...",
            self.token_url,
            grant.as_str(),
            grant.secret_field(),
            preview(secret)
        );

        let response = self.http.post(&self.token_url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            let token: TokenResponse = serde_json::from_str(&text)
                .map_err(|_| PachcaError::transport(text.clone()))?;

            match token.refresh_token.as_deref() {
                Some(refresh_token) => self.store.save(refresh_token)?,
                None => tracing::warn!("⚠️ Token endpoint did not return a refresh_token"),
            }

            tracing::info!("✅ Access token obtained via {}", grant.as_str());
            return Ok(token.access_token);
        }

        if status.is_client_error() {
            return match serde_json::from_str::<TokenErrorResponse>(&text) {
                Ok(err) => {
                    tracing::error!("❌ Token exchange rejected ({}): {}", status, err.error);
                    Err(PachcaError::auth(err.error, err.error_description.unwrap_or_default()))
                }
                Err(_) => Err(PachcaError::transport(text)),
            };
        }

        tracing::error!("❌ Token endpoint returned {}", status);
        Err(PachcaError::transport(text))
    }
}

fn token_url_for(base_url: &str) -> String {
    format!("{}/oauth/token", base_url.trim_end_matches('/'))
}

impl fmt::Debug for PachcaOAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PachcaOAuth")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("token_url", &self.token_url)
            .field("store", &self.store)
            .field("has_prompt", &self.prompt.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CODE: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJK-_0123";

    #[test]
    fn test_validate_code() {
        assert_eq!(VALID_CODE.len(), 43);
        assert!(validate_code(VALID_CODE).is_ok());
        assert!(validate_code(&VALID_CODE[..42]).is_err());
        assert!(validate_code(&format!("{}x", VALID_CODE)).is_err());
        assert!(validate_code(&VALID_CODE.replace('a', "!")).is_err());
    }

    #[test]
    fn test_bearer_headers() {
        let headers = bearer_headers("tok123").unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok123");
        assert!(bearer_headers("bad\ntoken").is_err());
    }

    #[test]
    fn test_token_url() {
        let oauth = PachcaOAuth::new("id", "secret", DEFAULT_REDIRECT_URI);
        assert_eq!(oauth.token_url(), "https://api.pachca.com/api/shared/v1/oauth/token");

        let oauth = oauth.with_api_base_url("http://127.0.0.1:9000/");
        assert_eq!(oauth.token_url(), "http://127.0.0.1:9000/oauth/token");
    }

    #[test]
    fn test_code_source_priority() {
        let oauth = PachcaOAuth::new("id", "secret", DEFAULT_REDIRECT_URI)
            .with_prompt(|| Ok::<_, PachcaError>("from-prompt".to_string()));
        assert_eq!(oauth.authorization_code().unwrap(), "from-prompt");

        let oauth = oauth.with_code("from-config");
        assert_eq!(oauth.authorization_code().unwrap(), "from-config");

        let oauth = PachcaOAuth::new("id", "secret", DEFAULT_REDIRECT_URI);
        assert!(oauth.authorization_code().is_err());
    }

    #[test]
    fn test_acquire_without_any_code_source() {
        let dir = tempfile::tempdir().unwrap();
        let oauth = PachcaOAuth::new("id", "secret", DEFAULT_REDIRECT_URI)
            .with_refresh_file(dir.path().join(".refresh_token"));

        let err = tokio_test::block_on(oauth.acquire_access_token()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn test_debug_hides_secret() {
        let oauth = PachcaOAuth::new("id", "super-secret", DEFAULT_REDIRECT_URI);
        assert!(!format!("{:?}", oauth).contains("super-secret"));
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("abcdefghij"), "abcdef");
        assert_eq!(preview("абв"), "абв");
    }
}
