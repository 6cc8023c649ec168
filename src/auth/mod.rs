//! # Autenticação OAuth2 do Pachca
//!
//! ## Responsabilidades:
//! - Trocar authorization_code por access token (primeiro uso)
//! - Trocar refresh token por access token e gravar o token rotacionado
//! - Persistir o refresh token em arquivo
//! - Pedir o authorization_code via callback injetável
//!
//! ## Estrutura:
//! - `oauth.rs`: cliente do endpoint `/oauth/token`
//! - `token.rs`: arquivo do refresh token e respostas do endpoint
//! - `prompt.rs`: origem do authorization_code

pub mod oauth;
pub mod prompt;
pub mod token;

pub use oauth::{bearer_headers, validate_code, GrantType, PachcaOAuth, DEFAULT_API_BASE_URL, DEFAULT_REDIRECT_URI};
pub use prompt::{CodePrompt, StdinPrompt};
pub use token::{TokenStore, DEFAULT_REFRESH_FILE};
