//! # Pachca CRM Client
//!
//! Cliente Rust para a API compartilhada do Pachca (funis, campos
//! personalizados, usuários, organizações, clientes, tarefas, negócios e
//! mensagens), com autenticação OAuth2 e persistência do refresh token.
//!
//! ## Features
//!
//! - ✅ OAuth2 com authorization_code e rotação de refresh token em arquivo
//! - ✅ Reautenticação automática (uma vez) em respostas 401
//! - ✅ Modelos tipados que preservam o payload bruto (`Entity::raw`)
//! - ✅ Fuzzy matching de tipos de entidade e de etapas de funil
//! - ✅ Campos personalizados validados contra os tipos declarados
//!
//! ## Exemplo
//!
//! ```rust,ignore
//! use pachca::client::{NewDeal, PachcaClient};
//! use pachca::auth::PachcaOAuth;
//!
//! #[tokio::main]
//! async fn main() -> pachca::PachcaResult<()> {
//!     let oauth = PachcaOAuth::new("client-id", "client-secret", "https://app.pachca.com")
//!         .with_code("authorization-code-from-the-app-page-0000000");
//!     let client = PachcaClient::connect(oauth).await?;
//!
//!     for funnel in client.list_funnels().await? {
//!         println!("{}", funnel);
//!     }
//!
//!     let deal = client.create_deal(&NewDeal::new("X", 1).stage("Won")).await?;
//!     println!("deal #{} at stage {}", deal.id, deal.stage_id);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod matching;
pub mod types;

// Re-exports principais
pub use auth::{CodePrompt, PachcaOAuth, StdinPrompt, TokenStore};
pub use client::{ClientOptions, ClientQuery, PachcaClient};
pub use crate::config::Settings;
pub use error::{ErrorKind, PachcaError, PachcaResult};
pub use matching::StageMatchPolicy;
pub use types::{Entity, EntityType, PropertyValues};
