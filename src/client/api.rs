//! Cliente HTTP da API compartilhada do Pachca

use reqwest::header::HeaderMap;
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;

use super::query::ClientQuery;
use super::requests::{envelope, DealUpdate, NewClient, NewDeal, NewMessage, NewOrganization, NewTask, StageRef};
use crate::auth::{PachcaOAuth, DEFAULT_API_BASE_URL};
use crate::error::{PachcaError, PachcaResult};
use crate::matching::{self, StageMatchPolicy};
use crate::types::{
    Client, Deal, Entity, EntityType, Funnel, Message, Organization, Property, PropertyValues, Stage, Task,
    User,
};

/// Parâmetros do cliente HTTP
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub base_url: String,
    /// Timeout total de cada requisição
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub stage_policy: StageMatchPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            stage_policy: StageMatchPolicy::default(),
        }
    }
}

/// Cliente dos recursos do CRM (funis, campos, usuários, clientes, negócios...)
///
/// O header `Authorization` é obtido uma vez na construção e reaproveitado.
/// Em um 401 o cliente reautentica uma única vez, guarda o header novo e
/// repete a requisição; um segundo 401 vira [`PachcaError::Api`].
pub struct PachcaClient {
    http: HttpClient,
    base_url: String,
    oauth: PachcaOAuth,
    headers: RwLock<HeaderMap>,
    stage_policy: StageMatchPolicy,
}

impl PachcaClient {
    /// Autentica e cria o cliente com as opções padrão
    pub async fn connect(oauth: PachcaOAuth) -> PachcaResult<Self> {
        Self::connect_with(oauth, ClientOptions::default()).await
    }

    pub async fn connect_with(oauth: PachcaOAuth, options: ClientOptions) -> PachcaResult<Self> {
        let http = HttpClient::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|e| PachcaError::config(format!("Failed to create HTTP client: {}", e)))?;

        let headers = oauth.auth_headers().await?;
        tracing::info!("✅ Pachca client ready at {}", options.base_url);

        Ok(Self {
            http,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            oauth,
            headers: RwLock::new(headers),
            stage_policy: options.stage_policy,
        })
    }

    pub fn oauth(&self) -> &PachcaOAuth {
        &self.oauth
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stage_policy(&self) -> StageMatchPolicy {
        self.stage_policy
    }

    // ==================== FUNIS E CAMPOS ====================

    /// `GET funnels`
    pub async fn list_funnels(&self) -> PachcaResult<Vec<Funnel>> {
        let data = self.send(Method::GET, "funnels", None).await?;
        Funnel::from_raw_list(data)
    }

    /// `GET custom_properties` para um tipo de entidade em texto livre
    /// ("Client", "клиент", "Deals"...)
    pub async fn list_custom_properties(&self, entity_kind: &str) -> PachcaResult<Vec<Property>> {
        let entity_type = EntityType::resolve(entity_kind)?;
        self.list_custom_properties_for(entity_type).await
    }

    pub async fn list_custom_properties_for(&self, entity_type: EntityType) -> PachcaResult<Vec<Property>> {
        let path = format!("custom_properties?entity_type={}", entity_type.as_str());
        let data = self.send(Method::GET, &path, None).await?;
        Property::from_raw_list(data)
    }

    /// Confere IDs e tipos de `values` contra os campos declarados de `entity_type`
    ///
    /// Valores vazios não geram requisição. Os métodos `create_*` não chamam
    /// isto sozinhos; quem monta o payload decide se vale o `GET` extra.
    pub async fn validate_properties(&self, entity_type: EntityType, values: &PropertyValues) -> PachcaResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let known = self.list_custom_properties_for(entity_type).await?;
        values.validate_against(&known)
    }

    // ==================== USUÁRIOS ====================

    /// `GET users`
    pub async fn list_users(&self) -> PachcaResult<Vec<User>> {
        let data = self.send(Method::GET, "users", None).await?;
        User::from_raw_list(data)
    }

    // ==================== ORGANIZAÇÕES E CLIENTES ====================

    /// `POST organizations`
    pub async fn create_organization(&self, organization: &NewOrganization) -> PachcaResult<Organization> {
        organization.validate()?;
        let body = envelope("organization", organization)?;
        let data = self.send(Method::POST, "organizations", Some(&body)).await?;
        Organization::from_raw(data)
    }

    /// `GET clients` com filtros, ordenação e paginação
    pub async fn list_clients(&self, query: &ClientQuery) -> PachcaResult<Vec<Client>> {
        let path = format!("clients?{}", query.to_query_string());
        let data = self.send(Method::GET, &path, None).await?;
        Client::from_raw_list(data)
    }

    /// `POST clients`
    pub async fn create_client(&self, client: &NewClient) -> PachcaResult<Client> {
        client.validate()?;
        let body = envelope("client", client)?;
        let data = self.send(Method::POST, "clients", Some(&body)).await?;
        Client::from_raw(data)
    }

    // ==================== TAREFAS ====================

    /// `POST tasks`
    pub async fn create_task(&self, task: &NewTask) -> PachcaResult<Task> {
        let body = envelope("task", task)?;
        let data = self.send(Method::POST, "tasks", Some(&body)).await?;
        Task::from_raw(data)
    }

    // ==================== NEGÓCIOS ====================

    /// `POST deals`; etapas em texto são resolvidas contra `list_funnels()`
    pub async fn create_deal(&self, deal: &NewDeal) -> PachcaResult<Deal> {
        let stage_id = self.resolve_stage(deal.stage.as_ref()).await?;
        let body = deal.to_body(stage_id)?;
        let data = self.send(Method::POST, "deals", Some(&body)).await?;
        Deal::from_raw(data)
    }

    /// `PUT deals/{id}`; um update sem nenhum campo é rejeitado antes da rede
    pub async fn update_deal(&self, deal_id: i64, update: &DealUpdate) -> PachcaResult<Deal> {
        if update.is_empty() {
            return Err(PachcaError::validation("deal update has no fields to change"));
        }

        let stage_id = match &update.stage {
            Some(stage) => Some(self.resolve_stage(Some(stage)).await?),
            None => None,
        };

        let body = update.to_body(stage_id)?;
        let data = self
            .send(Method::PUT, &format!("deals/{}", deal_id), Some(&body))
            .await?;
        Deal::from_raw(data)
    }

    // ==================== MENSAGENS ====================

    /// `POST messages`
    pub async fn create_message(
        &self,
        entity_id: i64,
        content: impl Into<String>,
        entity_type: EntityType,
    ) -> PachcaResult<Message> {
        let message = NewMessage {
            entity_type,
            entity_id,
            content: content.into(),
        };
        let body = envelope("message", &message)?;
        let data = self.send(Method::POST, "messages", Some(&body)).await?;
        Message::from_raw(data)
    }

    // ==================== ETAPAS ====================

    async fn resolve_stage(&self, stage: Option<&StageRef>) -> PachcaResult<i64> {
        match stage {
            Some(StageRef::Id(id)) => Ok(*id),
            Some(StageRef::Name(name)) => {
                let funnels = self.list_funnels().await?;
                resolve_stage_name(&funnels, name, self.stage_policy)
            }
            None => {
                let funnels = self.list_funnels().await?;
                default_stage(&funnels)
            }
        }
    }

    // ==================== HTTP ====================

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> PachcaResult<Value> {
        let url = format!("{}/{}", self.base_url, path);

        let headers = self.headers.read().await.clone();
        let mut response = self.dispatch(method.clone(), &url, headers, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("🔐 {} {} returned 401, re-authenticating once", method, path);

            let fresh = self.oauth.auth_headers().await?;
            *self.headers.write().await = fresh.clone();

            response = self.dispatch(method, &url, fresh, body).await?;
        }

        Self::read_data(response).await
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> PachcaResult<Response> {
        match body {
            Some(body) => tracing::debug!("{} {} with body: {}", method, url, body),
            None => tracing::debug!("{} {}", method, url),
        }

        let mut request = self.http.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Extrai `data` de uma resposta 2xx
    async fn read_data(response: Response) -> PachcaResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("❌ Pachca API error {}: {}", status, text);
            return Err(PachcaError::api(status.as_u16(), text));
        }

        let mut payload: Value = serde_json::from_str(&text)?;
        payload
            .as_object_mut()
            .and_then(|object| object.remove("data"))
            .ok_or_else(|| PachcaError::unexpected(format!("response without 'data': {}", text)))
    }
}

impl std::fmt::Debug for PachcaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PachcaClient")
            .field("base_url", &self.base_url)
            .field("oauth", &self.oauth)
            .field("stage_policy", &self.stage_policy)
            .finish_non_exhaustive()
    }
}

/// Resolve um nome de etapa contra as etapas de todos os funis
///
/// O score considera só o nome da etapa; o candidato reportado é o rótulo
/// `"{nome}#{id}"`, que desambigua etapas homônimas de funis diferentes.
pub fn resolve_stage_name(funnels: &[Funnel], name: &str, policy: StageMatchPolicy) -> PachcaResult<i64> {
    let stages: Vec<&Stage> = funnels.iter().flat_map(|f| f.stages.iter()).collect();
    let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();

    let best = matching::best_match(name, &names)
        .ok_or_else(|| PachcaError::validation(format!("no stages available to match '{}'", name)))?;
    let stage = stages[best.index];

    if !policy.accepts(best.score) {
        return Err(PachcaError::validation(format!(
            "stage '{}' is not close enough to any stage (best: '{}', score {})",
            name,
            stage.match_label(),
            best.score
        )));
    }

    tracing::info!("🎯 Stage '{}' resolved to {} (score {})", name, stage, best.score);
    Ok(stage.id)
}

/// Primeira etapa do único funil; com zero ou vários funis a etapa é obrigatória
pub fn default_stage(funnels: &[Funnel]) -> PachcaResult<i64> {
    match funnels {
        [funnel] => funnel.first_stage().map(|s| s.id).ok_or_else(|| {
            PachcaError::validation(format!("funnel '{}' has no stages", funnel.name))
        }),
        _ => Err(PachcaError::validation(format!(
            "stage is required when the workspace has {} funnels",
            funnels.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn funnels() -> Vec<Funnel> {
        Funnel::from_raw_list(json!([
            {"id": 1, "name": "Sales", "stages": [
                {"id": 4, "name": "Negotiation", "sort": 2},
                {"id": 2, "name": "New", "sort": 1},
                {"id": 3, "name": "Won", "sort": 3}
            ]},
            {"id": 2, "name": "Support", "stages": [
                {"id": 10, "name": "Opened", "sort": 1},
                {"id": 11, "name": "Closed", "sort": 2}
            ]}
        ]))
        .unwrap()
    }

    fn localized_funnels() -> Vec<Funnel> {
        Funnel::from_raw_list(json!([
            {"id": 1, "name": "Продажи", "stages": [
                {"id": 2, "name": "Новый", "sort": 1},
                {"id": 4, "name": "Переговоры", "sort": 2},
                {"id": 3, "name": "Успешно реализовано", "sort": 3},
                {"id": 10, "name": "Closed won", "sort": 4},
                {"id": 11, "name": "Closed lost", "sort": 5}
            ]}
        ]))
        .unwrap()
    }

    #[test]
    fn test_resolve_stage_name() {
        let funnels = funnels();
        assert_eq!(resolve_stage_name(&funnels, "Won", StageMatchPolicy::BestMatch).unwrap(), 3);
        assert_eq!(resolve_stage_name(&funnels, "closed", StageMatchPolicy::BestMatch).unwrap(), 11);
    }

    #[test]
    fn test_resolve_stage_name_with_typos() {
        let funnels = funnels();
        assert_eq!(resolve_stage_name(&funnels, "Negotiaton", StageMatchPolicy::BestMatch).unwrap(), 4);
        assert_eq!(resolve_stage_name(&funnels, "Clsoed", StageMatchPolicy::BestMatch).unwrap(), 11);
        assert_eq!(resolve_stage_name(&funnels, "opend", StageMatchPolicy::MinScore(80)).unwrap(), 10);
        assert_eq!(resolve_stage_name(&funnels, "Negot", StageMatchPolicy::BestMatch).unwrap(), 4);
    }

    #[test]
    fn test_resolve_stage_name_part_of_longer_name() {
        let funnels = localized_funnels();
        assert_eq!(resolve_stage_name(&funnels, "won", StageMatchPolicy::BestMatch).unwrap(), 10);
        assert_eq!(resolve_stage_name(&funnels, "lost", StageMatchPolicy::MinScore(90)).unwrap(), 11);
        assert_eq!(resolve_stage_name(&funnels, "переговоры", StageMatchPolicy::BestMatch).unwrap(), 4);
        assert_eq!(resolve_stage_name(&funnels, "успешно", StageMatchPolicy::BestMatch).unwrap(), 3);
    }

    #[test]
    fn test_min_score_policy_rejects_weak_match() {
        let funnels = funnels();
        let err = resolve_stage_name(&funnels, "qqqqqqqq", StageMatchPolicy::MinScore(90)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);

        assert!(resolve_stage_name(&funnels, "qqqqqqqq", StageMatchPolicy::BestMatch).is_ok());
    }

    #[test]
    fn test_no_stages() {
        assert!(resolve_stage_name(&[], "Won", StageMatchPolicy::BestMatch).is_err());
    }

    #[test]
    fn test_default_stage() {
        let funnels = funnels();
        assert!(default_stage(&funnels).is_err());
        assert_eq!(default_stage(&funnels[..1]).unwrap(), 2);
        assert!(default_stage(&[]).is_err());
    }
}
