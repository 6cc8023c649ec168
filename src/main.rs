use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::fmt::Display;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pachca::client::{
    ClientFilter, ClientQuery, DealUpdate, NewClient, NewDeal, NewOrganization, NewTask, PachcaClient, StageRef,
};
use pachca::types::{Entity, EntityType, PropertyValues, TaskKind};
use pachca::{Settings, StdinPrompt};

/// Pachca CLI - Interface de linha de comando para o CRM do Pachca
#[derive(Parser)]
#[command(name = "pachca")]
#[command(version)]
#[command(about = "CLI para a API compartilhada do Pachca", long_about = None)]
struct Cli {
    /// Arquivo do refresh token (ou use PACHCA_REFRESH_FILE)
    #[arg(long, global = true)]
    refresh_file: Option<PathBuf>,

    /// authorization_code para o primeiro acesso (ou use PACHCA_AUTH_CODE)
    #[arg(long, global = true)]
    code: Option<String>,

    /// Formato de saída (json, pretty)
    #[arg(short = 'o', long, default_value = "pretty", global = true)]
    output: OutputFormat,

    /// Modo verbose para debug
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, PartialEq)]
enum OutputFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "pretty" => Ok(OutputFormat::Pretty),
            _ => Err(format!("Formato desconhecido: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Obtém um access token e salva o refresh token
    Auth {
        /// Descarta o refresh token salvo e usa um novo authorization_code
        #[arg(short = 'f', long)]
        force: bool,
    },

    #[command(flatten)]
    Resource(ResourceCommand),
}

/// Comandos que falam com a API (exigem cliente autenticado)
#[derive(Subcommand)]
enum ResourceCommand {
    /// Lista funis e etapas
    Funnels,

    /// Lista campos personalizados de Organization, Client ou Deal
    Properties {
        /// Tipo de entidade (aceita "client", "Клиент", "deals"...)
        kind: String,
    },

    /// Lista usuários do workspace
    Users,

    /// Lista clientes
    Clients {
        /// Filtro campo:operador:valor (repetível)
        #[arg(long = "filter")]
        filters: Vec<ClientFilter>,

        /// Modo de união dos filtros
        #[arg(long)]
        union: Option<String>,

        /// Ordenação campo:direção
        #[arg(long)]
        sort: Option<String>,

        #[arg(long, default_value_t = 25)]
        per: u32,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Cria uma organização
    CreateOrganization {
        #[arg(short = 'n', long)]
        name: Option<String>,

        #[arg(long)]
        inn: Option<String>,

        /// Campo personalizado ID=VALOR (repetível)
        #[arg(long = "prop")]
        props: Vec<String>,
    },

    /// Cria um cliente
    CreateClient {
        #[arg(short = 'n', long)]
        full_name: String,

        #[arg(long = "phone")]
        phones: Vec<String>,

        #[arg(long = "email")]
        emails: Vec<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        organization_id: Option<i64>,

        #[arg(long)]
        additional: Option<String>,

        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long = "prop")]
        props: Vec<String>,
    },

    /// Cria uma tarefa
    CreateTask {
        /// call, meeting, reminder, event ou email
        #[arg(short = 'k', long)]
        kind: TaskKind,

        #[arg(short = 'c', long)]
        content: Option<String>,

        /// Prazo (YYYY-MM-DD ou RFC 3339)
        #[arg(long)]
        due: Option<String>,

        #[arg(long, default_value_t = 1)]
        priority: u8,

        #[arg(long = "performer")]
        performers: Vec<i64>,
    },

    /// Cria um negócio
    CreateDeal {
        #[arg(short = 'n', long)]
        name: String,

        #[arg(long)]
        client_id: i64,

        /// ID ou nome da etapa; omitido = primeira etapa do único funil
        #[arg(short = 's', long)]
        stage: Option<StageRef>,

        #[arg(long, default_value_t = 0)]
        cost: i64,

        #[arg(long)]
        note: Option<String>,

        #[arg(long = "prop")]
        props: Vec<String>,
    },

    /// Atualiza um negócio
    UpdateDeal {
        id: i64,

        #[arg(short = 'n', long)]
        name: Option<String>,

        #[arg(short = 's', long)]
        stage: Option<StageRef>,

        #[arg(long)]
        cost: Option<i64>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long = "prop")]
        props: Vec<String>,
    },

    /// Envia uma mensagem para uma entidade
    CreateMessage {
        entity_id: i64,

        content: String,

        /// Organization, Client ou Deal
        #[arg(short = 'e', long, default_value = "Deal")]
        entity_type: EntityType,
    },
}

/// Resultado de um comando: payload bruto e, opcionalmente, linhas legíveis
struct CliResponse {
    data: Value,
    lines: Vec<String>,
}

impl CliResponse {
    fn data(data: Value) -> Self {
        Self { data, lines: Vec::new() }
    }

    fn list<T: Entity + Display>(items: &[T]) -> Self {
        Self {
            data: Value::Array(items.iter().map(|item| item.raw().clone()).collect()),
            lines: items.iter().map(ToString::to_string).collect(),
        }
    }

    fn entity<T: Entity>(item: &T) -> Self {
        Self::data(item.raw().clone())
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match execute_command(&cli).await {
        Ok(response) => output_response(response, &cli.output),
        Err(e) => {
            eprintln!("❌ Erro: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pachca=debug" } else { "pachca=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load().context("Failed to load settings")?;

    if let Some(path) = &cli.refresh_file {
        settings.refresh_file = path.clone();
    }
    if let Some(code) = &cli.code {
        settings.auth_code = Some(code.clone());
    }

    Ok(settings)
}

async fn execute_command(cli: &Cli) -> Result<CliResponse> {
    let settings = load_settings(cli)?;

    match &cli.command {
        Commands::Auth { force } => handle_auth(&settings, *force).await,
        Commands::Resource(command) => {
            let oauth = settings.oauth().with_prompt(StdinPrompt);
            let client = PachcaClient::connect_with(oauth, settings.client_options()).await?;
            run_resource_command(&client, command).await
        }
    }
}

async fn run_resource_command(client: &PachcaClient, command: &ResourceCommand) -> Result<CliResponse> {
    let response = match command {
        ResourceCommand::Funnels => CliResponse::list(&client.list_funnels().await?),

        ResourceCommand::Properties { kind } => {
            let properties = client.list_custom_properties(kind).await?;
            CliResponse::data(Value::Array(properties.iter().map(|p| p.raw().clone()).collect()))
        }

        ResourceCommand::Users => CliResponse::list(&client.list_users().await?),

        ResourceCommand::Clients { filters, union, sort, per, page } => {
            let mut query = ClientQuery::new().per(*per).page(*page);
            for filter in filters {
                query = query.filter(filter.clone());
            }
            if let Some(union) = union {
                query = query.union(union);
            }
            if let Some(sort) = sort {
                let (field, direction) = sort
                    .split_once(':')
                    .ok_or_else(|| anyhow!("--sort must look like field:direction"))?;
                query = query.sort(field, direction);
            }
            CliResponse::list(&client.list_clients(&query).await?)
        }

        ResourceCommand::CreateOrganization { name, inn, props } => {
            let properties = parse_props(props)?;
            client.validate_properties(EntityType::Organization, &properties).await?;
            let organization = NewOrganization {
                name: name.clone(),
                inn: inn.clone(),
                properties,
            };
            CliResponse::entity(&client.create_organization(&organization).await?)
        }

        ResourceCommand::CreateClient {
            full_name,
            phones,
            emails,
            address,
            organization_id,
            additional,
            tags,
            props,
        } => {
            let properties = parse_props(props)?;
            client.validate_properties(EntityType::Client, &properties).await?;
            let new_client = NewClient {
                full_name: full_name.clone(),
                phones: phones.clone(),
                emails: emails.clone(),
                address: address.clone(),
                organization_id: *organization_id,
                additional: additional.clone(),
                list_tags: tags.clone(),
                properties,
            };
            CliResponse::entity(&client.create_client(&new_client).await?)
        }

        ResourceCommand::CreateTask { kind, content, due, priority, performers } => {
            let task = NewTask {
                kind: *kind,
                content: content.clone(),
                due_at: due.as_deref().map(parse_due).transpose()?,
                priority: *priority,
                performer_ids: performers.clone(),
            };
            CliResponse::entity(&client.create_task(&task).await?)
        }

        ResourceCommand::CreateDeal { name, client_id, stage, cost, note, props } => {
            let properties = parse_props(props)?;
            client.validate_properties(EntityType::Deal, &properties).await?;
            let deal = NewDeal {
                name: name.clone(),
                client_id: *client_id,
                stage: stage.clone(),
                cost: *cost,
                properties,
                note: note.clone(),
            };
            CliResponse::entity(&client.create_deal(&deal).await?)
        }

        ResourceCommand::UpdateDeal { id, name, stage, cost, state, props } => {
            let properties = parse_props(props)?;
            client.validate_properties(EntityType::Deal, &properties).await?;
            let update = DealUpdate {
                name: name.clone(),
                stage: stage.clone(),
                cost: *cost,
                state: state.clone(),
                properties,
            };
            CliResponse::entity(&client.update_deal(*id, &update).await?)
        }

        ResourceCommand::CreateMessage { entity_id, content, entity_type } => {
            CliResponse::entity(&client.create_message(*entity_id, content.as_str(), *entity_type).await?)
        }
    };

    Ok(response)
}

async fn handle_auth(settings: &Settings, force: bool) -> Result<CliResponse> {
    let oauth = settings.oauth().with_prompt(StdinPrompt);

    if !force && oauth.has_stored_token() {
        return Ok(CliResponse::data(json!({
            "message": "Já autenticado. Use --force para reautenticar",
            "refresh_file": oauth.token_store().path().display().to_string(),
        })));
    }

    if force {
        oauth.forget_stored_token()?;
    }

    let token = oauth.acquire_access_token().await?;
    let preview: String = token.chars().take(4).collect();

    Ok(CliResponse::data(json!({
        "message": "Autenticação concluída com sucesso!",
        "token_preview": format!("{}...", preview),
        "refresh_file": oauth.token_store().path().display().to_string(),
    })))
}

/// `--prop ID=VALOR`; valores que são JSON válido (números, booleanos) vão tipados
fn parse_props(props: &[String]) -> Result<PropertyValues> {
    let pairs = props
        .iter()
        .map(|prop| {
            let (id, value) = prop
                .split_once('=')
                .ok_or_else(|| anyhow!("--prop must look like ID=VALUE, got '{}'", prop))?;
            let value = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()));
            Ok((id.to_string(), value))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PropertyValues::from_pairs(pairs)?)
}

/// Aceita `YYYY-MM-DD` (meia-noite UTC) ou RFC 3339
fn parse_due(text: &str) -> Result<String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Ok(datetime.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true));
    }

    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("Formato de data inválido: {}. Use YYYY-MM-DD ou RFC 3339", text))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Erro ao criar datetime"))?;

    Ok(DateTime::<Utc>::from_naive_utc_and_offset(datetime, Utc).to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn output_response(response: CliResponse, format: &OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", response.data),
        OutputFormat::Pretty => {
            println!("✅ Sucesso!");
            if response.lines.is_empty() {
                match serde_json::to_string_pretty(&response.data) {
                    Ok(text) => println!("{}", text),
                    Err(_) => println!("{}", response.data),
                }
            } else {
                for line in response.lines {
                    println!("{}", line);
                }
            }
        }
    }
}
