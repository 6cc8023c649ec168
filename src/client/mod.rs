//! Cliente dos recursos da API Pachca

pub mod api;
pub mod query;
pub mod requests;

pub use api::{default_stage, resolve_stage_name, ClientOptions, PachcaClient};
pub use query::{ClientFilter, ClientQuery};
pub use requests::{DealUpdate, NewClient, NewDeal, NewMessage, NewOrganization, NewTask, StageRef};
