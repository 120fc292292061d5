use crate::config::AppConfig;
use crate::db::{DbPool, OrmConn};
use crate::gateway::StripeGateway;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: AppConfig,
    pub gateway: StripeGateway,
}
