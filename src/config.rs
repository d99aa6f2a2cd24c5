// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{PersistenceGateway, PgGateway},
    i18n::I18nStore,
    services::{
        intake_service::{DEFAULT_SEARCH_WAIT, DEFAULT_SESSION_IDLE}, ActivityLogService, FamilyService,
        IndividualService, IntakeService, NeedService,
    },
};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// Variável opcional: ausente usa o padrão, inválida é erro
fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} inválida: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub bind_addr: String,
    pub i18n_store: I18nStore,

    pub individual_service: IndividualService,
    pub family_service: FamilyService,
    pub need_service: NeedService,
    pub activity_log_service: ActivityLogService,
    pub intake_service: IntakeService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let max_connections = env_or("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let search_wait = env_or(
            "FAMILY_SEARCH_DEBOUNCE_MS",
            DEFAULT_SEARCH_WAIT.as_millis() as u64,
        )
        .map(Duration::from_millis)?;
        let session_idle = env_or(
            "SESSION_IDLE_TIMEOUT_SECS",
            DEFAULT_SESSION_IDLE.as_secs(),
        )
        .map(Duration::from_secs)?;

        let db_pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let i18n_store = I18nStore::load()?;

        // --- Monta o gráfico de dependências ---
        let gateway: Arc<dyn PersistenceGateway> = Arc::new(PgGateway::new(db_pool.clone()));
        let activity_log_service = ActivityLogService::new(gateway.clone());
        let family_service = FamilyService::new(gateway.clone());
        let need_service = NeedService::new(gateway.clone());
        let individual_service = IndividualService::new(gateway, activity_log_service.clone());
        let intake_service = IntakeService::new(
            individual_service.clone(),
            family_service.clone(),
            search_wait,
            session_idle,
        );

        Ok(Self {
            db_pool,
            bind_addr,
            i18n_store,
            individual_service,
            family_service,
            need_service,
            activity_log_service,
            intake_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_uses_default() {
        let value: u32 = env_or("INTAKE_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
