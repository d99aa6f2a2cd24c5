//src/main.rs

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod i18n;
mod intake;
mod middleware;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; sem ele, "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let app_state = AppState::new().await?;

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Sessões paradas do assistente são descartadas em segundo plano
    app_state.intake_service.spawn_reaper();

    // Assistente de cadastro (sessões em memória)
    let intake_routes = Router::new()
        .route("/sessions", post(handlers::intake::create_session))
        .route(
            "/sessions/{id}",
            get(handlers::intake::get_session).delete(handlers::intake::discard_session),
        )
        .route(
            "/sessions/{id}/fields",
            put(handlers::intake::set_field).get(handlers::intake::get_field),
        )
        .route("/sessions/{id}/next", post(handlers::intake::next_step))
        .route("/sessions/{id}/previous", post(handlers::intake::previous_step))
        .route("/sessions/{id}/goto", post(handlers::intake::goto_step))
        .route("/sessions/{id}/children", post(handlers::intake::add_child))
        .route("/sessions/{id}/members", post(handlers::intake::add_member))
        .route("/sessions/{id}/needs", post(handlers::intake::add_need))
        .route(
            "/sessions/{id}/members/{key}",
            delete(handlers::intake::remove_member),
        )
        .route(
            "/sessions/{id}/needs/{key}",
            delete(handlers::intake::remove_need),
        )
        .route(
            "/sessions/{id}/children/{key}/removal",
            post(handlers::intake::request_child_removal),
        )
        .route(
            "/sessions/{id}/children/removal",
            delete(handlers::intake::cancel_child_removal),
        )
        .route(
            "/sessions/{id}/children/removal/confirm",
            post(handlers::intake::confirm_child_removal),
        )
        .route(
            "/sessions/{id}/family-search",
            post(handlers::intake::search_families).get(handlers::intake::get_family_results),
        )
        .route("/sessions/{id}/submit", post(handlers::intake::submit));

    let individual_routes = Router::new()
        .route("/", get(handlers::individuals::list_individuals))
        .route(
            "/{id}",
            get(handlers::individuals::get_individual)
                .delete(handlers::individuals::delete_individual),
        )
        .route("/{id}/record", get(handlers::individuals::get_individual_record));

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/families", get(handlers::families::search_families))
        .route("/api/needs", get(handlers::needs::list_needs))
        .route("/api/activity-logs", get(handlers::activity_logs::list_activity_logs))
        .nest("/api/intake", intake_routes)
        .nest("/api/individuals", individual_routes)
        .with_state(app_state.clone());

    // Inicia o servidor
    let listener = TcpListener::bind(&app_state.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
