//src/main.rs

use axum::{
    middleware as axum_middleware,
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
mod middleware;
mod models;
mod scoring;
mod services;

use crate::config::{AppConfig, AppState};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

fn api_routes(app_state: AppState) -> Router<AppState> {
    let evaluation_routes = Router::new()
        .route("/"
               ,post(handlers::evaluations::create_evaluation)
               .get(handlers::evaluations::list_evaluations)
        )
        // Rotas estáticas têm prioridade sobre /{id}
        .route("/pending-count", get(handlers::evaluations::pending_evaluation_count))
        .route("/employee/{employee_id}", get(handlers::evaluations::list_employee_evaluations))
        .route("/pending/{employee_id}", get(handlers::evaluations::list_pending_evaluations))
        .route("/{id}"
               ,get(handlers::evaluations::get_evaluation)
               .delete(handlers::evaluations::delete_evaluation)
        )
        .route("/{id}/status", put(handlers::evaluations::update_status))
        .route("/{id}/objection"
               ,post(handlers::evaluations::submit_objection)
               .put(handlers::evaluations::handle_objection)
        )
        .route("/{id}/apply-rule", post(handlers::performance_rule::apply_rule))
        // Convites e compartilhamentos da avaliação
        .route("/{id}/invitations"
               ,post(handlers::invitations::create_invitations)
               .get(handlers::invitations::list_for_evaluation)
        )
        .route("/{id}/shares"
               ,post(handlers::shares::create_shares)
               .get(handlers::shares::list_for_evaluation)
        )
        .route("/{id}/shares/summary", get(handlers::shares::summary))
        // Prazos
        .route("/{id}/deadlines", get(handlers::settings::get_evaluation_deadlines))
        .route("/{id}/deadlines/validate", post(handlers::settings::validate_custom_deadlines));

    let score_routes = Router::new()
        .route("/{score_id}/self", put(handlers::evaluations::update_self_score))
        .route("/{score_id}/manager", put(handlers::evaluations::update_manager_score))
        .route("/{score_id}/hr", put(handlers::evaluations::update_hr_score))
        .route("/{score_id}/final", put(handlers::evaluations::update_final_score));

    let invitation_routes = Router::new()
        .route("/mine", get(handlers::invitations::list_mine))
        .route("/sent", get(handlers::invitations::list_sent))
        .route("/pending-count", get(handlers::invitations::pending_count))
        .route("/{id}"
               ,get(handlers::invitations::get_invitation)
               .delete(handlers::invitations::delete_invitation)
        )
        .route("/{id}/accept", put(handlers::invitations::accept_invitation))
        .route("/{id}/decline", put(handlers::invitations::decline_invitation))
        .route("/{id}/complete", put(handlers::invitations::complete_invitation))
        .route("/{id}/cancel", put(handlers::invitations::cancel_invitation))
        .route("/{id}/reinvite", put(handlers::invitations::reinvite))
        .route("/{id}/scores", get(handlers::invitations::get_scores));

    let template_routes = Router::new()
        .route("/"
               ,post(handlers::templates::create_template)
               .get(handlers::templates::list_templates)
        )
        .route("/{id}"
               ,get(handlers::templates::get_template)
               .put(handlers::templates::update_template)
               .delete(handlers::templates::delete_template)
        )
        .route("/{id}/items", post(handlers::templates::create_item));

    let item_routes = Router::new()
        .route("/{id}"
               ,get(handlers::templates::get_item)
               .put(handlers::templates::update_item)
               .delete(handlers::templates::delete_item)
        );

    let share_routes = Router::new()
        .route("/mine", get(handlers::shares::list_mine))
        .route("/{id}"
               ,get(handlers::shares::get_share)
               .delete(handlers::shares::delete_share)
        )
        .route("/{id}/scores", get(handlers::shares::get_scores))
        .route("/{id}/scores/{item_id}", put(handlers::shares::update_score))
        .route("/{id}/submit", put(handlers::shares::submit));

    let settings_routes = Router::new()
        .route("/deadline-rules"
               ,get(handlers::settings::get_deadline_rules)
               .put(handlers::settings::update_deadline_rules)
        );

    // Tudo abaixo de /api exige o token da plataforma, exceto o health
    Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/performance-rule"
               ,get(handlers::performance_rule::get_rule)
               .put(handlers::performance_rule::update_rule)
        )
        .route("/invited-scores/{score_id}", put(handlers::invitations::update_score))
        .nest("/evaluations", evaluation_routes)
        .nest("/scores", score_routes)
        .nest("/invitations", invitation_routes)
        .nest("/templates", template_routes)
        .nest("/items", item_routes)
        .nest("/shares", share_routes)
        .nest("/settings", settings_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state,
            auth_guard,
        ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", api_routes(app_state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
