// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        PgEmployeeRepository, PgEvaluationRepository, PgInvitationRepository,
        PgPerformanceRuleRepository, PgSettingsRepository, PgShareRepository, PgTemplateRepository,
    },
    services::{
        auth::AuthService,
        deadline_service::DeadlineService,
        evaluation_service::EvaluationService,
        invitation_service::InvitationService,
        notification::{LogNotifier, Notifier},
        performance_rule_service::PerformanceRuleService,
        share_service::ShareService,
        template_service::TemplateService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {}", raw))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self { database_url, jwt_secret, bind_addr, db_max_connections })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub evaluation_service: EvaluationService,
    pub rule_service: PerformanceRuleService,
    pub invitation_service: InvitationService,
    pub share_service: ShareService,
    pub deadline_service: DeadlineService,
    pub template_service: TemplateService,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config.jwt_secret.clone()))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, jwt_secret: String) -> Self {
        let employee_repo = Arc::new(PgEmployeeRepository::new(db_pool.clone()));
        let evaluation_repo = Arc::new(PgEvaluationRepository::new(db_pool.clone()));
        let invitation_repo = Arc::new(PgInvitationRepository::new(db_pool.clone()));
        let rule_repo = Arc::new(PgPerformanceRuleRepository::new(db_pool.clone()));
        let share_repo = Arc::new(PgShareRepository::new(db_pool.clone()));
        let settings_repo = Arc::new(PgSettingsRepository::new(db_pool.clone()));
        let template_repo = Arc::new(PgTemplateRepository::new(db_pool.clone()));
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

        let auth_service = AuthService::new(employee_repo.clone(), jwt_secret);
        let rule_service = PerformanceRuleService::new(
            rule_repo,
            evaluation_repo.clone(),
            invitation_repo.clone(),
            notifier.clone(),
        );
        let evaluation_service = EvaluationService::new(
            evaluation_repo.clone(),
            employee_repo.clone(),
            invitation_repo.clone(),
            rule_service.clone(),
            notifier.clone(),
        );
        let invitation_service = InvitationService::new(
            invitation_repo,
            evaluation_repo.clone(),
            employee_repo.clone(),
            evaluation_service.clone(),
            notifier.clone(),
        );
        let share_service = ShareService::new(share_repo, evaluation_repo.clone(), employee_repo, notifier);
        let deadline_service = DeadlineService::new(settings_repo, evaluation_repo);
        let template_service = TemplateService::new(template_repo);

        Self {
            db_pool,
            auth_service,
            evaluation_service,
            rule_service,
            invitation_service,
            share_service,
            deadline_service,
            template_service,
        }
    }
}
