// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Users ---
        handlers::auth::get_me,

        // --- Evaluations ---
        handlers::evaluations::create_evaluation,
        handlers::evaluations::list_evaluations,
        handlers::evaluations::get_evaluation,
        handlers::evaluations::list_employee_evaluations,
        handlers::evaluations::list_pending_evaluations,
        handlers::evaluations::pending_evaluation_count,
        handlers::evaluations::delete_evaluation,
        handlers::evaluations::update_status,
        handlers::evaluations::submit_objection,
        handlers::evaluations::handle_objection,

        // --- Scores ---
        handlers::evaluations::update_self_score,
        handlers::evaluations::update_manager_score,
        handlers::evaluations::update_hr_score,
        handlers::evaluations::update_final_score,

        // --- Templates ---
        handlers::templates::create_template,
        handlers::templates::list_templates,
        handlers::templates::get_template,
        handlers::templates::update_template,
        handlers::templates::delete_template,
        handlers::templates::create_item,
        handlers::templates::get_item,
        handlers::templates::update_item,
        handlers::templates::delete_item,

        // --- Performance Rule ---
        handlers::performance_rule::get_rule,
        handlers::performance_rule::update_rule,
        handlers::performance_rule::apply_rule,

        // --- Invitations ---
        handlers::invitations::create_invitations,
        handlers::invitations::list_for_evaluation,
        handlers::invitations::list_mine,
        handlers::invitations::list_sent,
        handlers::invitations::pending_count,
        handlers::invitations::get_invitation,
        handlers::invitations::accept_invitation,
        handlers::invitations::decline_invitation,
        handlers::invitations::complete_invitation,
        handlers::invitations::cancel_invitation,
        handlers::invitations::reinvite,
        handlers::invitations::delete_invitation,
        handlers::invitations::get_scores,
        handlers::invitations::update_score,

        // --- Shares ---
        handlers::shares::create_shares,
        handlers::shares::list_for_evaluation,
        handlers::shares::summary,
        handlers::shares::list_mine,
        handlers::shares::get_share,
        handlers::shares::delete_share,
        handlers::shares::get_scores,
        handlers::shares::update_score,
        handlers::shares::submit,

        // --- Settings ---
        handlers::settings::get_deadline_rules,
        handlers::settings::update_deadline_rules,
        handlers::settings::get_evaluation_deadlines,
        handlers::settings::validate_custom_deadlines,
    ),
    components(
        schemas(
            // --- Cadastro ---
            models::employee::EmployeeRole,
            models::employee::Employee,

            // --- Evaluations ---
            models::evaluation::EvaluationStatus,
            models::evaluation::ReviewPeriod,
            models::evaluation::Evaluation,
            models::evaluation::ScoreItem,
            models::evaluation::EvaluationDetail,
            models::evaluation::EvaluationPage,
            models::evaluation::PendingCount,
            models::evaluation::CreateEvaluationPayload,
            models::evaluation::UpdateStatusPayload,
            models::evaluation::ScorePayload,
            models::evaluation::ObjectionPayload,
            models::evaluation::ResolveObjectionPayload,

            // --- Templates ---
            models::template::KpiTemplate,
            models::template::KpiItem,
            models::template::TemplateDetail,
            models::template::TemplatePayload,
            models::template::ItemPayload,

            // --- Performance Rule ---
            models::performance_rule::NoInvitationWeights,
            models::performance_rule::EmployeeInvitationWeights,
            models::performance_rule::WithInvitationWeights,
            models::performance_rule::PerformanceRule,
            models::performance_rule::PerformanceRulePayload,

            // --- Invitations ---
            models::invitation::InvitationStatus,
            models::invitation::Invitation,
            models::invitation::InvitedScore,
            models::invitation::InvitationWithScores,
            models::invitation::CreateInvitationPayload,

            // --- Shares ---
            models::share::ShareStatus,
            models::share::EvaluationShare,
            models::share::ShareScore,
            models::share::ShareScoreEntry,
            models::share::ShareItemSummary,
            models::share::CreateSharePayload,

            // --- Deadlines ---
            models::deadline::DeadlineDays,
            models::deadline::TimeThreshold,
            models::deadline::DeadlineRules,
            models::deadline::TimeMode,
            models::deadline::DeadlineSet,
            models::deadline::CustomDeadlinesPayload,
        )
    ),
    tags(
        (name = "Users", description = "Colaborador autenticado"),
        (name = "Evaluations", description = "Agendamento e fluxo das avaliações de KPI"),
        (name = "Scores", description = "Notas por item (autoavaliação, gestor, RH, final)"),
        (name = "Templates", description = "Modelos de avaliação e itens de KPI"),
        (name = "Performance Rule", description = "Pesos e cálculo automático da nota de RH"),
        (name = "Invitations", description = "Avaliação por colegas convidados"),
        (name = "Shares", description = "Revisões delegadas"),
        (name = "Settings", description = "Regras de prazo e prazos por avaliação")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
