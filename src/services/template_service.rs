// src/services/template_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::TemplateRepository,
    models::{
        employee::Employee,
        template::{ItemPayload, KpiItem, KpiTemplate, TemplateDetail, TemplatePayload},
    },
};

/// Cadastro de modelos de avaliação e seus itens de KPI.
///
/// Leitura é livre para qualquer autenticado; escrita é do RH. Modelo ou
/// item já usado por uma avaliação não pode ser excluído.
#[derive(Clone)]
pub struct TemplateService {
    template_repo: Arc<dyn TemplateRepository>,
}

impl TemplateService {
    pub fn new(template_repo: Arc<dyn TemplateRepository>) -> Self {
        Self { template_repo }
    }

    fn require_hr(actor: &Employee) -> Result<(), AppError> {
        if actor.is_hr() {
            Ok(())
        } else {
            Err(AppError::forbidden("Apenas o RH mantém os modelos de avaliação"))
        }
    }

    async fn find(&self, id: i64) -> Result<KpiTemplate, AppError> {
        self.template_repo
            .find_template(id)
            .await?
            .ok_or_else(|| AppError::not_found("Modelo de avaliação"))
    }

    pub async fn list(&self) -> Result<Vec<KpiTemplate>, AppError> {
        self.template_repo.list_templates().await
    }

    pub async fn get(&self, id: i64) -> Result<TemplateDetail, AppError> {
        let template = self.find(id).await?;
        let items = self.template_repo.list_items(id).await?;
        Ok(TemplateDetail { template, items })
    }

    pub async fn create(&self, actor: &Employee, input: TemplatePayload) -> Result<KpiTemplate, AppError> {
        Self::require_hr(actor)?;
        let template = self.template_repo.create_template(&input).await?;
        tracing::info!(template_id = template.id, "✅ Modelo de avaliação criado");
        Ok(template)
    }

    pub async fn update(&self, actor: &Employee, id: i64, input: TemplatePayload) -> Result<KpiTemplate, AppError> {
        Self::require_hr(actor)?;
        self.template_repo
            .update_template(id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("Modelo de avaliação"))
    }

    pub async fn delete(&self, actor: &Employee, id: i64) -> Result<(), AppError> {
        Self::require_hr(actor)?;
        self.find(id).await?;
        if self.template_repo.template_in_use(id).await? {
            return Err(AppError::invalid_state("Modelo em uso por avaliações não pode ser excluído"));
        }
        if !self.template_repo.delete_template(id).await? {
            return Err(AppError::not_found("Modelo de avaliação"));
        }
        tracing::info!(template_id = id, "🗑️ Modelo de avaliação excluído");
        Ok(())
    }

    // ---
    // Itens
    // ---

    fn check_item(input: &ItemPayload) -> Result<(), AppError> {
        if input.max_score_or_default() < Decimal::ZERO {
            return Err(AppError::invalid_input("A nota máxima não pode ser negativa"));
        }
        Ok(())
    }

    pub async fn find_item(&self, id: i64) -> Result<KpiItem, AppError> {
        self.template_repo
            .find_item(id)
            .await?
            .ok_or_else(|| AppError::not_found("Item de KPI"))
    }

    pub async fn create_item(&self, actor: &Employee, template_id: i64, input: ItemPayload) -> Result<KpiItem, AppError> {
        Self::require_hr(actor)?;
        Self::check_item(&input)?;
        self.find(template_id).await?;

        let item = self.template_repo.create_item(template_id, &input).await?;
        tracing::info!(template_id, item_id = item.id, "✅ Item de KPI criado");
        Ok(item)
    }

    pub async fn update_item(&self, actor: &Employee, id: i64, input: ItemPayload) -> Result<KpiItem, AppError> {
        Self::require_hr(actor)?;
        Self::check_item(&input)?;
        self.template_repo
            .update_item(id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("Item de KPI"))
    }

    pub async fn delete_item(&self, actor: &Employee, id: i64) -> Result<(), AppError> {
        Self::require_hr(actor)?;
        self.find_item(id).await?;
        if self.template_repo.item_in_use(id).await? {
            return Err(AppError::invalid_state("Item com notas lançadas não pode ser excluído"));
        }
        if !self.template_repo.delete_item(id).await? {
            return Err(AppError::not_found("Item de KPI"));
        }
        tracing::info!(item_id = id, "🗑️ Item de KPI excluído");
        Ok(())
    }
}
