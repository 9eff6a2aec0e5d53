// src/services/notification.rs

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    EvaluationCreated,
    EvaluationStatusChange,
    EvaluationDeleted,
    SelfScoreUpdated,
    ManagerScoreUpdated,
    HrScoreUpdated,
    FinalScoreUpdated,
    PerformanceRuleApplied,
    ObjectionSubmitted,
    ObjectionHandled,
    InvitationCreated,
    InvitationStatusChange,
    InvitationDeleted,
    InvitedScoreUpdated,
    ShareCreated,
    ShareSubmitted,
    ShareDeleted,
}

/// Saída de eventos para a plataforma externa.
///
/// Fire-and-forget: falhas ficam com a implementação e nunca voltam para a
/// operação que disparou o evento.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, actor_id: i64, event: NotificationEvent, payload: Value);
}

// Implementação de produção: evento estruturado no tracing
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, actor_id: i64, event: NotificationEvent, payload: Value) {
        tracing::info!(actor_id, event = ?event, %payload, "📣 Notificação emitida");
    }
}

/// Serializa para o payload sem deixar erro de serialização escapar.
pub fn payload<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::warn!("Falha ao serializar payload de notificação: {}", e);
        Value::Null
    })
}
