// src/scoring.rs
//
// Cálculo puro: nenhum acesso a banco, a regra chega sempre por parâmetro.

pub mod aggregator;
pub mod engine;

pub use aggregator::{summarize_invitations, InvitationSummary, ItemAverage, Scenario};
pub use engine::{evaluate_rule, HrScoreUpdate, RuleOutcome};
