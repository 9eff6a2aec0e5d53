pub mod auth;
pub mod evaluations;
pub mod invitations;
pub mod performance_rule;
pub mod settings;
pub mod shares;
pub mod templates;
