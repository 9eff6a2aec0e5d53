pub mod auth;
pub mod deadline;
pub mod employee;
pub mod evaluation;
pub mod invitation;
pub mod performance_rule;
pub mod share;
pub mod template;
