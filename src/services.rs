pub mod auth;
pub mod deadline_service;
pub mod evaluation_service;
pub mod invitation_service;
pub mod notification;
pub mod performance_rule_service;
pub mod share_service;
pub mod template_service;
