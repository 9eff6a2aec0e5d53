pub mod repositories;
pub use repositories::{
    EmployeeRepository, EvaluationRepository, InvitationRepository, PerformanceRuleRepository,
    SettingsRepository, ShareRepository, TemplateRepository,
};

pub mod employee_repo;
pub use employee_repo::PgEmployeeRepository;
pub mod evaluation_repo;
pub use evaluation_repo::PgEvaluationRepository;
pub mod invitation_repo;
pub use invitation_repo::PgInvitationRepository;
pub mod performance_rule_repo;
pub use performance_rule_repo::PgPerformanceRuleRepository;
pub mod share_repo;
pub use share_repo::PgShareRepository;
pub mod settings_repo;
pub use settings_repo::PgSettingsRepository;
pub mod template_repo;
pub use template_repo::PgTemplateRepository;

#[cfg(test)]
pub mod memory;
