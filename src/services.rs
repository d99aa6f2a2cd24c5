pub mod activity_log_service;
pub use activity_log_service::ActivityLogService;
pub mod family_service;
pub use family_service::FamilyService;
pub mod individual_service;
pub use individual_service::IndividualService;
pub mod intake_service;
pub use intake_service::IntakeService;
pub mod need_service;
pub use need_service::NeedService;
