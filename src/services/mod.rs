pub mod correction_service;
pub mod example_templates;
pub mod export_service;
pub mod grading_service;
pub mod template_service;
