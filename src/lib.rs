pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::services::{
    correction_service::CorrectionService, template_service::TemplateService,
};

#[derive(Clone)]
pub struct AppState {
    pub template_service: TemplateService,
    pub correction_service: CorrectionService,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let template_service = TemplateService::new(config.max_version_count);
        let correction_service =
            CorrectionService::new(template_service.clone(), config.max_batch_size);

        Self {
            template_service,
            correction_service,
        }
    }
}
