pub mod correction_dto;
pub mod template_dto;
