pub mod correction;
pub mod export;
pub mod health;
pub mod reports;
pub mod templates;
