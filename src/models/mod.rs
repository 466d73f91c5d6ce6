pub mod correction;
pub mod question;
pub mod template;
