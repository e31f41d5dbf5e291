pub mod document_service;
pub mod user_service;
