pub mod autofill_service;
pub mod chat_completion_service;
pub mod form_session_store;
pub mod image_storage_service;
