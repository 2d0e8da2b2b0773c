pub mod ai_service;
pub mod auth_service;
pub mod config_service;
pub mod history_service;
pub mod llm_client;
pub mod network_service;
pub mod store_service;
pub mod usage_service;
