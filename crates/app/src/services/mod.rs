pub mod app_service;
pub mod errors_manager;
pub mod tab_state;
