pub mod app_settings;
pub mod messages;
pub mod network;
pub mod refresher;
pub mod store;
