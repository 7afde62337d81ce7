pub mod catalog;
pub mod farm_fetch;
pub mod http_client;
pub mod persist;
pub mod provider;
pub mod render;
pub mod settings;
pub mod state;
pub mod throttle;
pub mod timers;
