pub mod manager;
pub mod models;

pub use manager::ConfigManager;
pub use models::{AuthConfig, ClientConfig};
