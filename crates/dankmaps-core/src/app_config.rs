use std::net::SocketAddr;
use std::path::PathBuf;

use crate::update::UnknownUpdatePolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub seed_path: PathBuf,
    pub feed_url: String,
    pub feed_timeout_ms: u64,
    pub feed_max_retries: u32,
    pub feed_retry_backoff_ms: u64,
    pub feed_user_agent: String,
    pub unknown_update_policy: UnknownUpdatePolicy,
    pub favorites_path: PathBuf,
}
