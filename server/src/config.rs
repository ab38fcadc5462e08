//! Runtime settings for the game server

use std::time::Duration;

/// What the server does with a transition the session refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectionPolicy {
    /// Drop the request and log it at debug level
    #[default]
    Silent,
    /// Also send the offending client a `Rejected` packet with the reason
    Notify,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Cap on registered connections, seated or not
    pub max_connections: usize,
    /// Silence after which a connection counts as disconnected
    pub client_timeout: Duration,
    pub rejection_policy: RejectionPolicy,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_connections: 16,
            client_timeout: Duration::from_secs(5),
            rejection_policy: RejectionPolicy::Silent,
        }
    }
}
