//! Connection parameters for [`crate::BamClient`].

use std::time::Duration;

use bam_util::redacted::RedactedString;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: RedactedString,
    pub api_version: String,
    pub verify_ssl: bool,
    pub max_connections: usize,
    pub max_keepalive: usize,
    pub request_timeout: Duration,
    pub allow_dangerous_operations: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: RedactedString::new(String::new()),
            api_version: "v2".to_string(),
            verify_ssl: true,
            max_connections: 50,
            max_keepalive: 20,
            request_timeout: Duration::from_secs(30),
            allow_dangerous_operations: false,
        }
    }
}
