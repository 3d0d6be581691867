//! Emulator configuration

use serde::{Deserialize, Serialize};

/// Emulator server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// The single account served by the emulator
    pub account_id: String,
    /// Application key accepted for that account
    pub application_key: String,
    /// Base URL advertised to clients; derived from the `Host` header when unset
    pub public_url: Option<String>,
    /// Maximum upload size (bytes)
    pub max_upload_size: usize,
    /// Page size used when a listing omits `maxFileCount`
    pub default_page_size: usize,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8180,
            account_id: "emulator-account".to_string(),
            application_key: "emulator-key".to_string(),
            public_url: None,
            max_upload_size: 100 * 1024 * 1024, // 100 MB
            default_page_size: 100,
        }
    }
}

impl EmulatorConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
