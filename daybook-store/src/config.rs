//! Remote store configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the remote row store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the backend project (e.g., "https://myproject.example.co").
    pub base_url: String,

    /// Publishable API key sent with every request.
    pub anon_key: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:54321".to_string(),
            anon_key: String::new(),
            timeout_secs: 30,
        }
    }
}
