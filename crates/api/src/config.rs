//! Runtime settings for the HTTP server.

use notify::RetryConfig;

/// LIFF page URLs the bot links to.
#[derive(Debug, Clone, Default)]
pub struct LiffUrls {
    pub register: String,
    pub borrow: String,
    pub settings: String,
}

/// Everything the handlers need besides the pool, notifier and alert policy.
#[derive(Clone)]
pub struct ServerConfig {
    /// Channel secret used to verify `x-line-signature`.
    pub line_channel_secret: String,
    /// Bearer token required on `/api/admin/*`.
    pub admin_token: String,
    pub liff: LiffUrls,
    pub retry: RetryConfig,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("line_channel_secret", &"<redacted>")
            .field("admin_token", &"<redacted>")
            .field("liff", &self.liff)
            .field("retry", &self.retry)
            .finish()
    }
}
