use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub notify_webhook_url: Option<String>,
    pub slot_horizon_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok(),
            slot_horizon_days: env::var("SLOT_HORIZON_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(365),
        };

        if config.notify_webhook_url.is_none() {
            warn!("NOTIFY_WEBHOOK_URL not set, booking notifications disabled");
        }

        config
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notify_webhook_url.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            notify_webhook_url: None,
            slot_horizon_days: 365,
        }
    }
}
