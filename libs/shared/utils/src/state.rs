use std::sync::Arc;

use shared_config::AppConfig;
use shared_store::SchedulingStore;

use crate::notify::Notifier;

/// Shared application state: the configuration, the store resource and the
/// notification client, constructed once at startup and injected into every
/// router.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<SchedulingStore>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let notifier = Notifier::new(config.notify_webhook_url.clone());
        Self {
            config,
            store: Arc::new(SchedulingStore::new()),
            notifier,
        }
    }
}
