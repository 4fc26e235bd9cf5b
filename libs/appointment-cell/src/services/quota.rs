use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::scheduling::ResourceKind;
use shared_store::SchedulingStore;

/// Admission decision for creating one more resource of a kind.
#[derive(Debug, Clone, PartialEq)]
pub enum QuotaDecision {
    Allowed,
    Denied {
        kind: ResourceKind,
        current: i64,
        limit: i64,
    },
}

/// Counter-based admission check against the tenant's plan limits.
/// Consulted immediately before the booking transaction; the limit stays
/// soft under concurrency (two callers can both observe limit-1), which is
/// an accepted property of the design.
pub struct QuotaGateService {
    store: Arc<SchedulingStore>,
}

impl QuotaGateService {
    pub fn new(store: Arc<SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn check_and_reserve(&self, tenant_id: Uuid, kind: ResourceKind) -> QuotaDecision {
        let (current, limit) = self.store.usage_and_limit(tenant_id, kind).await;

        match limit {
            // Unlimited plan.
            None => QuotaDecision::Allowed,
            // Strictly less: the counter reflects existing resources and the
            // check gates creating one more.
            Some(limit) if current < limit => {
                debug!(
                    "Quota check passed for tenant {} ({}: {}/{})",
                    tenant_id, kind, current, limit
                );
                QuotaDecision::Allowed
            }
            Some(limit) => {
                warn!(
                    "Quota denied for tenant {} ({}: {}/{})",
                    tenant_id, kind, current, limit
                );
                QuotaDecision::Denied {
                    kind,
                    current,
                    limit,
                }
            }
        }
    }
}
