use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Authenticated caller resolved by the upstream identity provider.
/// The gateway terminates authentication; this core trusts the resolved
/// identity and only checks tenant/provider ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub tenant_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Provider,
    FrontDesk,
    TenantAdmin,
    PlatformAdmin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "provider" => Some(Role::Provider),
            "front_desk" => Some(Role::FrontDesk),
            "tenant_admin" => Some(Role::TenantAdmin),
            "platform_admin" => Some(Role::PlatformAdmin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Provider => write!(f, "provider"),
            Role::FrontDesk => write!(f, "front_desk"),
            Role::TenantAdmin => write!(f, "tenant_admin"),
            Role::PlatformAdmin => write!(f, "platform_admin"),
        }
    }
}

impl Principal {
    /// Platform admins may act across tenants; everyone else is scoped.
    pub fn can_access_tenant(&self, tenant_id: Uuid) -> bool {
        self.role == Role::PlatformAdmin || self.tenant_id == tenant_id
    }
}
