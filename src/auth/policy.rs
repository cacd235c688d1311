use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User roles. Master admins are the only users without a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    MasterAdmin,
    TenantAdmin,
    Staff,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct RoleParseError(pub String);

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::MasterAdmin => "master_admin",
            Role::TenantAdmin => "tenant_admin",
            Role::Staff => "staff",
        }
    }

    pub fn is_tenant_bound(&self) -> bool {
        !matches!(self, Role::MasterAdmin)
    }

    pub fn can(&self, action: Action) -> bool {
        use Action::*;
        match self {
            Role::MasterAdmin => true,
            Role::TenantAdmin => !matches!(action, ManageTenants),
            Role::Staff => matches!(action, ReadContent | WriteContent | ReadNotifications),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "master_admin" => Ok(Role::MasterAdmin),
            "tenant_admin" => Ok(Role::TenantAdmin),
            "staff" => Ok(Role::Staff),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = RoleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Things a request may attempt; checked against the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadContent,
    WriteContent,
    PurgeContent,
    ManageUsers,
    ViewActivity,
    ManageTenants,
    ReadNotifications,
}

impl Action {
    pub fn describe(&self) -> &'static str {
        match self {
            Action::ReadContent => "read documents and folders",
            Action::WriteContent => "modify documents and folders",
            Action::PurgeContent => "permanently delete documents",
            Action::ManageUsers => "manage users",
            Action::ViewActivity => "view tenant activity",
            Action::ManageTenants => "manage tenants",
            Action::ReadNotifications => "read notifications",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Action; 7] = [
        Action::ReadContent,
        Action::WriteContent,
        Action::PurgeContent,
        Action::ManageUsers,
        Action::ViewActivity,
        Action::ManageTenants,
        Action::ReadNotifications,
    ];

    #[test]
    fn master_admin_can_do_everything() {
        assert!(ALL.iter().all(|a| Role::MasterAdmin.can(*a)));
    }

    #[test]
    fn tenant_admin_cannot_manage_tenants() {
        for action in ALL {
            assert_eq!(Role::TenantAdmin.can(action), action != Action::ManageTenants, "{:?}", action);
        }
    }

    #[test]
    fn staff_is_limited_to_content_and_notifications() {
        let allowed: Vec<Action> = ALL.into_iter().filter(|a| Role::Staff.can(*a)).collect();
        assert_eq!(allowed, vec![Action::ReadContent, Action::WriteContent, Action::ReadNotifications]);
    }

    #[test]
    fn roles_round_trip_through_strings() {
        for role in [Role::MasterAdmin, Role::TenantAdmin, Role::Staff] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
        assert!(!Role::MasterAdmin.is_tenant_bound());
        assert!(Role::Staff.is_tenant_bound());
    }
}
