//! Roles and the permission map derived from them.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Lifetime of an admin-role token.
const ADMIN_TOKEN_LIFETIME_MINS: i64 = 15;

/// Lifetime of a user-role token.
const USER_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Caller role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Role for an allow-list membership answer.
    pub fn from_admin(is_admin: bool) -> Self {
        if is_admin { Role::Admin } else { Role::User }
    }

    /// How long a token issued for this role stays valid.
    pub fn token_lifetime(self) -> Duration {
        match self {
            Role::Admin => Duration::minutes(ADMIN_TOKEN_LIFETIME_MINS),
            Role::User => Duration::hours(USER_TOKEN_LIFETIME_HOURS),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadContent,
    WriteContent,
    ManageUsers,
    ManageSystem,
}

impl Permission {
    /// Claim key for this permission.
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ReadContent => "canReadContent",
            Permission::WriteContent => "canWriteContent",
            Permission::ManageUsers => "canManageUsers",
            Permission::ManageSystem => "canManageSystem",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission map carried in the token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_read_content: bool,
    pub can_write_content: bool,
    pub can_manage_users: bool,
    pub can_manage_system: bool,
}

impl Permissions {
    /// Permission map as a pure function of role.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self::all(),
            Role::User => Self {
                can_read_content: true,
                can_write_content: false,
                can_manage_users: false,
                can_manage_system: false,
            },
        }
    }

    pub fn all() -> Self {
        Self {
            can_read_content: true,
            can_write_content: true,
            can_manage_users: true,
            can_manage_system: true,
        }
    }

    /// Whether `permission` is granted.
    pub fn grants(&self, permission: Permission) -> bool {
        match permission {
            Permission::ReadContent => self.can_read_content,
            Permission::WriteContent => self.can_write_content,
            Permission::ManageUsers => self.can_manage_users,
            Permission::ManageSystem => self.can_manage_system,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Permission; 4] = [
        Permission::ReadContent,
        Permission::WriteContent,
        Permission::ManageUsers,
        Permission::ManageSystem,
    ];

    #[test]
    fn admin_gets_every_permission() {
        let perms = Permissions::for_role(Role::Admin);
        assert!(ALL.iter().all(|p| perms.grants(*p)));
    }

    #[test]
    fn user_only_reads() {
        let perms = Permissions::for_role(Role::User);
        assert!(perms.grants(Permission::ReadContent));
        assert!(!perms.grants(Permission::WriteContent));
        assert!(!perms.grants(Permission::ManageUsers));
        assert!(!perms.grants(Permission::ManageSystem));
    }

    #[test]
    fn lifetimes_by_role() {
        assert_eq!(Role::Admin.token_lifetime(), Duration::minutes(15));
        assert_eq!(Role::User.token_lifetime(), Duration::hours(24));
    }

    #[test]
    fn permissions_serialize_with_claim_keys() {
        let json = serde_json::to_value(Permissions::for_role(Role::User)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "canReadContent": true,
                "canWriteContent": false,
                "canManageUsers": false,
                "canManageSystem": false,
            })
        );
        for p in ALL {
            assert!(json.get(p.as_str()).is_some(), "missing {p}");
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "admin");
        assert_eq!(
            serde_json::from_value::<Role>(serde_json::json!("user")).unwrap(),
            Role::User
        );
        assert!(serde_json::from_value::<Role>(serde_json::json!("root")).is_err());
    }
}
