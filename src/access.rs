use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse privilege tier. A user holds exactly one role at a time; everything
/// an endpoint is allowed to do derives from the static permission set below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
    Ceo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// View and edit content entities (shops, schools, services, announcements).
    ManageContent,
    /// Review organization requests, send CEO notifications.
    Moderate,
    /// List users, change roles, toggle activity, delete accounts.
    ManageUsers,
    /// Assign and revoke shop seller grants.
    ManageSellers,
    /// Admin dashboard statistics.
    ViewStats,
}

impl Role {
    pub fn permissions(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::User => &[],
            Role::Moderator => &[ManageContent, Moderate, ViewStats],
            Role::Admin => &[ManageContent, Moderate, ManageUsers, ViewStats],
            Role::Ceo => &[ManageContent, Moderate, ManageUsers, ManageSellers, ViewStats],
        }
    }

    pub fn can(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::Ceo => "ceo",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            "ceo" => Ok(Role::Ceo),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::User, Role::Moderator, Role::Admin, Role::Ceo] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn plain_users_hold_no_permissions() {
        assert!(Role::User.permissions().is_empty());
        assert!(!Role::User.can(Permission::ManageContent));
    }

    #[test]
    fn only_ceo_manages_sellers() {
        assert!(Role::Ceo.can(Permission::ManageSellers));
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert!(!role.can(Permission::ManageSellers));
        }
    }

    #[test]
    fn moderators_cannot_manage_users() {
        assert!(Role::Moderator.can(Permission::Moderate));
        assert!(!Role::Moderator.can(Permission::ManageUsers));
        assert!(Role::Admin.can(Permission::ManageUsers));
    }
}
