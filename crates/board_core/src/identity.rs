use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role '{other}' (expected admin or user)")),
        }
    }
}

/// The caller's user record (`GET /auth/me/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

/// Account row from the admin user list (`GET /auth/users/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
}

/// Partial profile change for `PATCH /auth/users/{id}/`. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }
}

/// Which role, if any, a session must hold to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleRequirement {
    #[default]
    Any,
    Exactly(Role),
}

impl RoleRequirement {
    pub fn is_satisfied_by(&self, identity: &UserIdentity) -> bool {
        match self {
            RoleRequirement::Any => true,
            RoleRequirement::Exactly(role) => identity.role == *role,
        }
    }
}

/// Persisted storage keys for one session namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub access_token: String,
    pub refresh_token: String,
    pub user: String,
}

impl StorageKeys {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user: user.into(),
        }
    }

    pub fn all(&self) -> [&str; 3] {
        [&self.access_token, &self.refresh_token, &self.user]
    }
}

/// The two front-ends. They keep independent sessions in the same store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Surface {
    #[default]
    Public,
    Admin,
}

impl Surface {
    pub fn storage_keys(&self) -> StorageKeys {
        match self {
            Surface::Public => StorageKeys::new("access_token", "refresh_token", "user_info"),
            Surface::Admin => StorageKeys::new(
                "admin_access_token",
                "admin_refresh_token",
                "admin_user",
            ),
        }
    }

    /// The admin surface only accepts the elevated role.
    pub fn role_requirement(&self) -> RoleRequirement {
        match self {
            Surface::Public => RoleRequirement::Any,
            Surface::Admin => RoleRequirement::Exactly(Role::Admin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> UserIdentity {
        UserIdentity {
            id: 7,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn surfaces_use_disjoint_keys() {
        let public = Surface::Public.storage_keys();
        let admin = Surface::Admin.storage_keys();
        for key in public.all() {
            assert!(!admin.all().contains(&key), "key {key} collides");
        }
    }

    #[test]
    fn admin_surface_requires_admin_role() {
        let requirement = Surface::Admin.role_requirement();
        assert!(requirement.is_satisfied_by(&identity(Role::Admin)));
        assert!(!requirement.is_satisfied_by(&identity(Role::User)));
        assert!(Surface::Public
            .role_requirement()
            .is_satisfied_by(&identity(Role::User)));
    }

    #[test]
    fn identity_uses_lowercase_roles_on_the_wire() {
        let json = serde_json::to_value(identity(Role::Admin)).expect("serialize");
        assert_eq!(json["role"], "admin");

        let parsed: UserIdentity = serde_json::from_str(
            r#"{"id": 1, "username": "bob", "email": "b@x.io", "role": "user"}"#,
        )
        .expect("parse");
        assert_eq!(parsed.role, Role::User);
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let parsed = serde_json::from_str::<UserIdentity>(
            r#"{"id": 1, "username": "bob", "email": "", "role": "owner"}"#,
        );
        assert!(parsed.is_err());
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(" Admin ".parse::<Role>(), Ok(Role::Admin));
    }

    #[test]
    fn user_rows_tolerate_missing_fields() {
        let account: UserAccount = serde_json::from_value(serde_json::json!({
            "id": 3,
            "username": "grace",
            "date_joined": "2024-02-01T09:30:00Z"
        }))
        .unwrap();
        assert_eq!(account.role, Role::User);
        assert!(account.email.is_empty());
        assert!(account.date_joined.is_some());
    }

    #[test]
    fn profile_update_sends_only_set_fields() {
        let update = ProfileUpdate {
            email: Some("new@example.com".to_string()),
            ..ProfileUpdate::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"email": "new@example.com"})
        );
        assert!(ProfileUpdate::default().is_empty());
    }
}
