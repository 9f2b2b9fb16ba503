/// Accounts and per-request session context.
///
/// Credentials are plain-text entries in the configuration file; this is an
/// internal portal login, not a security boundary.
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("{action} requires the admin role (current user: {username})")]
    PermissionDenied {
        action: &'static str,
        username: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Guest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub department: String,
    pub role: Role,
}

impl UserAccount {
    fn new(
        username: &str,
        password: &str,
        display_name: &str,
        department: &str,
        role: Role,
    ) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            display_name: display_name.to_string(),
            department: department.to_string(),
            role,
        }
    }
}

/// Seed accounts written into a freshly generated config.
pub fn default_accounts() -> Vec<UserAccount> {
    vec![
        UserAccount::new("admin", "admin123", "系统管理员", "管理中心", Role::Admin),
        UserAccount::new("user1", "123456", "公卫专员", "公共卫生团组", Role::User),
        UserAccount::new("user2", "123456", "教育专员", "教育管理团组", Role::User),
        UserAccount::new("guest", "guest", "访客", "访客", Role::Guest),
    ]
}

/// Who is acting. Built once at the request boundary and passed down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub username: String,
    pub display_name: String,
    pub department: String,
    pub role: Role,
}

impl Session {
    /// Unauthenticated, read-only context.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            username: "guest".to_string(),
            display_name: "访客".to_string(),
            department: "访客".to_string(),
            role: Role::Guest,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self, action: &'static str) -> Result<(), SessionError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(SessionError::PermissionDenied {
                action,
                username: self.username.clone(),
            })
        }
    }
}

impl From<&UserAccount> for Session {
    fn from(account: &UserAccount) -> Self {
        Self {
            username: account.username.clone(),
            display_name: account.display_name.clone(),
            department: account.department.clone(),
            role: account.role,
        }
    }
}

pub fn authenticate(
    accounts: &[UserAccount],
    username: &str,
    password: &str,
) -> Result<Session, SessionError> {
    accounts
        .iter()
        .find(|a| a.username == username && a.password == password)
        .map(Session::from)
        .ok_or(SessionError::InvalidCredentials)
}
