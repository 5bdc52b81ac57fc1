use rocket::http::Status;
use serde::Serialize;

use super::{Permission, Role};

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub username: String,
    pub role: Role,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub username: Option<String>,
    pub role: Option<String>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            username: user.username.unwrap_or_default(),
            role: Role::from_str(&user.role.unwrap_or_default()).unwrap_or(Role::Student),
        }
    }
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), Status> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.username,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(Status::Forbidden)
        }
    }

    pub fn require_any_permission(&self, permissions: &[Permission]) -> Result<(), Status> {
        if permissions.iter().any(|p| self.role.has_permission(*p)) {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.username,
                role = %self.role.as_str(),
                permissions = ?permissions,
                "Permission denied (require any)"
            );
            Err(Status::Forbidden)
        }
    }
}
