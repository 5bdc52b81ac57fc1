use anyhow::Error;
use once_cell::sync::Lazy;
use rocket::serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewOwnGrades,

    ViewRoster,
    ViewAssignedSubjects,
    EnrollStudents,
    RecordGrades,
    DropEnrollments,

    ManageAccounts,
    ManageSubjects,
    ManageAssignments,
    ViewAllRosters,
    ViewAllGrades,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Student,
    Professor,
    Admin,
}

static STUDENT_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewOwnGrades);

    permissions
});

static PROFESSOR_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewRoster);
    permissions.insert(Permission::ViewAssignedSubjects);
    permissions.insert(Permission::EnrollStudents);
    permissions.insert(Permission::RecordGrades);
    permissions.insert(Permission::DropEnrollments);

    permissions
});

static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ManageAccounts);
    permissions.insert(Permission::ManageSubjects);
    permissions.insert(Permission::ManageAssignments);
    permissions.insert(Permission::ViewAllRosters);
    permissions.insert(Permission::ViewAllGrades);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Student => &STUDENT_PERMISSIONS,
            Role::Professor => &PROFESSOR_PERMISSIONS,
            Role::Admin => &ADMIN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Student => "student",
            Role::Professor => "professor",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "student" => Ok(Role::Student),
            "professor" => Ok(Role::Professor),
            "admin" => Ok(Role::Admin),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Professor => write!(f, "professor"),
            Role::Admin => write!(f, "admin"),
        }
    }
}
