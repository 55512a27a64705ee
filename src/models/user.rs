//! User model
//!
//! This module provides:
//! - `User` entity representing a platform account
//! - `UserRole` and `UserStatus` enums
//! - Input types for creating and updating users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Login name
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Display name shown to other users
    #[serde(default)]
    pub full_name: Option<String>,
    /// Account role
    pub role: UserRole,
    /// Account status
    pub status: UserStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// User account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Platform administrator
    Admin,
    /// Teaching staff
    Teacher,
    /// Enrolled learner (default)
    #[default]
    Student,
}

impl UserRole {
    /// Convert role to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
        }
    }

    /// Parse role from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "teacher" => Some(UserRole::Teacher),
            "student" => Some(UserRole::Student),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Account is usable (default)
    #[default]
    Active,
    /// Account is locked out
    Suspended,
}

impl UserStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(UserStatus::Active),
            "suspended" => Some(UserStatus::Suspended),
            _ => None,
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    /// Login name
    pub username: String,
    /// Email address
    pub email: String,
    /// Display name (optional)
    pub full_name: Option<String>,
    /// Account role (defaults to Student)
    pub role: Option<UserRole>,
}

impl CreateUserInput {
    /// Create a new CreateUserInput
    pub fn new(username: String, email: String) -> Self {
        Self {
            username,
            email,
            full_name: None,
            role: None,
        }
    }

    /// Set the display name
    pub fn with_full_name(mut self, full_name: String) -> Self {
        self.full_name = Some(full_name);
        self
    }

    /// Set the role
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Input for updating an existing user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserInput {
    /// New login name (optional)
    pub username: Option<String>,
    /// New display name (optional)
    pub full_name: Option<String>,
    /// New role (optional)
    pub role: Option<UserRole>,
    /// New status (optional)
    pub status: Option<UserStatus>,
}

impl UpdateUserInput {
    /// Create a new empty UpdateUserInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the login name
    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Set the display name
    pub fn with_full_name(mut self, full_name: String) -> Self {
        self.full_name = Some(full_name);
        self
    }

    /// Set the role
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.username.is_some()
            || self.full_name.is_some()
            || self.role.is_some()
            || self.status.is_some()
    }
}
