//! User repository
//!
//! Database operations for platform accounts.

use crate::db::entity::{self, BindValue, Table};
use crate::models::{CreateUserInput, UpdateUserInput, User, UserRole, UserStatus};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

impl Table for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "username",
        "email",
        "full_name",
        "role",
        "status",
        "created_at",
        "updated_at",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "username",
        "email",
        "full_name",
        "role",
        "status",
        "created_at",
        "updated_at",
    ];

    fn bind_values(&self) -> Vec<BindValue> {
        let mut values = vec![BindValue::from(self.id)];
        values.extend(self.insert_values());
        values
    }

    fn insert_values(&self) -> Vec<BindValue> {
        vec![
            self.username.clone().into(),
            self.email.clone().into(),
            self.full_name.clone().into(),
            self.role.as_str().into(),
            self.status.as_str().into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let role_str: String = row.get("role");
        let role = UserRole::from_str(&role_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid user role: {}", role_str))?;
        let status_str: String = row.get("status");
        let status = UserStatus::from_str(&status_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid user status: {}", status_str))?;

        Ok(Self {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            full_name: row.get("full_name"),
            role,
            status,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Columns refreshed when an upsert hits an existing email
const UPSERT_UPDATE: &[&str] = &["username", "full_name", "role", "status", "updated_at"];

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, input: &CreateUserInput) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// List users with pagination, newest first
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>>;

    /// Count total users
    async fn count(&self) -> Result<i64>;

    /// Update a user; errors unless exactly one row is affected
    async fn update(&self, id: i64, input: &UpdateUserInput) -> Result<User>;

    /// Insert or, when the email already exists, refresh the profile subset
    async fn upsert(&self, user: &User) -> Result<()>;

    /// Delete a user; errors unless exactly one row is affected
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, input: &CreateUserInput) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: 0,
            username: input.username.clone(),
            email: input.email.clone(),
            full_name: input.full_name.clone(),
            role: input.role.unwrap_or_default(),
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let id = entity::insert(&self.pool, &user)
            .await
            .context("Failed to create user")?;

        Ok(User { id, ..user })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            entity::column_list::<User>(),
            User::TABLE
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by ID")?;

        match row {
            Some(row) => Ok(Some(User::from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE email = ?",
            entity::column_list::<User>(),
            User::TABLE
        );
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get user by email")?;

        match row {
            Some(row) => Ok(Some(User::from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            entity::column_list::<User>(),
            User::TABLE
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        let mut users = Vec::new();
        for row in rows {
            users.push(User::from_row(&row)?);
        }

        Ok(users)
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;

        Ok(row.get("count"))
    }

    async fn update(&self, id: i64, input: &UpdateUserInput) -> Result<User> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found"))?;

        // Nothing set, nothing to write
        if !input.has_changes() {
            return Ok(existing);
        }

        let now = Utc::now();
        let new_username = input.username.as_ref().unwrap_or(&existing.username);
        let new_full_name = input.full_name.clone().or(existing.full_name.clone());
        let new_role = input.role.unwrap_or(existing.role);
        let new_status = input.status.unwrap_or(existing.status);

        let result = sqlx::query(
            "UPDATE users SET username = ?, full_name = ?, role = ?, status = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(new_username)
        .bind(&new_full_name)
        .bind(new_role.as_str())
        .bind(new_status.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update user")?;

        if result.rows_affected() != 1 {
            bail!(
                "User update affected {} rows, expected 1",
                result.rows_affected()
            );
        }

        Ok(User {
            username: new_username.clone(),
            full_name: new_full_name,
            role: new_role,
            status: new_status,
            updated_at: now,
            ..existing
        })
    }

    async fn upsert(&self, user: &User) -> Result<()> {
        entity::upsert(&self.pool, user, &["email"], UPSERT_UPDATE)
            .await
            .context("Failed to upsert user")?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        if result.rows_affected() != 1 {
            bail!(
                "User delete affected {} rows, expected 1",
                result.rows_affected()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (SqlitePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_input(username: &str, email: &str) -> CreateUserInput {
        CreateUserInput::new(username.to_string(), email.to_string())
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;

        let input = create_test_input("alice", "alice@example.com").with_role(UserRole::Teacher);
        let created = repo.create(&input).await.expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.username, "alice");
        assert_eq!(created.role, UserRole::Teacher);
        assert_eq!(created.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn test_create_defaults_to_student_role() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&create_test_input("bob", "bob@example.com"))
            .await
            .expect("Failed to create user");

        assert_eq!(created.role, UserRole::Student);
    }

    #[tokio::test]
    async fn test_get_user_by_id_round_trips_all_fields() {
        let (_pool, repo) = setup_test_repo().await;

        let input = create_test_input("carol", "carol@example.com")
            .with_full_name("Carol Mills".to_string())
            .with_role(UserRole::Admin);
        let created = repo.create(&input).await.expect("Failed to create user");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.id, created.id);
        assert_eq!(found.username, "carol");
        assert_eq!(found.email, "carol@example.com");
        assert_eq!(found.full_name.as_deref(), Some("Carol Mills"));
        assert_eq!(found.role, UserRole::Admin);
        assert_eq!(found.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_id(99999).await.expect("Failed to get user");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_email() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&create_test_input("dave", "dave@example.com"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_email("dave@example.com")
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(found.username, "dave");

        let missing = repo
            .get_by_email("nobody@example.com")
            .await
            .expect("Failed to get user");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_and_count_users() {
        let (_pool, repo) = setup_test_repo().await;

        for i in 1..=5 {
            repo.create(&create_test_input(
                &format!("user-{}", i),
                &format!("user-{}@example.com", i),
            ))
            .await
            .expect("Failed to create user");
        }

        let page1 = repo.list(0, 3).await.expect("Failed to list users");
        assert_eq!(page1.len(), 3);

        let page2 = repo.list(3, 3).await.expect("Failed to list users");
        assert_eq!(page2.len(), 2);

        let count = repo.count().await.expect("Failed to count users");
        assert_eq!(count, 5);
    }

    #[tokio::test]
    async fn test_update_user() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&create_test_input("erin", "erin@example.com"))
            .await
            .expect("Failed to create user");

        let updated = repo
            .update(
                created.id,
                &UpdateUserInput::new()
                    .with_full_name("Erin Li".to_string())
                    .with_status(UserStatus::Suspended),
            )
            .await
            .expect("Failed to update user");

        assert_eq!(updated.full_name.as_deref(), Some("Erin Li"));
        assert_eq!(updated.status, UserStatus::Suspended);
        assert_eq!(updated.username, "erin"); // Unchanged
    }

    #[tokio::test]
    async fn test_update_with_no_changes_skips_the_write() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&create_test_input("iris", "iris@example.com"))
            .await
            .expect("Failed to create user");

        let untouched = repo
            .update(created.id, &UpdateUserInput::new())
            .await
            .expect("Empty update should succeed");
        assert_eq!(untouched.username, "iris");
        assert_eq!(
            untouched.updated_at.timestamp(),
            created.updated_at.timestamp()
        );

        // The stored row was not rewritten either
        let stored = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(
            stored.updated_at.timestamp(),
            created.updated_at.timestamp()
        );
    }

    #[tokio::test]
    async fn test_update_missing_user_fails() {
        let (_pool, repo) = setup_test_repo().await;

        let result = repo
            .update(99999, &UpdateUserInput::new().with_username("x".to_string()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_upsert_refreshes_profile_subset_on_conflict() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&create_test_input("fred", "fred@example.com"))
            .await
            .expect("Failed to create user");

        let mut replacement = created.clone();
        replacement.username = "fred2".to_string();
        replacement.full_name = Some("Fred Ngo".to_string());
        replacement.role = UserRole::Teacher;
        replacement.updated_at = Utc::now();

        repo.upsert(&replacement).await.expect("Failed to upsert");

        let found = repo
            .get_by_email("fred@example.com")
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(found.id, created.id); // Same row, not a new insert
        assert_eq!(found.username, "fred2");
        assert_eq!(found.full_name.as_deref(), Some("Fred Ngo"));
        assert_eq!(found.role, UserRole::Teacher);

        let count = repo.count().await.expect("Failed to count users");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_upsert_inserts_new_email() {
        let (_pool, repo) = setup_test_repo().await;

        let now = Utc::now();
        let user = User {
            id: 0,
            username: "gina".to_string(),
            email: "gina@example.com".to_string(),
            full_name: None,
            role: UserRole::Student,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        repo.upsert(&user).await.expect("Failed to upsert");

        let found = repo
            .get_by_email("gina@example.com")
            .await
            .expect("Failed to get user");
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&create_test_input("hank", "hank@example.com"))
            .await
            .expect("Failed to create user");

        repo.delete(created.id).await.expect("Failed to delete");

        let found = repo.get_by_id(created.id).await.expect("Failed to get");
        assert!(found.is_none());

        // Deleting again affects zero rows and must error
        assert!(repo.delete(created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_role_and_status_conversion() {
        assert_eq!(UserRole::from_str("TEACHER"), Some(UserRole::Teacher));
        assert_eq!(UserRole::from_str("invalid"), None);
        assert_eq!(UserStatus::from_str("suspended"), Some(UserStatus::Suspended));
        assert_eq!(UserStatus::from_str("invalid"), None);
    }
}
