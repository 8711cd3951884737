use sqlx::{sqlite::SqliteRow, Row};

use crate::db::DbConnection;
use crate::error::AppResult;

/// An authenticated account. Stays internal to the backend; clients only
/// ever see the member profile derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn store(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| row_to_user(&r)))
    }
}

fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_find() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let repo = UserRepository::new(db);

        let user = User {
            id: "user-1".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            created_at: "2025-08-01T10:00:00Z".to_string(),
        };
        repo.store(&user).await.unwrap();

        assert_eq!(repo.find_by_id("user-1").await.unwrap(), Some(user.clone()));
        assert_eq!(
            repo.find_by_email("alice@example.com").await.unwrap(),
            Some(user)
        );
        assert!(repo.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let repo = UserRepository::new(db);

        let user = User {
            id: "user-1".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            created_at: "2025-08-01T10:00:00Z".to_string(),
        };
        repo.store(&user).await.unwrap();

        let duplicate = User {
            id: "user-2".to_string(),
            ..user
        };
        assert!(repo.store(&duplicate).await.is_err());
    }
}
